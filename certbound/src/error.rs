//! Error taxonomy of the certified bounding subsystem.
//!
//! Every failure below is recovered locally by falling through to the next
//! bounding method. Only [`BoundError::NoMethodSucceeded`] reaches the caller
//! of [`crate::engine::BoundingEngine::compute_safe_bound`].

use certbound_math::MathError;
use thiserror::Error;

/// Error type for bound certification
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundError {
    /// Missing or invalid approximate solution, or mismatched dimensions
    #[error("Precondition failure: {0}")]
    Precondition(String),
    /// Singular or inconsistent solve with the certificate basis
    #[error("Factorization failure: {0}")]
    Factorization(MathError),
    /// An auxiliary certificate LP did not terminate optimal
    #[error("Auxiliary LP failure: {0}")]
    AuxiliaryLp(String),
    /// The method ran to completion without a usable bound
    #[error("Bound not certified: {0}")]
    NotCertified(String),
    /// The interior certificate could not be built for this relaxation
    #[error("Interior certificate unavailable: {0}")]
    CertificateUnavailable(String),
    /// The exact LP solver failed or stopped without a usable status
    #[error("Exact LP solve failed: {0}")]
    ExactSolve(String),
    /// Configuration values out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// An internal soundness check failed; the result is discarded
    #[error("Invariant violated: {0}")]
    Invariant(String),
    /// No method, the exact solver included, produced a result
    #[error("No bounding method succeeded")]
    NoMethodSucceeded,
}

impl BoundError {
    /// Whether the failure disables the method for the rest of the relaxation's lifetime.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            BoundError::AuxiliaryLp(_)
                | BoundError::CertificateUnavailable(_)
                | BoundError::InvalidConfig(_)
        )
    }
}

impl From<MathError> for BoundError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::NonFinite(value) => {
                BoundError::Precondition(format!("non-finite approximate value {value}"))
            }
            MathError::InvalidModel(msg) => BoundError::ExactSolve(msg),
            other => BoundError::Factorization(other),
        }
    }
}

/// Result type for bound certification
pub type BoundResult<T> = Result<T, BoundError>;
