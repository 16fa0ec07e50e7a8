//! Error types for the exact arithmetic kernels.

use thiserror::Error;

/// Error type for exact arithmetic and factorization operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// Vector or matrix dimensions do not agree
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        got: usize,
    },
    /// The factorized system has no usable pivot structure
    #[error("Singular system: {0}")]
    SingularSystem(String),
    /// The right-hand side is not in the column space of the factorized matrix
    #[error("Inconsistent system: residual left in row {row}")]
    InconsistentSystem {
        /// First non-pivot row with a nonzero residual
        row: usize,
    },
    /// A floating-point input was NaN or infinite where a finite value is required
    #[error("Non-finite floating-point value: {0}")]
    NonFinite(f64),
    /// The LP model is malformed (bad index, crossed bounds that cannot be handled)
    #[error("Invalid LP model: {0}")]
    InvalidModel(String),
}

/// Result type for exact arithmetic operations
pub type MathResult<T> = Result<T, MathError>;
