//! CertBound - Certified dual bounds from approximate LP solutions
//!
//! A floating-point LP solve at a search node yields an approximate dual
//! solution that cannot be trusted for pruning. This crate turns it into
//! either an exact rational lower bound on the relaxation optimum or an exact
//! proof of infeasibility:
//! - **Interval shift**: outward-rounded interval evaluation of the Lagrangian
//!   bound; no factorization, no exact solve
//! - **Project-and-shift**: exact projection onto the dual equality through a
//!   factorized basis, then a shift toward an interior certificate
//! - **Exact LP**: rational simplex on the relaxation, always last
//!
//! [`BoundingEngine`] runs these in order and reports the first success.
//!
//! # Examples
//!
//! ```
//! use certbound::{
//!     ApproximateDualSolution, BoundRequest, BoundingConfig, BoundingEngine, CertifiedBound,
//!     ExactRelaxation,
//! };
//! use certbound_math::rational::rat;
//!
//! // minimize -x - y  s.t.  x + y <= 10,  0 <= x, y <= 10
//! let mut relax = ExactRelaxation::new();
//! relax.add_column(rat(-1), Some(rat(0)), Some(rat(10)));
//! relax.add_column(rat(-1), Some(rat(0)), Some(rat(10)));
//! relax.add_row(vec![(0, rat(1)), (1, rat(1))], None, Some(rat(10))).unwrap();
//!
//! // dual of the row from a floating LP solver
//! let approx = ApproximateDualSolution::new(vec![-1.0], vec![0.0, 0.0]);
//!
//! let mut engine = BoundingEngine::new(BoundingConfig::default()).unwrap();
//! let safe = engine
//!     .compute_safe_bound(&relax, Some(&approx), BoundRequest::lower_bound())
//!     .unwrap();
//! assert_eq!(safe.bound, CertifiedBound::Finite(rat(-10)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod approx;
pub mod bound;
pub mod certificate;
pub mod column_select;
pub mod config;
pub mod dual_space;
pub mod engine;
pub mod error;
pub mod interval_shift;
pub mod project_shift;
pub mod relaxation;
pub mod verify;

pub use approx::{ApproximateDualSolution, ApproximatePrimal, BasisStatus};
pub use bound::{BoundPurpose, BoundRequest, CertifiedBound};
pub use certificate::{CertificateData, InteriorVector, build_certificate};
pub use column_select::{DualColumnSet, select_dual_columns};
pub use config::{
    BoundingConfig, BoundingMethod, CertificateFormulation, CertificatePreference,
    DualColumnSelection, InterleavePolicy, StrategyMode,
};
pub use dual_space::{DualCoord, DualSpace, ExtendedDual};
pub use engine::{BoundingEngine, BoundingStats, CertificateState, SafeBound};
pub use error::{BoundError, BoundResult};
pub use interval_shift::IntervalBoundShifter;
pub use project_shift::{CorrectedDual, project_and_shift};
pub use relaxation::ExactRelaxation;
