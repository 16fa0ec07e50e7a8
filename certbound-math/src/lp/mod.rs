//! Exact Linear Programming.
//!
//! Rational LP model, the reference two-phase simplex, and the rectangular
//! LU factorization used to solve projection systems.

pub mod model;
pub mod rect_lu;
pub mod simplex;

pub use model::{ExactLpSolver, LpColumn, LpModel, LpRow, LpSolution, LpStatus, ObjectiveSense};
pub use rect_lu::{Factorization, Factorizer, LuConfig, LuFactors, RectangularLu, SparseColumn};
pub use simplex::{RationalSimplex, SimplexConfig, SimplexStats};

/// Variable identifier (shared across LP modules)
pub type VarId = usize;
/// Constraint identifier
pub type ConstraintId = usize;
