//! Approximate (floating-point) LP solutions handed over by the floating LP layer.
//!
//! The values are untrusted. Row values are duals `y` with the convention
//! `c - A^T y = d` (positive values bind at the left-hand side, negative at
//! the right-hand side) and column values are the reduced costs `d`. For an
//! infeasibility proof the row values are Farkas multipliers and the column
//! values are the negated Farkas coefficients `-(A^T y)`.

use serde::{Deserialize, Serialize};

use crate::error::{BoundError, BoundResult};
use crate::relaxation::ExactRelaxation;

/// Basis status reported by the floating solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BasisStatus {
    /// Basic
    Basic,
    /// Nonbasic at the lower side (lhs or lb)
    AtLower,
    /// Nonbasic at the upper side (rhs or ub)
    AtUpper,
    /// Nonbasic free variable at zero, or status unknown
    #[default]
    Zero,
}

/// Floating primal values of the reference (root) solve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApproximatePrimal {
    /// Column values
    pub col_values: Vec<f64>,
    /// Row activities
    pub row_activities: Vec<f64>,
}

/// An approximate dual solution (or Farkas ray) of one node LP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApproximateDualSolution {
    /// Row duals, or Farkas multipliers
    pub row_values: Vec<f64>,
    /// Reduced costs, or negated Farkas coefficients
    pub col_values: Vec<f64>,
    /// Row basis status
    pub row_status: Vec<BasisStatus>,
    /// Column basis status
    pub col_status: Vec<BasisStatus>,
    /// Whether the floating solver produced the values successfully
    pub valid: bool,
    /// Floating objective value of the LP
    pub objective: Option<f64>,
    /// Floating primal solution, when available
    pub primal: Option<ApproximatePrimal>,
}

impl ApproximateDualSolution {
    /// A valid solution with unknown basis status.
    pub fn new(row_values: Vec<f64>, col_values: Vec<f64>) -> Self {
        let row_status = vec![BasisStatus::Zero; row_values.len()];
        let col_status = vec![BasisStatus::Zero; col_values.len()];
        Self {
            row_values,
            col_values,
            row_status,
            col_status,
            valid: true,
            objective: None,
            primal: None,
        }
    }

    /// A solution flagged invalid by the floating solver.
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Attach basis status tags.
    #[must_use]
    pub fn with_status(mut self, rows: Vec<BasisStatus>, cols: Vec<BasisStatus>) -> Self {
        self.row_status = rows;
        self.col_status = cols;
        self
    }

    /// Attach the floating objective value.
    #[must_use]
    pub fn with_objective(mut self, objective: f64) -> Self {
        self.objective = Some(objective);
        self
    }

    /// Attach the floating primal solution.
    #[must_use]
    pub fn with_primal(mut self, primal: ApproximatePrimal) -> Self {
        self.primal = Some(primal);
        self
    }

    /// Row basis status, `Zero` when not reported.
    pub fn row_status(&self, i: usize) -> BasisStatus {
        self.row_status.get(i).copied().unwrap_or_default()
    }

    /// Validate against the relaxation's current shape.
    ///
    /// A missing, invalid or non-finite value is a precondition failure for
    /// both certifying methods.
    pub fn check(&self, relax: &ExactRelaxation) -> BoundResult<()> {
        if !self.valid {
            return Err(BoundError::Precondition(
                "approximate solution flagged invalid".into(),
            ));
        }
        if self.row_values.len() != relax.num_rows() {
            return Err(BoundError::Precondition(format!(
                "expected {} row values, got {}",
                relax.num_rows(),
                self.row_values.len()
            )));
        }
        if self.col_values.len() != relax.num_cols() {
            return Err(BoundError::Precondition(format!(
                "expected {} column values, got {}",
                relax.num_cols(),
                self.col_values.len()
            )));
        }
        if let Some(bad) = self
            .row_values
            .iter()
            .chain(&self.col_values)
            .find(|v| !v.is_finite())
        {
            return Err(BoundError::Precondition(format!(
                "non-finite approximate value {bad}"
            )));
        }
        Ok(())
    }
}
