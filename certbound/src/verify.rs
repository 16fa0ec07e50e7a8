//! Exact verification of extended dual vectors.
//!
//! A vector `y` over the extended dual space proves
//!
//! - a lower bound `b^T y` on the relaxation optimum when
//!   `A^T (y_lhs - y_rhs) + (y_lb - y_ub) = c` and `y >= 0`
//! - infeasibility (Farkas) when the same holds with `0` in place of `c` and
//!   `b^T y > 0`
//!
//! where `b^T y` only runs over finite bounds and every coordinate paired with
//! an infinite bound carries zero weight.

use num_rational::BigRational;
use num_traits::{Signed, Zero};

use crate::bound::BoundPurpose;
use crate::dual_space::{DualCoord, ExtendedDual};
use crate::error::{BoundError, BoundResult};
use crate::relaxation::ExactRelaxation;

/// Right-hand side minus left-hand side of the dual equality.
///
/// Returns `target - (A^T (y_lhs - y_rhs) + (y_lb - y_ub))` per column, where
/// `target` is `c` for a lower bound and `0` for a Farkas proof. Rows beyond
/// the vector's space contribute nothing.
pub fn dual_residual(
    relax: &ExactRelaxation,
    values: &ExtendedDual,
    purpose: BoundPurpose,
) -> Vec<BigRational> {
    let space = values.space();
    debug_assert_eq!(space.num_cols, relax.num_cols());

    let mut residual: Vec<BigRational> = match purpose {
        BoundPurpose::LowerBound => relax.columns().iter().map(|c| c.objective.clone()).collect(),
        BoundPurpose::Infeasibility => vec![BigRational::zero(); relax.num_cols()],
    };

    for i in 0..space.num_rows.min(relax.num_rows()) {
        let net = values.row_net(i);
        if net.is_zero() {
            continue;
        }
        for (j, a) in &relax.row(i).coeffs {
            residual[*j] -= a * &net;
        }
    }
    for (j, r) in residual.iter_mut().enumerate() {
        let net = values.col_net(j);
        if !net.is_zero() {
            *r -= net;
        }
    }
    residual
}

/// Dual objective `b^T y` over finite bounds.
///
/// A nonzero weight on an infinite bound is an invariant violation: no
/// finite value can be claimed for it.
pub fn dual_objective(relax: &ExactRelaxation, values: &ExtendedDual) -> BoundResult<BigRational> {
    let mut objective = BigRational::zero();
    for (coord, v) in values.nonzeros() {
        match coord.cost(relax) {
            Some(cost) => objective += cost * v,
            None => {
                return Err(BoundError::Invariant(format!(
                    "{coord:?} carries {v} on an infinite bound"
                )));
            }
        }
    }
    Ok(objective)
}

/// Outcome of a direct re-substitution check.
#[derive(Debug, Clone, Default)]
pub struct DualCheck {
    /// Columns whose dual equality is violated
    pub violated_columns: Vec<usize>,
    /// Coordinates with negative value
    pub negative: Vec<DualCoord>,
    /// Coordinates with nonzero value on an infinite bound
    pub infinite_weighted: Vec<DualCoord>,
    /// Dual objective, when defined
    pub objective: Option<BigRational>,
}

impl DualCheck {
    /// Whether the vector is dual feasible.
    pub fn is_feasible(&self) -> bool {
        self.violated_columns.is_empty()
            && self.negative.is_empty()
            && self.infinite_weighted.is_empty()
    }

    /// Whether the vector is a valid proof for `purpose`.
    pub fn proves(&self, purpose: BoundPurpose) -> bool {
        self.is_feasible()
            && match purpose {
                BoundPurpose::LowerBound => true,
                BoundPurpose::Infeasibility => {
                    self.objective.as_ref().is_some_and(Signed::is_positive)
                }
            }
    }
}

/// Check an extended dual vector by direct re-substitution.
pub fn check_dual(
    relax: &ExactRelaxation,
    values: &ExtendedDual,
    purpose: BoundPurpose,
) -> DualCheck {
    let violated_columns = dual_residual(relax, values, purpose)
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.is_zero())
        .map(|(j, _)| j)
        .collect();
    let negative = values
        .iter()
        .filter(|(_, v)| v.is_negative())
        .map(|(c, _)| c)
        .collect();
    let infinite_weighted = values
        .nonzeros()
        .filter(|(c, _)| !c.has_finite_bound(relax))
        .map(|(c, _)| c)
        .collect();
    DualCheck {
        violated_columns,
        negative,
        infinite_weighted,
        objective: dual_objective(relax, values).ok(),
    }
}
