//! Selection of the dual column set `S`.
//!
//! `S` is the set of extended-dual coordinates on which the interior
//! certificate must be strictly positive and on which projections are
//! corrected. It is chosen once per relaxation.

use certbound_math::lp::{ExactLpSolver, LpStatus};
use certbound_math::rational::to_f64_down;
use num_rational::BigRational;
use tracing::{debug, warn};

use crate::approx::ApproximateDualSolution;
use crate::config::{BoundingConfig, DualColumnSelection};
use crate::dual_space::{DualCoord, DualSpace};
use crate::error::{BoundError, BoundResult};
use crate::relaxation::ExactRelaxation;

/// The chosen coordinate subset `S`, in storage order.
#[derive(Debug, Clone, PartialEq)]
pub struct DualColumnSet {
    space: DualSpace,
    included: Vec<bool>,
    members: Vec<DualCoord>,
}

impl DualColumnSet {
    fn from_predicate(space: DualSpace, mut keep: impl FnMut(DualCoord) -> bool) -> Self {
        let included: Vec<bool> = space.coords().map(&mut keep).collect();
        let members = space
            .coords()
            .zip(&included)
            .filter(|(_, inc)| **inc)
            .map(|(c, _)| c)
            .collect();
        Self {
            space,
            included,
            members,
        }
    }

    /// Every coordinate with a finite bound.
    pub fn all_finite(relax: &ExactRelaxation) -> Self {
        Self::from_predicate(DualSpace::of(relax), |c| c.has_finite_bound(relax))
    }

    /// Whether a coordinate is included; coordinates outside the space are not.
    pub fn contains(&self, coord: DualCoord) -> bool {
        self.space.contains(coord) && self.included[self.space.index(coord)]
    }

    /// Included coordinates in storage order.
    pub fn iter(&self) -> impl Iterator<Item = DualCoord> + '_ {
        self.members.iter().copied()
    }

    /// Included coordinates as a slice.
    pub fn members(&self) -> &[DualCoord] {
        &self.members
    }

    /// Number of included coordinates.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether nothing is included.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Shape of the space the set was chosen in.
    pub fn space(&self) -> DualSpace {
        self.space
    }
}

/// Relative float equality `|a - b| <= tol * max(1, |a|, |b|)`.
fn feas_eq(a: f64, b: &BigRational, tol: f64) -> bool {
    let b = to_f64_down(b);
    (a - b).abs() <= tol * 1f64.max(a.abs()).max(b.abs())
}

/// Choose `S` for a relaxation under the configured policy.
///
/// The exact-root policy solves the relaxation once with `solver`. When the
/// root LP is infeasible, or the active set would be empty, every finite
/// coordinate is used instead.
pub fn select_dual_columns<S: ExactLpSolver + ?Sized>(
    relax: &ExactRelaxation,
    config: &BoundingConfig,
    approx: Option<&ApproximateDualSolution>,
    solver: &mut S,
) -> BoundResult<DualColumnSet> {
    let space = DualSpace::of(relax);
    let selected = match config.selection {
        DualColumnSelection::AllFinite => DualColumnSet::all_finite(relax),
        DualColumnSelection::ActiveExactRoot => {
            solver.set_iteration_limit(config.root_iteration_limit);
            let solution = solver.solve(relax.as_model());
            solver.set_iteration_limit(config.exact_iteration_limit);
            let solution = solution?;
            solution.check_shape(relax.as_model()).map_err(|e| {
                BoundError::ExactSolve(format!("root LP returned a malformed solution: {e}"))
            })?;
            match solution.status {
                LpStatus::Optimal => DualColumnSet::from_predicate(space, |c| {
                    let Some(bound) = c.bound(relax) else {
                        return false;
                    };
                    match c {
                        DualCoord::RowLhs(i) | DualCoord::RowRhs(i) => {
                            &solution.row_activities[i] == bound
                        }
                        DualCoord::ColLb(j) | DualCoord::ColUb(j) => &solution.primal[j] == bound,
                    }
                }),
                LpStatus::Infeasible => {
                    debug!("exact root LP infeasible, selecting all finite bounds");
                    DualColumnSet::all_finite(relax)
                }
                status => {
                    return Err(BoundError::ExactSolve(format!(
                        "root LP for column selection ended {status:?}"
                    )));
                }
            }
        }
        DualColumnSelection::ActiveApproxRoot => {
            match approx.and_then(|a| a.primal.as_ref()) {
                Some(primal) => {
                    if primal.row_activities.len() != relax.num_rows()
                        || primal.col_values.len() != relax.num_cols()
                    {
                        return Err(BoundError::Precondition(
                            "approximate primal does not match the relaxation".into(),
                        ));
                    }
                    let tol = config.feasibility_tolerance;
                    DualColumnSet::from_predicate(space, |c| {
                        let Some(bound) = c.bound(relax) else {
                            return false;
                        };
                        match c {
                            DualCoord::RowLhs(i) | DualCoord::RowRhs(i) => {
                                feas_eq(primal.row_activities[i], bound, tol)
                            }
                            DualCoord::ColLb(j) | DualCoord::ColUb(j) => {
                                feas_eq(primal.col_values[j], bound, tol)
                            }
                        }
                    })
                }
                None => {
                    debug!("no approximate root primal, selecting all finite bounds");
                    DualColumnSet::all_finite(relax)
                }
            }
        }
    };

    if selected.is_empty() && relax.has_finite_bound() {
        warn!("no active bound at the root solution, selecting all finite bounds");
        return Ok(DualColumnSet::all_finite(relax));
    }
    debug!(
        policy = ?config.selection,
        included = selected.len(),
        dim = space.dim(),
        "dual column set chosen"
    );
    Ok(selected)
}
