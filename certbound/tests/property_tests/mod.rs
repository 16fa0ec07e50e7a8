//! Property-based tests for certbound
//!
//! This module contains property tests for:
//! - Dual column selection and interior certificates
//! - Soundness of project-and-shift and interval-shift bounds

mod certificate_properties;
mod soundness_properties;

use certbound::ExactRelaxation;
use certbound_math::lp::{ExactLpSolver, LpStatus, RationalSimplex};
use certbound_math::rational::rat;
use num_rational::BigRational;
use proptest::prelude::*;

/// Strategy for generating small LP coefficients
pub fn lp_coeff_strategy() -> impl Strategy<Value = i64> {
    -10i64..10i64
}

/// Strategy for generating positive coefficients
pub fn positive_coeff_strategy() -> impl Strategy<Value = i64> {
    1i64..10i64
}

/// Boxed two-column relaxation with two `<=` rows; feasible at the origin
/// and bounded by the box.
pub fn boxed_relaxation(
    objective: (i64, i64),
    rows: [(i64, i64, i64); 2],
    upper: (i64, i64),
) -> ExactRelaxation {
    let mut relax = ExactRelaxation::new();
    relax.add_column(rat(objective.0), Some(rat(0)), Some(rat(upper.0)));
    relax.add_column(rat(objective.1), Some(rat(0)), Some(rat(upper.1)));
    for (a, b, rhs) in rows {
        relax
            .add_row(vec![(0, rat(a)), (1, rat(b))], None, Some(rat(rhs)))
            .unwrap();
    }
    relax
}

/// Exact optimum of a relaxation known to be feasible and bounded.
pub fn exact_optimum(relax: &ExactRelaxation) -> BigRational {
    let solution = RationalSimplex::default().solve(relax.as_model()).unwrap();
    assert_eq!(solution.status, LpStatus::Optimal);
    solution.objective.unwrap()
}
