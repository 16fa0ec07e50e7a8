//! Property-based tests for the rational simplex
//!
//! This module tests:
//! - Feasibility of optimal solutions
//! - Strong duality through the reported row duals
//! - Agreement between minimization and maximization

use certbound_math::lp::{ExactLpSolver, LpModel, LpStatus, ObjectiveSense, RationalSimplex};
use certbound_math::rational::rat;
use num_rational::BigRational;
use num_traits::Zero;
use proptest::prelude::*;

/// Strategy for generating small LP coefficients
fn lp_coeff_strategy() -> impl Strategy<Value = i64> {
    -10i64..10i64
}

/// Strategy for generating positive coefficients
fn positive_coeff_strategy() -> impl Strategy<Value = i64> {
    1i64..10i64
}

/// maximize c1 x + c2 y  s.t.  a1 x + a2 y <= b, x + y <= cap, x, y >= 0
fn two_var_model(sense: ObjectiveSense, c: (i64, i64), a: (i64, i64), b: i64, cap: i64) -> LpModel {
    let mut model = LpModel::new(sense);
    let x = model.add_column(rat(c.0), Some(rat(0)), None);
    let y = model.add_column(rat(c.1), Some(rat(0)), None);
    model.add_row(vec![(x, rat(a.0)), (y, rat(a.1))], None, Some(rat(b)));
    model.add_row(vec![(x, rat(1)), (y, rat(1))], None, Some(rat(cap)));
    model
}

#[cfg(test)]
mod simplex_optimality_properties {
    use super::*;

    proptest! {
        /// Optimal solutions satisfy every row and bound
        #[test]
        fn optimal_solution_is_feasible(
            c1 in lp_coeff_strategy(),
            c2 in lp_coeff_strategy(),
            a1 in positive_coeff_strategy(),
            a2 in positive_coeff_strategy(),
            b in positive_coeff_strategy(),
            cap in positive_coeff_strategy()
        ) {
            let model = two_var_model(ObjectiveSense::Maximize, (c1, c2), (a1, a2), b, cap);
            let solution = RationalSimplex::default().solve(&model).unwrap();
            // bounded: x, y >= 0 and x + y <= cap
            prop_assert_eq!(solution.status, LpStatus::Optimal);
            for v in &solution.primal {
                prop_assert!(*v >= BigRational::zero());
            }
            let activities = model.row_activities(&solution.primal);
            prop_assert!(activities[0] <= rat(b));
            prop_assert!(activities[1] <= rat(cap));
            prop_assert_eq!(solution.objective, Some(model.objective_value(&solution.primal)));
        }

        /// min c^T x equals -max -c^T x
        #[test]
        fn min_equals_negated_max(
            c1 in lp_coeff_strategy(),
            c2 in lp_coeff_strategy(),
            b in positive_coeff_strategy(),
            cap in positive_coeff_strategy()
        ) {
            let min = two_var_model(ObjectiveSense::Minimize, (c1, c2), (1, 2), b, cap);
            let max = two_var_model(ObjectiveSense::Maximize, (-c1, -c2), (1, 2), b, cap);
            let mut simplex = RationalSimplex::default();
            let min_obj = simplex.solve(&min).unwrap().objective.unwrap();
            let max_obj = simplex.solve(&max).unwrap().objective.unwrap();
            prop_assert_eq!(min_obj, -max_obj);
        }
    }
}

#[cfg(test)]
mod simplex_duality_properties {
    use super::*;

    proptest! {
        /// Row duals times row bounds plus bound duals reproduce the optimum
        #[test]
        fn strong_duality(
            c1 in lp_coeff_strategy(),
            c2 in lp_coeff_strategy(),
            a1 in positive_coeff_strategy(),
            a2 in positive_coeff_strategy(),
            b in positive_coeff_strategy(),
            cap in positive_coeff_strategy()
        ) {
            let model = two_var_model(ObjectiveSense::Minimize, (c1, c2), (a1, a2), b, cap);
            let solution = RationalSimplex::default().solve(&model).unwrap();
            prop_assert_eq!(solution.status, LpStatus::Optimal);

            // reduced cost d_j = c_j - A_j^T y; the lower bound 0 absorbs d_j,
            // so the optimum is sum_i y_i rhs_i
            let y = &solution.row_duals;
            let dual_objective = &y[0] * rat(b) + &y[1] * rat(cap);
            prop_assert_eq!(Some(dual_objective), solution.objective.clone());

            // dual feasibility of a minimization over <= rows and x >= 0
            prop_assert!(y[0] <= BigRational::zero());
            prop_assert!(y[1] <= BigRational::zero());
            let d1 = rat(c1) - &y[0] * rat(a1) - &y[1];
            let d2 = rat(c2) - &y[0] * rat(a2) - &y[1];
            prop_assert!(d1 >= BigRational::zero());
            prop_assert!(d2 >= BigRational::zero());
        }
    }
}
