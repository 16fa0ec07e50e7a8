//! Property-based tests for bound soundness
//!
//! This module tests:
//! - Project-and-shift output is exactly dual feasible
//! - No certified bound exceeds the exact optimum

use certbound::verify::check_dual;
use certbound::{
    ApproximateDualSolution, BoundPurpose, BoundRequest, BoundingConfig, BoundingEngine,
    BoundingMethod, CertificatePreference, IntervalBoundShifter, StrategyMode, build_certificate,
    project_and_shift,
};
use certbound_math::lp::{RationalSimplex, RectangularLu};
use certbound_math::rational::from_f64;
use proptest::prelude::*;

use super::{boxed_relaxation, exact_optimum, lp_coeff_strategy, positive_coeff_strategy};

/// Strategy for untrusted floating duals
fn dual_value_strategy() -> impl Strategy<Value = f64> {
    -3.0f64..3.0f64
}

#[cfg(test)]
mod project_shift_properties {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        /// Any approximate dual is repaired into an exact dual-feasible vector
        #[test]
        fn corrected_dual_is_feasible_and_sound(
            c1 in lp_coeff_strategy(),
            c2 in lp_coeff_strategy(),
            a in positive_coeff_strategy(),
            rhs in positive_coeff_strategy(),
            u in positive_coeff_strategy(),
            y1 in dual_value_strategy(),
            y2 in dual_value_strategy(),
            d1 in dual_value_strategy(),
            d2 in dual_value_strategy()
        ) {
            let relax = boxed_relaxation((c1, c2), [(a, 1, rhs), (1, a, rhs)], (u, u));
            let mut solver = RationalSimplex::default();
            let data = build_certificate(
                &relax,
                &BoundingConfig::default(),
                None,
                &mut solver,
                &RectangularLu::default(),
            )
            .unwrap();
            let approx = ApproximateDualSolution::new(vec![y1, y2], vec![d1, d2]);
            let corrected = project_and_shift(
                &relax,
                &data,
                &approx,
                BoundPurpose::LowerBound,
                CertificatePreference::Either,
            )
            .unwrap();

            let check = check_dual(&relax, &corrected.values, BoundPurpose::LowerBound);
            prop_assert!(check.is_feasible());
            let bound = corrected.bound.value().unwrap();
            prop_assert!(bound <= &exact_optimum(&relax));
        }
    }
}

#[cfg(test)]
mod interval_shift_properties {
    use super::*;

    proptest! {
        /// The interval bound never exceeds the exact optimum
        #[test]
        fn interval_bound_is_sound(
            c1 in lp_coeff_strategy(),
            c2 in lp_coeff_strategy(),
            a in positive_coeff_strategy(),
            rhs in positive_coeff_strategy(),
            u in positive_coeff_strategy(),
            y1 in dual_value_strategy(),
            y2 in dual_value_strategy()
        ) {
            let relax = boxed_relaxation((c1, c2), [(a, 1, rhs), (1, a, rhs)], (u, u));
            let approx = ApproximateDualSolution::new(vec![y1, y2], vec![0.0, 0.0]);
            let mut shifter = IntervalBoundShifter::new();
            // boxed columns: a bound always exists
            let bound = shifter
                .bound(&relax, &approx, BoundPurpose::LowerBound, 1e-9)
                .unwrap();
            prop_assert!(bound.value().unwrap() <= &exact_optimum(&relax));
        }

        /// Whatever method the engine picks, the bound is sound and rounds down safely
        #[test]
        fn engine_bound_is_sound(
            c1 in lp_coeff_strategy(),
            c2 in lp_coeff_strategy(),
            a in positive_coeff_strategy(),
            rhs in positive_coeff_strategy(),
            u in positive_coeff_strategy(),
            y1 in dual_value_strategy(),
            y2 in dual_value_strategy(),
            pin in prop_oneof![
                Just(StrategyMode::Automatic),
                Just(StrategyMode::Pinned(BoundingMethod::ProjectShift)),
            ]
        ) {
            let relax = boxed_relaxation((c1, c2), [(a, 1, rhs), (1, a, rhs)], (u, u));
            let approx = ApproximateDualSolution::new(vec![y1, y2], vec![0.0, 0.0]);
            let config = BoundingConfig::default().with_strategy(pin);
            let mut engine = BoundingEngine::new(config).unwrap();
            let result = engine
                .compute_safe_bound(&relax, Some(&approx), BoundRequest::lower_bound())
                .unwrap();
            let optimum = exact_optimum(&relax);
            let value = result.bound.value().unwrap();
            prop_assert!(value <= &optimum);
            prop_assert!(from_f64(result.bound.to_f64_down()).unwrap() <= *value);
        }
    }
}
