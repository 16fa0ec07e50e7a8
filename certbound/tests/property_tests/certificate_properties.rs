//! Property-based tests for column selection and certificates
//!
//! This module tests:
//! - Non-empty dual column sets whenever a finite bound exists
//! - Strict interiority of built certificates, also after scaling

use certbound::{
    BoundingConfig, CertificateFormulation, DualColumnSelection, build_certificate,
    select_dual_columns,
};
use certbound_math::lp::{RationalSimplex, RectangularLu};
use certbound_math::rational::frac;
use num_traits::Signed;
use proptest::prelude::*;

use super::{boxed_relaxation, lp_coeff_strategy, positive_coeff_strategy};

/// Strategy for the auxiliary LP formulation
fn formulation_strategy() -> impl Strategy<Value = CertificateFormulation> {
    prop_oneof![
        Just(CertificateFormulation::Optimized),
        Just(CertificateFormulation::Arbitrary),
        Just(CertificateFormulation::ArbitraryDual),
        Just(CertificateFormulation::TwoStage),
    ]
}

/// Strategy for the selection policy
fn selection_strategy() -> impl Strategy<Value = DualColumnSelection> {
    prop_oneof![
        Just(DualColumnSelection::AllFinite),
        Just(DualColumnSelection::ActiveExactRoot),
    ]
}

#[cfg(test)]
mod selection_properties {
    use super::*;

    proptest! {
        /// A relaxation with finite bounds never gets an empty column set
        #[test]
        fn column_set_non_empty(
            c1 in lp_coeff_strategy(),
            c2 in lp_coeff_strategy(),
            a in lp_coeff_strategy(),
            rhs in positive_coeff_strategy(),
            u in positive_coeff_strategy(),
            selection in selection_strategy()
        ) {
            let relax = boxed_relaxation((c1, c2), [(a, 1, rhs), (1, a, rhs)], (u, u));
            let config = BoundingConfig::default().with_selection(selection);
            let mut solver = RationalSimplex::default();
            let set = select_dual_columns(&relax, &config, None, &mut solver).unwrap();
            prop_assert!(!set.is_empty());
            for coord in set.iter() {
                prop_assert!(coord.has_finite_bound(&relax));
            }
        }
    }
}

#[cfg(test)]
mod interior_properties {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Every built certificate is strictly positive on S, also after scaling
        #[test]
        fn certificates_strictly_interior(
            c1 in lp_coeff_strategy(),
            c2 in lp_coeff_strategy(),
            a in positive_coeff_strategy(),
            rhs in positive_coeff_strategy(),
            u in positive_coeff_strategy(),
            formulation in formulation_strategy(),
            num in 1i64..20i64,
            den in 1i64..20i64
        ) {
            let relax = boxed_relaxation((c1, c2), [(a, 1, rhs), (1, a, rhs)], (u, u));
            let config = BoundingConfig::default().with_formulation(formulation);
            let mut solver = RationalSimplex::default();
            let lu = RectangularLu::default();
            let data = build_certificate(&relax, &config, None, &mut solver, &lu).unwrap();
            prop_assert!(data.point().is_some() || data.ray().is_some());

            let factor = frac(num, den);
            for vector in [data.point(), data.ray()].into_iter().flatten() {
                prop_assert!(vector.common_slack().is_positive());
                let scaled = vector.scaled(&factor).unwrap();
                for coord in data.columns().iter() {
                    prop_assert!(vector.get(coord).is_positive());
                    prop_assert!(scaled.get(coord).is_positive());
                }
            }
        }
    }
}
