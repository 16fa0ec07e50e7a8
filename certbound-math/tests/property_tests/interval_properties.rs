//! Property-based tests for outward-rounded intervals
//!
//! This module tests:
//! - Directed rounding of rationals to floats
//! - Enclosure of exact sums and products

use certbound_math::Interval;
use certbound_math::rational::{frac, from_f64, to_f64_down, to_f64_up};
use num_rational::BigRational;
use proptest::prelude::*;

/// Strategy for small fractions
fn fraction_strategy() -> impl Strategy<Value = BigRational> {
    (-1000i64..1000i64, 1i64..97i64).prop_map(|(n, d)| frac(n, d))
}

/// Strategy for floats of moderate magnitude
fn float_strategy() -> impl Strategy<Value = f64> {
    -1.0e6f64..1.0e6f64
}

#[cfg(test)]
mod rounding_properties {
    use super::*;

    proptest! {
        /// Rounding down never lands above the exact value, rounding up never below
        #[test]
        fn directed_rounding_brackets(q in fraction_strategy()) {
            let down = from_f64(to_f64_down(&q)).unwrap();
            let up = from_f64(to_f64_up(&q)).unwrap();
            prop_assert!(down <= q);
            prop_assert!(q <= up);
        }

        /// Exact floats round to themselves
        #[test]
        fn floats_are_fixed_points(x in float_strategy()) {
            let q = from_f64(x).unwrap();
            prop_assert_eq!(to_f64_down(&q), x);
            prop_assert_eq!(to_f64_up(&q), x);
        }
    }
}

#[cfg(test)]
mod enclosure_properties {
    use super::*;

    proptest! {
        /// The interval sum contains the exact sum of the enclosed values
        #[test]
        fn sum_encloses(a in fraction_strategy(), b in fraction_strategy()) {
            let sum = Interval::enclose(&a) + Interval::enclose(&b);
            prop_assert!(sum.contains_rational(&(&a + &b)));
        }

        /// The interval product contains the exact product
        #[test]
        fn product_encloses(a in fraction_strategy(), b in fraction_strategy()) {
            let product = Interval::enclose(&a) * Interval::enclose(&b);
            prop_assert!(product.contains_rational(&(&a * &b)));
        }

        /// Products of float points contain the exact float product
        #[test]
        fn float_product_encloses(x in float_strategy(), y in float_strategy()) {
            let product = Interval::point(x) * Interval::point(y);
            let exact = from_f64(x).unwrap() * from_f64(y).unwrap();
            prop_assert!(product.contains_rational(&exact));
            prop_assert!(product.width() >= 0.0);
        }

        /// Difference of an interval with itself contains zero
        #[test]
        fn self_difference_contains_zero(a in fraction_strategy()) {
            let i = Interval::enclose(&a);
            prop_assert!((i - i).contains(0.0));
        }
    }
}
