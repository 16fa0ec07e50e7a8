//! Exact rational helpers and directed rounding between `BigRational` and `f64`.
//!
//! Every `f64` is a dyadic rational, so converting a float into a rational is
//! exact. The opposite direction is not: `to_f64_down` and `to_f64_up` return
//! the nearest representable neighbour on the requested side, which is what a
//! certified bound needs when it leaves exact arithmetic.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive};

use crate::error::{MathError, MathResult};

/// Integer as a rational.
pub fn rat(n: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(n))
}

/// The fraction `numer / denom` in lowest terms.
///
/// # Panics
/// Panics if `denom` is zero.
pub fn frac(numer: i64, denom: i64) -> BigRational {
    BigRational::new(BigInt::from(numer), BigInt::from(denom))
}

/// Exact rational value of a finite float.
pub fn from_f64(value: f64) -> MathResult<BigRational> {
    BigRational::from_float(value).ok_or(MathError::NonFinite(value))
}

/// Closest float, saturating to the infinity of matching sign when out of range.
fn nearest(value: &BigRational) -> f64 {
    match value.to_f64() {
        Some(v) if !v.is_nan() => v,
        _ if value.is_positive() => f64::INFINITY,
        _ => f64::NEG_INFINITY,
    }
}

/// Largest float that is `<= value`.
pub fn to_f64_down(value: &BigRational) -> f64 {
    let mut approx = nearest(value);
    if approx == f64::INFINITY {
        approx = f64::MAX;
    }
    while approx.is_finite() {
        match BigRational::from_float(approx) {
            Some(exact) if &exact > value => approx = approx.next_down(),
            _ => break,
        }
    }
    approx
}

/// Smallest float that is `>= value`.
pub fn to_f64_up(value: &BigRational) -> f64 {
    let mut approx = nearest(value);
    if approx == f64::NEG_INFINITY {
        approx = f64::MIN;
    }
    while approx.is_finite() {
        match BigRational::from_float(approx) {
            Some(exact) if &exact < value => approx = approx.next_up(),
            _ => break,
        }
    }
    approx
}

/// `2^trunc(log2(value))` for a positive finite `value`.
///
/// Used to keep objective weights on a power-of-two grid so that scaling an
/// auxiliary LP does not inflate denominators.
pub fn pow2_truncate(value: f64) -> f64 {
    debug_assert!(value.is_finite() && value > 0.0);
    let exponent = value.log2().trunc();
    2f64.powi(exponent as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::{One, Zero};

    fn big_power(base: i64, exp: u32) -> BigRational {
        BigRational::from_integer(BigInt::from(base).pow(exp))
    }

    #[test]
    fn test_from_f64_is_exact() {
        assert_eq!(from_f64(0.5).unwrap(), frac(1, 2));
        assert_eq!(from_f64(-3.0).unwrap(), rat(-3));
        // 0.1 is not one tenth in binary
        assert_ne!(from_f64(0.1).unwrap(), frac(1, 10));
    }

    #[test]
    fn test_from_f64_rejects_non_finite() {
        assert!(from_f64(f64::NAN).is_err());
        assert_eq!(
            from_f64(f64::INFINITY),
            Err(MathError::NonFinite(f64::INFINITY))
        );
    }

    #[test]
    fn test_directed_rounding_brackets_third() {
        let third = frac(1, 3);
        let down = to_f64_down(&third);
        let up = to_f64_up(&third);
        assert!(from_f64(down).unwrap() < third);
        assert!(from_f64(up).unwrap() > third);
        assert_eq!(down.next_up(), up);
    }

    #[test]
    fn test_directed_rounding_exact_values() {
        let half = frac(1, 2);
        assert_eq!(to_f64_down(&half), 0.5);
        assert_eq!(to_f64_up(&half), 0.5);
        assert_eq!(to_f64_down(&BigRational::zero()), 0.0);
    }

    #[test]
    fn test_directed_rounding_out_of_range() {
        let huge = big_power(10, 400);
        assert_eq!(to_f64_down(&huge), f64::MAX);
        assert_eq!(to_f64_up(&huge), f64::INFINITY);
        assert_eq!(to_f64_down(&-huge.clone()), f64::NEG_INFINITY);
        assert_eq!(to_f64_up(&-huge), f64::MIN);

        let tiny = BigRational::one() / big_power(10, 400);
        assert_eq!(to_f64_down(&tiny), 0.0);
        assert!(to_f64_up(&tiny) > 0.0);
    }

    #[test]
    fn test_pow2_truncate() {
        assert_eq!(pow2_truncate(1.0), 1.0);
        assert_eq!(pow2_truncate(5.0), 4.0);
        assert_eq!(pow2_truncate(1024.5), 1024.0);
        assert_eq!(pow2_truncate(0.3), 0.5);
    }
}
