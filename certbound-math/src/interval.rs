//! Outward-Rounded Floating-Point Interval Arithmetic
//!
//! Every operation returns an interval that contains the exact real result of
//! the operation applied to any members of the operands. Rust exposes no
//! rounding-mode control, so directed rounding is emulated with error-free
//! transformations:
//!
//! - Sum: `TwoSum` recovers the exact rounding error of `a + b`
//! - Product: a fused multiply-add recovers the exact error of `a * b`
//!
//! and the rounded result is stepped one ulp outward whenever the error points
//! that way. Near the underflow threshold, where these transformations stop
//! being exact, the result is widened unconditionally.
//!
//! ## Conventions
//!
//! - `inf <= sup`; unbounded intervals use infinite endpoints
//! - `0 * inf = 0`, which is the correct limit for bound products where a
//!   zero multiplier meets an infinite bound

use std::ops::{Add, Mul, Neg, Sub};

use num_rational::BigRational;

use crate::rational::{from_f64, to_f64_down, to_f64_up};

/// Directed-rounding scalar kernels.
pub mod rounding {
    /// Below this magnitude a product's FMA residual may not be representable.
    const EXACT_PRODUCT_THRESHOLD: f64 = f64::MIN_POSITIVE * 9_007_199_254_740_992.0;

    fn two_sum_error(a: f64, b: f64, sum: f64) -> f64 {
        let b_virtual = sum - a;
        let a_virtual = sum - b_virtual;
        (a - a_virtual) + (b - b_virtual)
    }

    /// `a + b` rounded toward minus infinity.
    pub fn add_down(a: f64, b: f64) -> f64 {
        let sum = a + b;
        if sum.is_nan() {
            return f64::NEG_INFINITY;
        }
        if sum.is_infinite() {
            return if sum > 0.0 && a.is_finite() && b.is_finite() {
                f64::MAX
            } else {
                sum
            };
        }
        if two_sum_error(a, b, sum) < 0.0 {
            sum.next_down()
        } else {
            sum
        }
    }

    /// `a + b` rounded toward plus infinity.
    pub fn add_up(a: f64, b: f64) -> f64 {
        -add_down(-a, -b)
    }

    /// `a * b` rounded toward minus infinity, with `0 * inf = 0`.
    pub fn mul_down(a: f64, b: f64) -> f64 {
        if a == 0.0 || b == 0.0 {
            return 0.0;
        }
        let product = a * b;
        if product.is_nan() {
            return f64::NEG_INFINITY;
        }
        if product.is_infinite() {
            return if product > 0.0 && a.is_finite() && b.is_finite() {
                f64::MAX
            } else {
                product
            };
        }
        if product.abs() < EXACT_PRODUCT_THRESHOLD {
            return product.next_down();
        }
        if a.mul_add(b, -product) < 0.0 {
            product.next_down()
        } else {
            product
        }
    }

    /// `a * b` rounded toward plus infinity, with `0 * inf = 0`.
    pub fn mul_up(a: f64, b: f64) -> f64 {
        -mul_down(-a, b)
    }
}

use rounding::{add_down, add_up, mul_down, mul_up};

/// A closed floating-point interval `[inf, sup]`
///
/// Invariants:
/// - `inf <= sup`
/// - Neither endpoint is NaN
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Lower endpoint (inclusive)
    pub inf: f64,
    /// Upper endpoint (inclusive)
    pub sup: f64,
}

impl Interval {
    /// Create an interval from its endpoints.
    #[must_use]
    pub fn new(inf: f64, sup: f64) -> Self {
        debug_assert!(inf <= sup, "interval endpoints out of order: [{inf}, {sup}]");
        Self { inf, sup }
    }

    /// Create a point interval.
    #[must_use]
    pub fn point(value: f64) -> Self {
        Self::new(value, value)
    }

    /// `[0, 0]`
    #[must_use]
    pub fn zero() -> Self {
        Self::point(0.0)
    }

    /// `(-inf, +inf)`
    #[must_use]
    pub fn entire() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Tightest float interval containing an exact rational.
    #[must_use]
    pub fn enclose(value: &BigRational) -> Self {
        Self::new(to_f64_down(value), to_f64_up(value))
    }

    /// Check whether both endpoints coincide.
    pub fn is_point(&self) -> bool {
        self.inf == self.sup
    }

    /// Check whether both endpoints are finite.
    pub fn is_bounded(&self) -> bool {
        self.inf.is_finite() && self.sup.is_finite()
    }

    /// Check whether the interval contains a float.
    pub fn contains(&self, value: f64) -> bool {
        self.inf <= value && value <= self.sup
    }

    /// Check whether the interval contains an exact rational.
    pub fn contains_rational(&self, value: &BigRational) -> bool {
        let above_inf = match from_f64(self.inf) {
            Ok(inf) => &inf <= value,
            Err(_) => self.inf == f64::NEG_INFINITY,
        };
        let below_sup = match from_f64(self.sup) {
            Ok(sup) => value <= &sup,
            Err(_) => self.sup == f64::INFINITY,
        };
        above_inf && below_sup
    }

    /// Width `sup - inf`, rounded up.
    pub fn width(&self) -> f64 {
        add_up(self.sup, -self.inf)
    }

    /// Multiply by an exact float.
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        *self * Self::point(factor)
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for Interval {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(add_down(self.inf, rhs.inf), add_up(self.sup, rhs.sup))
    }
}

impl Sub for Interval {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl Neg for Interval {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.sup, -self.inf)
    }
}

impl Mul for Interval {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let corners = [
            (self.inf, rhs.inf),
            (self.inf, rhs.sup),
            (self.sup, rhs.inf),
            (self.sup, rhs.sup),
        ];
        let inf = corners
            .iter()
            .map(|&(a, b)| mul_down(a, b))
            .fold(f64::INFINITY, f64::min);
        let sup = corners
            .iter()
            .map(|&(a, b)| mul_up(a, b))
            .fold(f64::NEG_INFINITY, f64::max);
        Self::new(inf, sup)
    }
}

/// Outward-rounded scalar product of two interval vectors.
///
/// # Panics
/// Panics in debug builds if the slices differ in length.
pub fn dot(lhs: &[Interval], rhs: &[Interval]) -> Interval {
    debug_assert_eq!(lhs.len(), rhs.len());
    lhs.iter()
        .zip(rhs)
        .fold(Interval::zero(), |acc, (&a, &b)| acc + a * b)
}
