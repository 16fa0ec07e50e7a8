//! Property-based tests for certbound-math
//!
//! This module contains property tests for:
//! - Directed rounding and interval enclosures
//! - Rational simplex optimality and duality
//! - Rectangular LU solves

mod interval_properties;
mod lu_properties;
mod simplex_properties;
