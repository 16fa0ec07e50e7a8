//! CertBound Math - Exact arithmetic kernels for certified LP bounds
//!
//! This crate provides the numerical collaborators of the certified
//! bounding subsystem:
//! - Exact rational helpers with directed rounding to and from `f64`
//! - Outward-rounded floating-point intervals
//! - A general-form rational LP model with a two-phase exact simplex
//! - A rectangular exact LU factorization for projection systems
//!
//! # Examples
//!
//! ## Solving a small LP exactly
//!
//! ```
//! use certbound_math::lp::{ExactLpSolver, LpModel, LpStatus, ObjectiveSense, RationalSimplex};
//! use certbound_math::rational::rat;
//!
//! // maximize x + y  s.t.  x + 2y <= 4, 2x + y <= 3, x, y >= 0
//! let mut model = LpModel::new(ObjectiveSense::Maximize);
//! let x = model.add_column(rat(1), Some(rat(0)), None);
//! let y = model.add_column(rat(1), Some(rat(0)), None);
//! model.add_row(vec![(x, rat(1)), (y, rat(2))], None, Some(rat(4)));
//! model.add_row(vec![(x, rat(2)), (y, rat(1))], None, Some(rat(3)));
//!
//! let mut simplex = RationalSimplex::default();
//! let solution = simplex.solve(&model).unwrap();
//! assert_eq!(solution.status, LpStatus::Optimal);
//! ```
//!
//! ## Enclosing an exact value
//!
//! ```
//! use certbound_math::interval::Interval;
//! use num_rational::BigRational;
//! use num_bigint::BigInt;
//!
//! let third = BigRational::new(BigInt::from(1), BigInt::from(3));
//! let enclosure = Interval::enclose(&third);
//! assert!(enclosure.contains_rational(&third));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod interval;
pub mod lp;
pub mod rational;

pub use error::{MathError, MathResult};
pub use interval::Interval;
