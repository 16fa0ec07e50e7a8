//! Property-based tests for the rectangular LU
//!
//! This module tests:
//! - Solutions reproduce consistent right-hand sides
//! - Rank never exceeds either dimension

use certbound_math::lp::{Factorizer, RectangularLu, SparseColumn};
use certbound_math::rational::rat;
use num_rational::BigRational;
use num_traits::Zero;
use proptest::prelude::*;

/// Strategy for small matrix entries
fn entry_strategy() -> impl Strategy<Value = i64> {
    -5i64..5i64
}

fn columns_from(num_rows: usize, entries: &[i64]) -> Vec<SparseColumn> {
    entries
        .chunks(num_rows)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .filter(|(_, v)| **v != 0)
                .map(|(i, v)| (i, rat(*v)))
                .collect()
        })
        .collect()
}

fn multiply(num_rows: usize, columns: &[SparseColumn], z: &[BigRational]) -> Vec<BigRational> {
    let mut out = vec![BigRational::zero(); num_rows];
    for (column, zj) in columns.iter().zip(z) {
        for (i, a) in column {
            out[*i] += a * zj;
        }
    }
    out
}

#[cfg(test)]
mod lu_solve_properties {
    use super::*;

    proptest! {
        /// A right-hand side built as D x is always solved exactly
        #[test]
        fn solve_reproduces_consistent_rhs(
            entries in prop::collection::vec(entry_strategy(), 12),
            x in prop::collection::vec(entry_strategy(), 4)
        ) {
            // 3 x 4 matrix
            let columns = columns_from(3, &entries);
            let x: Vec<BigRational> = x.into_iter().map(rat).collect();
            let rhs = multiply(3, &columns, &x);

            let factors = RectangularLu::default().factorize(3, &columns).unwrap();
            let z = factors.solve(&rhs).unwrap();
            prop_assert_eq!(z.len(), 4);
            prop_assert_eq!(multiply(3, &columns, &z), rhs);
        }

        /// Rank is bounded by both dimensions
        #[test]
        fn rank_is_bounded(entries in prop::collection::vec(entry_strategy(), 8)) {
            // 4 x 2 matrix
            let columns = columns_from(4, &entries);
            let factors = RectangularLu::default().factorize(4, &columns).unwrap();
            prop_assert!(factors.rank() <= 2);
            prop_assert_eq!(factors.num_rows(), 4);
            prop_assert_eq!(factors.num_cols(), 2);
        }
    }
}
