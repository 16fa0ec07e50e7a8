//! Rectangular Exact LU Factorization.
//!
//! Factorizes an `m x n` rational matrix `D` (any shape, any rank) once and
//! then solves `D z = r` for many right-hand sides. The elimination records
//! every row operation (the `L` part) and keeps the reduced pivot rows (the
//! `U` part) sparse. A solve replays the row operations on `r`, checks that
//! nothing is left in rows without a pivot, and back-substitutes; columns
//! without a pivot are set to zero.
//!
//! ## Pivoting
//!
//! Each step picks the nonzero with the smallest Markowitz count
//! `(row_count - 1) * (col_count - 1)`, ties broken by the lowest column and
//! then the lowest row. Exact arithmetic needs no numerical threshold.

use std::fmt;

use num_rational::BigRational;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::trace;

use crate::error::{MathError, MathResult};

/// Sparse column `(row, value)` of the matrix to factorize.
pub type SparseColumn = SmallVec<[(usize, BigRational); 4]>;

/// A factorized matrix able to solve linear systems.
pub trait Factorization: fmt::Debug {
    /// Number of rows of the factorized matrix.
    fn num_rows(&self) -> usize;

    /// Number of columns of the factorized matrix.
    fn num_cols(&self) -> usize;

    /// Rank found during elimination.
    fn rank(&self) -> usize;

    /// Solve `D z = rhs`, returning some solution of length `num_cols()`.
    fn solve(&self, rhs: &[BigRational]) -> MathResult<Vec<BigRational>>;
}

/// Capability to factorize a column-given rectangular matrix.
pub trait Factorizer {
    /// Factorize the `num_rows x columns.len()` matrix.
    fn factorize(
        &self,
        num_rows: usize,
        columns: &[SparseColumn],
    ) -> MathResult<Box<dyn Factorization>>;
}

/// Configuration for the rectangular LU.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LuConfig {
    /// Use Markowitz pivoting; otherwise take the first nonzero in column order
    pub markowitz: bool,
}

impl Default for LuConfig {
    fn default() -> Self {
        Self { markowitz: true }
    }
}

/// Row operation `row[target] -= factor * row[source]`.
#[derive(Debug, Clone)]
struct Elimination {
    target: usize,
    source: usize,
    factor: BigRational,
}

/// One step of the factorization.
#[derive(Debug, Clone)]
struct PivotStep {
    row: usize,
    col: usize,
    /// Reduced pivot row, pivot entry included
    entries: Vec<(usize, BigRational)>,
}

/// LU factors of a rectangular matrix.
#[derive(Debug, Clone)]
pub struct LuFactors {
    num_rows: usize,
    num_cols: usize,
    eliminations: Vec<Elimination>,
    steps: Vec<PivotStep>,
    pivot_rows: Vec<bool>,
}

impl Factorization for LuFactors {
    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn num_cols(&self) -> usize {
        self.num_cols
    }

    fn rank(&self) -> usize {
        self.steps.len()
    }

    fn solve(&self, rhs: &[BigRational]) -> MathResult<Vec<BigRational>> {
        if rhs.len() != self.num_rows {
            return Err(MathError::DimensionMismatch {
                expected: self.num_rows,
                got: rhs.len(),
            });
        }

        let mut b = rhs.to_vec();
        for op in &self.eliminations {
            if !b[op.source].is_zero() {
                let delta = &op.factor * &b[op.source];
                b[op.target] -= delta;
            }
        }

        if let Some(row) = (0..self.num_rows).find(|&i| !self.pivot_rows[i] && !b[i].is_zero()) {
            return Err(MathError::InconsistentSystem { row });
        }

        let mut z = vec![BigRational::zero(); self.num_cols];
        for step in self.steps.iter().rev() {
            let mut value = b[step.row].clone();
            let mut pivot = None;
            for (col, a) in &step.entries {
                if *col == step.col {
                    pivot = Some(a);
                } else if !z[*col].is_zero() {
                    value -= a * &z[*col];
                }
            }
            let pivot = pivot.ok_or_else(|| {
                MathError::SingularSystem(format!("missing pivot in column {}", step.col))
            })?;
            z[step.col] = value / pivot;
        }
        Ok(z)
    }
}

/// Rectangular LU factorizer
#[derive(Debug, Clone, Default)]
pub struct RectangularLu {
    config: LuConfig,
}

impl RectangularLu {
    /// Create a new factorizer.
    pub fn new(config: LuConfig) -> Self {
        Self { config }
    }

    /// Factorize into concrete LU factors.
    pub fn factor(&self, num_rows: usize, columns: &[SparseColumn]) -> MathResult<LuFactors> {
        let num_cols = columns.len();
        let mut work = vec![vec![BigRational::zero(); num_cols]; num_rows];
        for (j, column) in columns.iter().enumerate() {
            for (i, value) in column {
                if *i >= num_rows {
                    return Err(MathError::DimensionMismatch {
                        expected: num_rows,
                        got: *i + 1,
                    });
                }
                work[*i][j] += value;
            }
        }

        let mut row_active = vec![true; num_rows];
        let mut col_active = vec![true; num_cols];
        let mut eliminations = Vec::new();
        let mut steps = Vec::new();

        while let Some((pr, pc)) = self.choose_pivot(&work, &row_active, &col_active) {
            trace!(row = pr, col = pc, "lu pivot");
            row_active[pr] = false;
            col_active[pc] = false;

            let pivot_row = work[pr].clone();
            for r in 0..num_rows {
                if !row_active[r] || work[r][pc].is_zero() {
                    continue;
                }
                let factor = &work[r][pc] / &pivot_row[pc];
                for (cell, p) in work[r].iter_mut().zip(&pivot_row) {
                    if !p.is_zero() {
                        *cell -= &factor * p;
                    }
                }
                eliminations.push(Elimination {
                    target: r,
                    source: pr,
                    factor,
                });
            }

            let entries = pivot_row
                .into_iter()
                .enumerate()
                .filter(|(_, v)| !v.is_zero())
                .collect();
            steps.push(PivotStep {
                row: pr,
                col: pc,
                entries,
            });
        }

        let mut pivot_rows = vec![false; num_rows];
        for step in &steps {
            pivot_rows[step.row] = true;
        }

        Ok(LuFactors {
            num_rows,
            num_cols,
            eliminations,
            steps,
            pivot_rows,
        })
    }

    fn choose_pivot(
        &self,
        work: &[Vec<BigRational>],
        row_active: &[bool],
        col_active: &[bool],
    ) -> Option<(usize, usize)> {
        let active_rows: Vec<usize> = (0..work.len()).filter(|&r| row_active[r]).collect();
        let active_cols: Vec<usize> = (0..col_active.len()).filter(|&c| col_active[c]).collect();

        if !self.config.markowitz {
            return active_cols.iter().find_map(|&c| {
                active_rows
                    .iter()
                    .find(|&&r| !work[r][c].is_zero())
                    .map(|&r| (r, c))
            });
        }

        let row_counts: Vec<usize> = (0..work.len())
            .map(|r| {
                if row_active[r] {
                    active_cols.iter().filter(|&&c| !work[r][c].is_zero()).count()
                } else {
                    0
                }
            })
            .collect();

        let mut best: Option<(usize, (usize, usize))> = None;
        for &c in &active_cols {
            let col_count = active_rows.iter().filter(|&&r| !work[r][c].is_zero()).count();
            if col_count == 0 {
                continue;
            }
            for &r in &active_rows {
                if work[r][c].is_zero() {
                    continue;
                }
                let cost = (row_counts[r] - 1) * (col_count - 1);
                if best.is_none_or(|(best_cost, _)| cost < best_cost) {
                    best = Some((cost, (r, c)));
                }
            }
        }
        best.map(|(_, pivot)| pivot)
    }
}

impl Factorizer for RectangularLu {
    fn factorize(
        &self,
        num_rows: usize,
        columns: &[SparseColumn],
    ) -> MathResult<Box<dyn Factorization>> {
        Ok(Box::new(self.factor(num_rows, columns)?))
    }
}
