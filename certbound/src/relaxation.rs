//! Exact LP relaxation of a search node.
//!
//! The relaxation is a minimization `min c^T x` subject to
//! `lhs <= A x <= rhs` and `lb <= x <= ub`, stored exactly. Rows may be
//! appended between bound computations (cuts); existing rows keep their
//! coefficients and sides, and column bounds may only tighten.

use certbound_math::lp::{LpColumn, LpModel, LpRow, ObjectiveSense};
use num_rational::BigRational;
use serde::{Deserialize, Serialize};

use crate::error::{BoundError, BoundResult};

/// Exact LP relaxation (always a minimization).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExactRelaxation {
    model: LpModel,
}

impl Default for ExactRelaxation {
    fn default() -> Self {
        Self::new()
    }
}

impl ExactRelaxation {
    /// Create an empty relaxation.
    pub fn new() -> Self {
        Self {
            model: LpModel::new(ObjectiveSense::Minimize),
        }
    }

    /// Add a column `lower <= x_j <= upper` with objective coefficient `objective`.
    pub fn add_column(
        &mut self,
        objective: BigRational,
        lower: Option<BigRational>,
        upper: Option<BigRational>,
    ) -> usize {
        self.model.add_column(objective, lower, upper)
    }

    /// Append a row `lhs <= sum(coeffs) <= rhs`.
    pub fn add_row(
        &mut self,
        coeffs: Vec<(usize, BigRational)>,
        lhs: Option<BigRational>,
        rhs: Option<BigRational>,
    ) -> BoundResult<usize> {
        if let Some((col, _)) = coeffs.iter().find(|(col, _)| *col >= self.num_cols()) {
            return Err(BoundError::Precondition(format!(
                "row references column {col} of {}",
                self.num_cols()
            )));
        }
        if let (Some(lhs), Some(rhs)) = (&lhs, &rhs)
            && lhs > rhs
        {
            return Err(BoundError::Precondition(format!(
                "row sides cross: {lhs} > {rhs}"
            )));
        }
        Ok(self.model.add_row(coeffs, lhs, rhs))
    }

    /// Tighten or replace the bounds of a column.
    pub fn set_column_bounds(
        &mut self,
        col: usize,
        lower: Option<BigRational>,
        upper: Option<BigRational>,
    ) {
        self.model.set_bounds(col, lower, upper);
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.model.num_rows()
    }

    /// Number of columns.
    pub fn num_cols(&self) -> usize {
        self.model.num_cols()
    }

    /// Row `i`.
    pub fn row(&self, i: usize) -> &LpRow {
        &self.model.rows()[i]
    }

    /// Column `j`.
    pub fn column(&self, j: usize) -> &LpColumn {
        &self.model.columns()[j]
    }

    /// All rows.
    pub fn rows(&self) -> &[LpRow] {
        self.model.rows()
    }

    /// All columns.
    pub fn columns(&self) -> &[LpColumn] {
        self.model.columns()
    }

    /// Whether any row or column carries a finite bound.
    pub fn has_finite_bound(&self) -> bool {
        self.rows().iter().any(|r| r.lhs.is_some() || r.rhs.is_some())
            || self
                .columns()
                .iter()
                .any(|c| c.lower.is_some() || c.upper.is_some())
    }

    /// The relaxation as an LP model for an exact solver.
    pub fn as_model(&self) -> &LpModel {
        &self.model
    }
}
