//! General-form rational LP model and the exact-solver capability.
//!
//! A model is `min/max c^T x` subject to `lhs <= A x <= rhs` and
//! `lb <= x <= ub`, where every bound is an `Option` and `None` stands for the
//! infinite side.

use num_rational::BigRational;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use super::{ConstraintId, VarId};
use crate::error::{MathError, MathResult};

/// Direction of optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObjectiveSense {
    /// Minimize the objective
    #[default]
    Minimize,
    /// Maximize the objective
    Maximize,
}

/// A column of the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpColumn {
    /// Objective coefficient
    pub objective: BigRational,
    /// Lower bound (`None` = minus infinity)
    pub lower: Option<BigRational>,
    /// Upper bound (`None` = plus infinity)
    pub upper: Option<BigRational>,
}

/// A ranged row `lhs <= sum(coeffs) <= rhs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpRow {
    /// Sparse coefficients (column, value)
    pub coeffs: Vec<(VarId, BigRational)>,
    /// Left-hand side (`None` = minus infinity)
    pub lhs: Option<BigRational>,
    /// Right-hand side (`None` = plus infinity)
    pub rhs: Option<BigRational>,
}

/// A rational LP in general form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LpModel {
    sense: ObjectiveSense,
    columns: Vec<LpColumn>,
    rows: Vec<LpRow>,
}

impl LpModel {
    /// Create an empty model.
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            sense,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Optimization direction.
    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    /// Add a column and return its index.
    pub fn add_column(
        &mut self,
        objective: BigRational,
        lower: Option<BigRational>,
        upper: Option<BigRational>,
    ) -> VarId {
        self.columns.push(LpColumn {
            objective,
            lower,
            upper,
        });
        self.columns.len() - 1
    }

    /// Add a row and return its index.
    pub fn add_row(
        &mut self,
        coeffs: Vec<(VarId, BigRational)>,
        lhs: Option<BigRational>,
        rhs: Option<BigRational>,
    ) -> ConstraintId {
        self.rows.push(LpRow { coeffs, lhs, rhs });
        self.rows.len() - 1
    }

    /// Replace the objective coefficient of a column.
    pub fn set_objective(&mut self, var: VarId, objective: BigRational) {
        self.columns[var].objective = objective;
    }

    /// Replace the bounds of a column.
    pub fn set_bounds(
        &mut self,
        var: VarId,
        lower: Option<BigRational>,
        upper: Option<BigRational>,
    ) {
        let column = &mut self.columns[var];
        column.lower = lower;
        column.upper = upper;
    }

    /// Number of columns.
    pub fn num_cols(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// All columns.
    pub fn columns(&self) -> &[LpColumn] {
        &self.columns
    }

    /// All rows.
    pub fn rows(&self) -> &[LpRow] {
        &self.rows
    }

    /// Check column indices of every row entry.
    pub fn validate(&self) -> MathResult<()> {
        for (i, row) in self.rows.iter().enumerate() {
            if let Some(&(var, _)) = row.coeffs.iter().find(|(var, _)| *var >= self.columns.len())
            {
                return Err(MathError::InvalidModel(format!(
                    "row {i} references column {var} of {}",
                    self.columns.len()
                )));
            }
        }
        Ok(())
    }

    /// Objective value `c^T x`.
    pub fn objective_value(&self, values: &[BigRational]) -> BigRational {
        self.columns
            .iter()
            .zip(values)
            .fold(BigRational::zero(), |acc, (col, x)| acc + &col.objective * x)
    }

    /// Row activities `A x`.
    pub fn row_activities(&self, values: &[BigRational]) -> Vec<BigRational> {
        self.rows
            .iter()
            .map(|row| {
                row.coeffs
                    .iter()
                    .fold(BigRational::zero(), |acc, (var, a)| acc + a * &values[*var])
            })
            .collect()
    }
}

/// Termination status of an exact LP solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LpStatus {
    /// Optimal solution found
    Optimal,
    /// No feasible point exists
    Infeasible,
    /// The objective is unbounded in the optimization direction
    Unbounded,
    /// The iteration limit stopped the solve
    IterationLimit,
}

/// Result of an exact LP solve.
///
/// Row duals follow the convention `c - A^T y = reduced costs`. For a
/// minimization a binding `>=` side carries `y >= 0` and a binding `<=` side
/// carries `y <= 0`; the signs flip for a maximization.
#[derive(Debug, Clone)]
pub struct LpSolution {
    /// Termination status
    pub status: LpStatus,
    /// Objective value (only when optimal)
    pub objective: Option<BigRational>,
    /// Primal values (empty unless optimal)
    pub primal: Vec<BigRational>,
    /// Row activities (empty unless optimal)
    pub row_activities: Vec<BigRational>,
    /// Row duals (empty unless optimal)
    pub row_duals: Vec<BigRational>,
    /// Simplex iterations spent
    pub iterations: usize,
}

impl LpSolution {
    /// A solution carrying only a status.
    pub fn with_status(status: LpStatus, iterations: usize) -> Self {
        Self {
            status,
            objective: None,
            primal: Vec::new(),
            row_activities: Vec::new(),
            row_duals: Vec::new(),
            iterations,
        }
    }

    /// Check for optimality.
    pub fn is_optimal(&self) -> bool {
        self.status == LpStatus::Optimal
    }

    /// Check that an optimal solution carries one value per column and row
    /// of `model` and an objective value.
    pub fn check_shape(&self, model: &LpModel) -> MathResult<()> {
        if !self.is_optimal() {
            return Ok(());
        }
        let expect = |expected: usize, actual: usize| {
            if expected == actual {
                Ok(())
            } else {
                Err(MathError::DimensionMismatch { expected, got: actual })
            }
        };
        expect(model.num_cols(), self.primal.len())?;
        expect(model.num_rows(), self.row_activities.len())?;
        expect(model.num_rows(), self.row_duals.len())?;
        if self.objective.is_none() {
            return Err(MathError::InvalidModel(
                "optimal solution without objective value".into(),
            ));
        }
        Ok(())
    }
}

/// An exact (rational) LP solver.
pub trait ExactLpSolver {
    /// Solve the model to optimality, infeasibility or unboundedness.
    fn solve(&mut self, model: &LpModel) -> MathResult<LpSolution>;

    /// Limit the number of simplex iterations per solve (`None` = unlimited).
    fn set_iteration_limit(&mut self, limit: Option<usize>);
}
