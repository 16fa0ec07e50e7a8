//! Two-Phase Rational Simplex.
//!
//! An exact primal simplex over `BigRational` on a dense tableau. It is the
//! trusted reference solver: slow, but every reported status, primal value
//! and dual value is exact.
//!
//! ## Algorithm
//!
//! 1. Rewrite the general-form model as `min c^T z, A z = b, z >= 0`
//!    (shift, mirror or split columns; add slacks and bound rows)
//! 2. Phase 1 minimizes the sum of one artificial per row
//! 3. Remaining zero-level artificials are pivoted out where possible
//! 4. Phase 2 optimizes the true objective with artificials barred
//!
//! Bland's rule is used for both entering and leaving choices, so the method
//! terminates on degenerate problems without perturbation. The artificial
//! columns start as the identity and therefore hold `B^-1` at the end, from
//! which the row duals are read.

use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::VarId;
use super::model::{ExactLpSolver, LpModel, LpSolution, LpStatus, ObjectiveSense};
use crate::error::MathResult;

/// Configuration of the rational simplex.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimplexConfig {
    /// Maximum pivots per solve (`None` = unlimited)
    pub iteration_limit: Option<usize>,
}

/// Rational simplex statistics
#[derive(Debug, Clone, Default)]
pub struct SimplexStats {
    /// Number of solves
    pub solves: usize,
    /// Total pivots over all solves
    pub iterations: usize,
    /// Pivots spent in phase 1
    pub phase_one_iterations: usize,
    /// Solves that ended infeasible
    pub infeasible: usize,
    /// Solves that ended unbounded
    pub unbounded: usize,
}

/// How a model column is expressed in standard-form columns.
#[derive(Debug, Clone)]
enum ColumnMap {
    /// `x = lower + z`
    Shifted { std: usize, lower: BigRational },
    /// `x = upper - z`
    Mirrored { std: usize, upper: BigRational },
    /// `x = pos - neg`
    Split { pos: usize, neg: usize },
}

/// `min cost^T z, rows z = rhs, z >= 0`
#[derive(Debug)]
struct StandardForm {
    rows: Vec<Vec<(usize, BigRational)>>,
    rhs: Vec<BigRational>,
    cost: Vec<BigRational>,
    column_map: Vec<ColumnMap>,
    /// Model row each standard row was derived from (`None` for bound rows)
    row_origin: Vec<Option<usize>>,
}

impl StandardForm {
    /// Returns `None` when crossed bounds make the model trivially infeasible.
    fn build(model: &LpModel) -> Option<Self> {
        let sign = match model.sense() {
            ObjectiveSense::Minimize => BigRational::one(),
            ObjectiveSense::Maximize => -BigRational::one(),
        };

        let mut cost = Vec::with_capacity(model.num_cols());
        let mut column_map = Vec::with_capacity(model.num_cols());
        let mut bound_rows = Vec::new();

        for column in model.columns() {
            let c = &sign * &column.objective;
            let map = match (&column.lower, &column.upper) {
                (Some(lower), upper) => {
                    let std = cost.len();
                    cost.push(c);
                    if let Some(upper) = upper {
                        if upper < lower {
                            return None;
                        }
                        bound_rows.push((std, upper - lower));
                    }
                    ColumnMap::Shifted {
                        std,
                        lower: lower.clone(),
                    }
                }
                (None, Some(upper)) => {
                    let std = cost.len();
                    cost.push(-c);
                    ColumnMap::Mirrored {
                        std,
                        upper: upper.clone(),
                    }
                }
                (None, None) => {
                    let pos = cost.len();
                    cost.push(c.clone());
                    cost.push(-c);
                    ColumnMap::Split { pos, neg: pos + 1 }
                }
            };
            column_map.push(map);
        }

        let mut form = Self {
            rows: Vec::new(),
            rhs: Vec::new(),
            cost,
            column_map,
            row_origin: Vec::new(),
        };

        for (i, row) in model.rows().iter().enumerate() {
            let mut entries = Vec::with_capacity(row.coeffs.len());
            let mut constant = BigRational::zero();
            for (var, a) in &row.coeffs {
                if a.is_zero() {
                    continue;
                }
                match &form.column_map[*var] {
                    ColumnMap::Shifted { std, lower } => {
                        entries.push((*std, a.clone()));
                        constant += a * lower;
                    }
                    ColumnMap::Mirrored { std, upper } => {
                        entries.push((*std, -a));
                        constant += a * upper;
                    }
                    ColumnMap::Split { pos, neg } => {
                        entries.push((*pos, a.clone()));
                        entries.push((*neg, -a));
                    }
                }
            }

            match (&row.lhs, &row.rhs) {
                (Some(lhs), Some(rhs)) if lhs == rhs => {
                    form.push_row(entries, rhs - &constant, Some(i));
                }
                (lhs, rhs) => {
                    if let (Some(lhs), Some(rhs)) = (lhs, rhs)
                        && lhs > rhs
                    {
                        return None;
                    }
                    if let Some(rhs) = rhs {
                        let slack = form.add_slack();
                        let mut with_slack = entries.clone();
                        with_slack.push((slack, BigRational::one()));
                        form.push_row(with_slack, rhs - &constant, Some(i));
                    }
                    if let Some(lhs) = lhs {
                        let surplus = form.add_slack();
                        let mut with_surplus = entries;
                        with_surplus.push((surplus, -BigRational::one()));
                        form.push_row(with_surplus, lhs - &constant, Some(i));
                    }
                }
            }
        }

        for (std, range) in bound_rows {
            let slack = form.add_slack();
            form.push_row(
                vec![(std, BigRational::one()), (slack, BigRational::one())],
                range,
                None,
            );
        }

        Some(form)
    }

    fn add_slack(&mut self) -> usize {
        self.cost.push(BigRational::zero());
        self.cost.len() - 1
    }

    fn push_row(
        &mut self,
        entries: Vec<(usize, BigRational)>,
        rhs: BigRational,
        origin: Option<usize>,
    ) {
        self.rows.push(entries);
        self.rhs.push(rhs);
        self.row_origin.push(origin);
    }

    /// Model values from standard-form values.
    fn recover(&self, z: &[BigRational]) -> Vec<BigRational> {
        self.column_map
            .iter()
            .map(|map| match map {
                ColumnMap::Shifted { std, lower } => lower + &z[*std],
                ColumnMap::Mirrored { std, upper } => upper - &z[*std],
                ColumnMap::Split { pos, neg } => &z[*pos] - &z[*neg],
            })
            .collect()
    }
}

/// Outcome of one simplex phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhaseOutcome {
    Optimal,
    Unbounded,
    IterationLimit,
}

/// Dense tableau with one artificial column per row.
#[derive(Debug)]
struct Tableau {
    /// `m` rows of `n + m + 1` entries; the last entry is the right-hand side
    cells: Vec<Vec<BigRational>>,
    basis: Vec<VarId>,
    /// Number of non-artificial columns
    num_structural: usize,
    /// Rows negated to make the right-hand side nonnegative
    flipped: Vec<bool>,
}

impl Tableau {
    fn new(form: &StandardForm) -> Self {
        let n = form.cost.len();
        let m = form.rows.len();
        let mut cells = vec![vec![BigRational::zero(); n + m + 1]; m];
        let mut flipped = vec![false; m];

        for (k, (entries, rhs)) in form.rows.iter().zip(&form.rhs).enumerate() {
            let row = &mut cells[k];
            for (col, value) in entries {
                row[*col] += value;
            }
            row[n + m] = rhs.clone();
            if rhs.is_negative() {
                flipped[k] = true;
                for cell in row.iter_mut() {
                    *cell = -&*cell;
                }
            }
            row[n + k] = BigRational::one();
        }

        Self {
            cells,
            basis: (n..n + m).collect(),
            num_structural: n,
            flipped,
        }
    }

    fn rhs_index(&self) -> usize {
        self.num_structural + self.cells.len()
    }

    fn reduced_cost(&self, cost: &[BigRational], col: usize) -> BigRational {
        let mut d = cost[col].clone();
        for (k, &b) in self.basis.iter().enumerate() {
            if !cost[b].is_zero() && !self.cells[k][col].is_zero() {
                d -= &cost[b] * &self.cells[k][col];
            }
        }
        d
    }

    fn objective(&self, cost: &[BigRational]) -> BigRational {
        let rhs = self.rhs_index();
        self.basis
            .iter()
            .enumerate()
            .fold(BigRational::zero(), |acc, (k, &b)| {
                acc + &cost[b] * &self.cells[k][rhs]
            })
    }

    /// Bland ratio test: smallest ratio, ties to the smallest basic index.
    fn leaving_row(&self, col: usize) -> Option<usize> {
        let rhs = self.rhs_index();
        let mut best: Option<(usize, BigRational)> = None;
        for (k, row) in self.cells.iter().enumerate() {
            if !row[col].is_positive() {
                continue;
            }
            let ratio = &row[rhs] / &row[col];
            let better = match &best {
                None => true,
                Some((current, best_ratio)) => {
                    ratio < *best_ratio
                        || (ratio == *best_ratio && self.basis[k] < self.basis[*current])
                }
            };
            if better {
                best = Some((k, ratio));
            }
        }
        best.map(|(k, _)| k)
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let pivot = self.cells[row][col].clone();
        for cell in self.cells[row].iter_mut() {
            *cell /= &pivot;
        }
        let pivot_row = self.cells[row].clone();
        for (k, other) in self.cells.iter_mut().enumerate() {
            if k == row || other[col].is_zero() {
                continue;
            }
            let factor = other[col].clone();
            for (cell, p) in other.iter_mut().zip(&pivot_row) {
                if !p.is_zero() {
                    *cell -= &factor * p;
                }
            }
        }
        self.basis[row] = col;
    }
}

/// Exact two-phase primal simplex.
#[derive(Debug, Default)]
pub struct RationalSimplex {
    config: SimplexConfig,
    stats: SimplexStats,
    /// Pivots of the solve in progress
    iterations: usize,
}

impl RationalSimplex {
    /// Create a new solver.
    pub fn new(config: SimplexConfig) -> Self {
        Self {
            config,
            stats: SimplexStats::default(),
            iterations: 0,
        }
    }

    /// Create a new solver with the default configuration.
    pub fn default_config() -> Self {
        Self::new(SimplexConfig::default())
    }

    /// Run one phase: enter only columns below `allow`.
    fn run_phase(
        &mut self,
        tableau: &mut Tableau,
        cost: &[BigRational],
        allow: usize,
    ) -> PhaseOutcome {
        loop {
            let Some(entering) =
                (0..allow).find(|&j| tableau.reduced_cost(cost, j).is_negative())
            else {
                return PhaseOutcome::Optimal;
            };
            if let Some(limit) = self.config.iteration_limit
                && self.iterations >= limit
            {
                return PhaseOutcome::IterationLimit;
            }
            let Some(leaving) = tableau.leaving_row(entering) else {
                return PhaseOutcome::Unbounded;
            };
            trace!(entering, leaving = tableau.basis[leaving], "simplex pivot");
            tableau.pivot(leaving, entering);
            self.iterations += 1;
        }
    }

    fn finish(&mut self, status: LpStatus) -> LpSolution {
        self.stats.iterations += self.iterations;
        match status {
            LpStatus::Infeasible => self.stats.infeasible += 1,
            LpStatus::Unbounded => self.stats.unbounded += 1,
            _ => {}
        }
        LpSolution::with_status(status, self.iterations)
    }

    /// Get statistics.
    pub fn stats(&self) -> &SimplexStats {
        &self.stats
    }

    /// Reset statistics.
    pub fn reset_stats(&mut self) {
        self.stats = SimplexStats::default();
    }
}

impl ExactLpSolver for RationalSimplex {
    fn solve(&mut self, model: &LpModel) -> MathResult<LpSolution> {
        model.validate()?;
        self.stats.solves += 1;
        self.iterations = 0;

        let Some(form) = StandardForm::build(model) else {
            return Ok(self.finish(LpStatus::Infeasible));
        };
        let n = form.cost.len();
        let m = form.rows.len();
        let mut tableau = Tableau::new(&form);

        // Phase 1
        let mut phase_one_cost = vec![BigRational::zero(); n];
        phase_one_cost.extend(std::iter::repeat_n(BigRational::one(), m));
        match self.run_phase(&mut tableau, &phase_one_cost, n) {
            PhaseOutcome::Optimal => {}
            PhaseOutcome::IterationLimit => return Ok(self.finish(LpStatus::IterationLimit)),
            // the phase-1 objective is bounded below by zero
            PhaseOutcome::Unbounded => unreachable!("phase 1 cannot be unbounded"),
        }
        self.stats.phase_one_iterations += self.iterations;
        if tableau.objective(&phase_one_cost).is_positive() {
            return Ok(self.finish(LpStatus::Infeasible));
        }

        for k in 0..m {
            if tableau.basis[k] < n {
                continue;
            }
            if let Some(col) = (0..n).find(|&j| !tableau.cells[k][j].is_zero()) {
                tableau.pivot(k, col);
            }
        }

        // Phase 2
        let mut cost = form.cost.clone();
        cost.extend(std::iter::repeat_n(BigRational::zero(), m));
        match self.run_phase(&mut tableau, &cost, n) {
            PhaseOutcome::Optimal => {}
            PhaseOutcome::Unbounded => return Ok(self.finish(LpStatus::Unbounded)),
            PhaseOutcome::IterationLimit => return Ok(self.finish(LpStatus::IterationLimit)),
        }

        let rhs = tableau.rhs_index();
        let mut z = vec![BigRational::zero(); n];
        for (k, &b) in tableau.basis.iter().enumerate() {
            if b < n {
                z[b] = tableau.cells[k][rhs].clone();
            }
        }
        let primal = form.recover(&z);

        let sign = match model.sense() {
            ObjectiveSense::Minimize => BigRational::one(),
            ObjectiveSense::Maximize => -BigRational::one(),
        };
        let mut row_duals = vec![BigRational::zero(); model.num_rows()];
        for k in 0..m {
            let Some(origin) = form.row_origin[k] else {
                continue;
            };
            let mut pi = tableau
                .basis
                .iter()
                .enumerate()
                .fold(BigRational::zero(), |acc, (r, &b)| {
                    acc + &cost[b] * &tableau.cells[r][n + k]
                });
            if tableau.flipped[k] {
                pi = -pi;
            }
            row_duals[origin] += &sign * pi;
        }

        let mut solution = self.finish(LpStatus::Optimal);
        solution.objective = Some(model.objective_value(&primal));
        solution.row_activities = model.row_activities(&primal);
        solution.primal = primal;
        solution.row_duals = row_duals;
        Ok(solution)
    }

    fn set_iteration_limit(&mut self, limit: Option<usize>) {
        self.config.iteration_limit = limit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rational::{frac, rat};

    fn seven_thirds_lp() -> LpModel {
        // maximize x + y  s.t.  x + 2y <= 4, 2x + y <= 3, x, y >= 0
        let mut model = LpModel::new(ObjectiveSense::Maximize);
        let x = model.add_column(rat(1), Some(rat(0)), None);
        let y = model.add_column(rat(1), Some(rat(0)), None);
        model.add_row(vec![(x, rat(1)), (y, rat(2))], None, Some(rat(4)));
        model.add_row(vec![(x, rat(2)), (y, rat(1))], None, Some(rat(3)));
        model
    }

    #[test]
    fn test_seven_thirds_optimum() {
        let mut simplex = RationalSimplex::default_config();
        let solution = simplex.solve(&seven_thirds_lp()).unwrap();
        assert_eq!(solution.status, LpStatus::Optimal);
        assert_eq!(solution.objective, Some(frac(7, 3)));
        assert_eq!(solution.primal, vec![frac(2, 3), frac(5, 3)]);
        assert_eq!(solution.row_duals, vec![frac(1, 3), frac(1, 3)]);
        assert_eq!(solution.row_activities, vec![rat(4), rat(3)]);
    }

    #[test]
    fn test_minimization_duals() {
        // minimize x + y  s.t.  x + 2y >= 2, 2x + y >= 2, x, y >= 0
        let mut model = LpModel::new(ObjectiveSense::Minimize);
        let x = model.add_column(rat(1), Some(rat(0)), None);
        let y = model.add_column(rat(1), Some(rat(0)), None);
        model.add_row(vec![(x, rat(1)), (y, rat(2))], Some(rat(2)), None);
        model.add_row(vec![(x, rat(2)), (y, rat(1))], Some(rat(2)), None);

        let solution = RationalSimplex::default_config().solve(&model).unwrap();
        assert_eq!(solution.objective, Some(frac(4, 3)));
        assert_eq!(solution.row_duals, vec![frac(1, 3), frac(1, 3)]);
    }

    #[test]
    fn test_equality_with_free_column() {
        // minimize x - y  s.t.  x + y = 3, y <= 5, x free
        let mut model = LpModel::new(ObjectiveSense::Minimize);
        let x = model.add_column(rat(1), None, None);
        let y = model.add_column(rat(-1), None, Some(rat(5)));
        model.add_row(vec![(x, rat(1)), (y, rat(1))], Some(rat(3)), Some(rat(3)));

        let solution = RationalSimplex::default_config().solve(&model).unwrap();
        assert_eq!(solution.status, LpStatus::Optimal);
        assert_eq!(solution.primal, vec![rat(-2), rat(5)]);
        assert_eq!(solution.objective, Some(rat(-7)));
        // c - A^T y must vanish on the free column
        assert_eq!(solution.row_duals, vec![rat(1)]);
    }

    #[test]
    fn test_infeasible_rows() {
        let mut model = LpModel::new(ObjectiveSense::Minimize);
        let x = model.add_column(rat(0), Some(rat(0)), None);
        model.add_row(vec![(x, rat(1))], Some(rat(2)), None);
        model.add_row(vec![(x, rat(1))], None, Some(rat(1)));

        let mut simplex = RationalSimplex::default_config();
        let solution = simplex.solve(&model).unwrap();
        assert_eq!(solution.status, LpStatus::Infeasible);
        assert_eq!(simplex.stats().infeasible, 1);
    }

    #[test]
    fn test_crossed_bounds_infeasible() {
        let mut model = LpModel::new(ObjectiveSense::Minimize);
        model.add_column(rat(1), Some(rat(3)), Some(rat(2)));
        let solution = RationalSimplex::default_config().solve(&model).unwrap();
        assert_eq!(solution.status, LpStatus::Infeasible);
    }

    #[test]
    fn test_unbounded() {
        let mut model = LpModel::new(ObjectiveSense::Minimize);
        model.add_column(rat(-1), Some(rat(0)), None);
        let solution = RationalSimplex::default_config().solve(&model).unwrap();
        assert_eq!(solution.status, LpStatus::Unbounded);
    }

    #[test]
    fn test_iteration_limit() {
        let mut simplex = RationalSimplex::new(SimplexConfig {
            iteration_limit: Some(0),
        });
        let solution = simplex.solve(&seven_thirds_lp()).unwrap();
        assert_eq!(solution.status, LpStatus::IterationLimit);

        simplex.set_iteration_limit(None);
        let solution = simplex.solve(&seven_thirds_lp()).unwrap();
        assert_eq!(solution.status, LpStatus::Optimal);
    }

    #[test]
    fn test_upper_bounded_column() {
        // minimize -x  s.t.  x <= 7 (bound only), x in (-inf, 7]
        let mut model = LpModel::new(ObjectiveSense::Minimize);
        model.add_column(rat(-1), None, Some(rat(7)));
        let solution = RationalSimplex::default_config().solve(&model).unwrap();
        assert_eq!(solution.primal, vec![rat(7)]);
        assert_eq!(solution.objective, Some(rat(-7)));
    }

    #[test]
    fn test_stats() {
        let mut simplex = RationalSimplex::default_config();
        simplex.solve(&seven_thirds_lp()).unwrap();
        assert_eq!(simplex.stats().solves, 1);
        assert!(simplex.stats().iterations > 0);
        simplex.reset_stats();
        assert_eq!(simplex.stats().solves, 0);
    }
}
