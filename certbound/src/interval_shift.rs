//! Factorization-free bounds by outward-rounded interval arithmetic.
//!
//! For row multipliers `y` and the box `lb <= x <= ub`,
//!
//! ```text
//! c^T x >= y^T b + min { (c - A^T y)^T x : lb <= x <= ub }
//! ```
//!
//! holds for every primal feasible `x` as long as each `y_i` sits on a finite
//! side of its row with the right sign. Evaluating the right-hand side in
//! interval arithmetic keeps its lower endpoint safe no matter how inexact
//! `y` is.

use certbound_math::Interval;
use certbound_math::interval::dot;
use certbound_math::rational::{from_f64, to_f64_down, to_f64_up};
use tracing::{debug, trace, warn};

use crate::approx::{ApproximateDualSolution, BasisStatus};
use crate::bound::{BoundPurpose, CertifiedBound};
use crate::error::{BoundError, BoundResult};
use crate::relaxation::ExactRelaxation;

/// Interval enclosure of one exact row.
#[derive(Debug, Clone)]
struct RowEnclosure {
    coeffs: Vec<(usize, Interval)>,
    lhs: Option<Interval>,
    rhs: Option<Interval>,
}

/// Computes interval-shifted bounds for one relaxation.
///
/// Row enclosures are cached: rows of a relaxation are only ever appended.
/// Column bounds change from node to node and are enclosed on every call.
#[derive(Debug, Default)]
pub struct IntervalBoundShifter {
    rows: Vec<RowEnclosure>,
    num_cols: usize,
}

impl IntervalBoundShifter {
    /// Create a shifter with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all cached enclosures.
    pub fn reset(&mut self) {
        self.rows.clear();
        self.num_cols = 0;
    }

    /// Number of rows currently enclosed.
    pub fn cached_rows(&self) -> usize {
        self.rows.len()
    }

    fn sync(&mut self, relax: &ExactRelaxation) {
        if relax.num_cols() != self.num_cols || relax.num_rows() < self.rows.len() {
            self.reset();
            self.num_cols = relax.num_cols();
        }
        for row in &relax.rows()[self.rows.len()..] {
            self.rows.push(RowEnclosure {
                coeffs: row
                    .coeffs
                    .iter()
                    .map(|(j, a)| (*j, Interval::enclose(a)))
                    .collect(),
                lhs: row.lhs.as_ref().map(Interval::enclose),
                rhs: row.rhs.as_ref().map(Interval::enclose),
            });
        }
    }

    /// Certify a bound from approximate row multipliers.
    ///
    /// Multipliers of basic rows, or below `tolerance` in magnitude, are
    /// taken as zero; so is a multiplier whose side of the row is infinite.
    pub fn bound(
        &mut self,
        relax: &ExactRelaxation,
        approx: &ApproximateDualSolution,
        purpose: BoundPurpose,
        tolerance: f64,
    ) -> BoundResult<CertifiedBound> {
        approx.check(relax)?;
        self.sync(relax);

        let n = relax.num_cols();
        let mut aty = vec![Interval::zero(); n];
        let mut ytb = Interval::zero();
        for (i, row) in self.rows.iter().enumerate() {
            let y = approx.row_values[i];
            if approx.row_status(i) == BasisStatus::Basic || y.abs() <= tolerance {
                continue;
            }
            let side = if y > 0.0 { row.lhs } else { row.rhs };
            let Some(side) = side else {
                trace!(row = i, y, "multiplier on infinite side dropped");
                continue;
            };
            let y = Interval::point(y);
            ytb = ytb + y * side;
            for &(j, a) in &row.coeffs {
                aty[j] = aty[j] + y * a;
            }
        }

        let mut reduced = Vec::with_capacity(n);
        let mut boxes = Vec::with_capacity(n);
        let mut unbounded = 0usize;
        for (j, column) in relax.columns().iter().enumerate() {
            let c = match purpose {
                BoundPurpose::LowerBound => Interval::enclose(&column.objective),
                BoundPurpose::Infeasibility => Interval::zero(),
            };
            let red = c - aty[j];
            let x = Interval::new(
                column.lower.as_ref().map_or(f64::NEG_INFINITY, to_f64_down),
                column.upper.as_ref().map_or(f64::INFINITY, to_f64_up),
            );
            if (red * x).inf == f64::NEG_INFINITY {
                unbounded += 1;
            }
            reduced.push(red);
            boxes.push(x);
        }
        if unbounded > 0 {
            warn!(unbounded, "reduced costs meet infinite column bounds");
        }

        let total = ytb + dot(&reduced, &boxes);
        debug!(?purpose, bound = total.inf, unbounded, "interval shift finished");
        match purpose {
            BoundPurpose::LowerBound if total.inf == f64::NEG_INFINITY => Err(
                BoundError::NotCertified(format!("{unbounded} columns leave the bound unbounded")),
            ),
            BoundPurpose::LowerBound => Ok(CertifiedBound::Finite(from_f64(total.inf)?)),
            BoundPurpose::Infeasibility if total.inf > 0.0 => Ok(CertifiedBound::Infeasible),
            BoundPurpose::Infeasibility => Err(BoundError::NotCertified(format!(
                "Farkas value {} is not positive",
                total.inf
            ))),
        }
    }
}
