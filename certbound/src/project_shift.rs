//! Project-and-shift correction of approximate dual solutions.
//!
//! The approximate dual is lifted exactly into the extended dual space, its
//! equality violation is projected away through the certificate basis, and
//! any negative entries are repaired by moving toward the interior point (or
//! along the interior ray). The result is dual feasible by construction and
//! its objective is a certified bound.

use certbound_math::rational::from_f64;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use tracing::{debug, trace};

use crate::approx::ApproximateDualSolution;
use crate::bound::{BoundPurpose, CertifiedBound};
use crate::certificate::{CertificateData, InteriorVector};
use crate::config::CertificatePreference;
use crate::dual_space::{DualCoord, DualSpace, ExtendedDual};
use crate::error::{BoundError, BoundResult};
use crate::relaxation::ExactRelaxation;
use crate::verify::{dual_objective, dual_residual};

/// A repaired dual vector and the bound it proves.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectedDual {
    /// Exact, nonnegative, dual-feasible values over the current space
    pub values: ExtendedDual,
    /// The certified bound
    pub bound: CertifiedBound,
    /// Whether the equality violation had to be projected away
    pub projected: bool,
    /// Weight placed on the interior certificate (zero when no shift)
    pub shift: BigRational,
}

/// Which interior vector a shift uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftKind {
    Point,
    Ray,
}

/// Lift an approximate dual exactly into the extended dual space.
///
/// A positive value lands on the lower side of its row or column and a
/// negative one on the upper side. Values that would sit on an infinite
/// bound are clamped to zero.
pub fn lift_approximate(
    relax: &ExactRelaxation,
    approx: &ApproximateDualSolution,
) -> BoundResult<ExtendedDual> {
    let mut lifted = ExtendedDual::zeros(DualSpace::of(relax));
    let rows = approx
        .row_values
        .iter()
        .enumerate()
        .map(|(i, &v)| (DualCoord::RowLhs(i), v));
    let cols = approx
        .col_values
        .iter()
        .enumerate()
        .map(|(j, &v)| (DualCoord::ColLb(j), v));
    for (lower, v) in rows.chain(cols) {
        if v == 0.0 {
            continue;
        }
        let exact = from_f64(v).map_err(|e| BoundError::Precondition(e.to_string()))?;
        let (coord, value) = if exact.is_positive() {
            (lower, exact)
        } else {
            (lower.partner(), -exact)
        };
        if coord.has_finite_bound(relax) {
            lifted.set(coord, value);
        } else {
            trace!(?coord, "approximate weight on infinite bound clamped");
        }
    }
    Ok(lifted)
}

/// Subtract the common part of every lhs/rhs and lb/ub pair.
///
/// Both coordinates of a pair are nonnegative, so this keeps feasibility and
/// never lowers the dual objective when `lhs <= rhs` and `lb <= ub`.
pub fn simplify_pairs(values: &mut ExtendedDual) {
    let space = values.space();
    let pairs = (0..space.num_rows)
        .map(|i| (DualCoord::RowLhs(i), DualCoord::RowRhs(i)))
        .chain((0..space.num_cols).map(|j| (DualCoord::ColLb(j), DualCoord::ColUb(j))));
    for (lower, upper) in pairs {
        let common = values.value(lower).min(values.value(upper)).clone();
        if common.is_positive() {
            values.add_to(lower, &-&common);
            values.add_to(upper, &-&common);
        }
    }
}

/// Pick the interior vector for a purpose and preference.
fn choose_certificate(
    data: &CertificateData,
    purpose: BoundPurpose,
    preference: CertificatePreference,
) -> BoundResult<(ShiftKind, &InteriorVector)> {
    let point = data.point().map(|p| (ShiftKind::Point, p));
    let ray = data.ray().map(|r| (ShiftKind::Ray, r));
    let chosen = match (purpose, preference) {
        (BoundPurpose::Infeasibility, _) => ray,
        (BoundPurpose::LowerBound, CertificatePreference::Ray) => ray.or(point),
        (BoundPurpose::LowerBound, _) => point.or(ray),
    };
    chosen.ok_or_else(|| {
        BoundError::CertificateUnavailable(format!("no interior vector usable for {purpose:?}"))
    })
}

/// Repair negative entries by blending with a point or adding a ray.
///
/// Returns the weight placed on the certificate.
fn shift(
    values: &mut ExtendedDual,
    kind: ShiftKind,
    cert: &InteriorVector,
    columns: &[DualCoord],
) -> BigRational {
    let violating = columns
        .iter()
        .map(|&c| (values.get(c), cert.get(c)))
        .filter(|(v, _)| v.is_negative());
    match kind {
        ShiftKind::Point => {
            // keep = min p / (p - v) over negative v; 0 < keep < 1
            let keep = violating
                .map(|(v, p)| &p / (&p - v))
                .min()
                .unwrap_or_else(BigRational::one);
            if keep.is_one() {
                return BigRational::zero();
            }
            let weight = BigRational::one() - &keep;
            values.scale(&keep);
            values.add_scaled(&weight, cert.values());
            weight
        }
        ShiftKind::Ray => {
            let weight = violating
                .map(|(v, r)| -v / r)
                .max()
                .unwrap_or_else(BigRational::zero);
            if weight.is_positive() {
                values.add_scaled(&weight, cert.values());
            }
            weight
        }
    }
}

/// Certify a bound from an approximate dual by project-and-shift.
pub fn project_and_shift(
    relax: &ExactRelaxation,
    data: &CertificateData,
    approx: &ApproximateDualSolution,
    purpose: BoundPurpose,
    preference: CertificatePreference,
) -> BoundResult<CorrectedDual> {
    approx.check(relax)?;
    let space = data.space();
    if relax.num_cols() != space.num_cols || relax.num_rows() < space.num_rows {
        return Err(BoundError::Precondition(format!(
            "certificate built for {}x{}, relaxation is {}x{}",
            space.num_rows,
            space.num_cols,
            relax.num_rows(),
            relax.num_cols()
        )));
    }
    let (kind, cert) = choose_certificate(data, purpose, preference)?;

    let mut values = lift_approximate(relax, approx)?;
    let residual = dual_residual(relax, &values, purpose);
    let projected = residual.iter().any(|r| !r.is_zero());
    if projected {
        let correction = data
            .basis()
            .solve(&residual)
            .map_err(BoundError::Factorization)?;
        for (&coord, z) in data.columns().members().iter().zip(&correction) {
            if !z.is_zero() {
                values.add_to(coord, z);
            }
        }
    }

    let weight = shift(&mut values, kind, cert, data.columns().members());
    simplify_pairs(&mut values);

    #[cfg(debug_assertions)]
    {
        let check = crate::verify::check_dual(relax, &values, purpose);
        if !check.is_feasible() {
            return Err(BoundError::Invariant(format!(
                "corrected dual fails re-substitution: {check:?}"
            )));
        }
    }

    let objective = dual_objective(relax, &values)?;
    debug!(
        ?purpose,
        ?kind,
        projected,
        %weight,
        %objective,
        "project-and-shift finished"
    );
    let bound = match purpose {
        BoundPurpose::LowerBound => CertifiedBound::Finite(objective),
        BoundPurpose::Infeasibility if objective.is_positive() => CertifiedBound::Infeasible,
        BoundPurpose::Infeasibility => {
            return Err(BoundError::NotCertified(format!(
                "Farkas objective {objective} is not positive"
            )));
        }
    };
    Ok(CorrectedDual {
        values,
        bound,
        projected,
        shift: weight,
    })
}
