//! Interior certificates for project-and-shift.
//!
//! An interior point `p` satisfies the dual equality with the objective
//! (`Ã p = c`, `p >= 0`) and is strictly positive on every coordinate of the
//! dual column set `S`; an interior ray `r` satisfies `Ã r = 0`, `r >= 0`,
//! strictly positive on `S`. Here `Ã = [A^T, -A^T, I, -I]` restricted to the
//! coordinates with finite bounds. The smallest value on `S` is the common
//! slack.
//!
//! ## Auxiliary LPs
//!
//! With `y` over the finite coordinates and `M` the big-M bound:
//!
//! - Optimized point: `max a.b^T y + beta.d` s.t. `Ã y = c`, `y_i - d >= 0` on `S`,
//!   `0 <= d <= M`
//! - Optimized ray: any `y` with `Ã y = 0`, `y_i - d >= 0` on `S`, `d >= 1`
//! - Arbitrary: the LP dual of "maximize the interior slack", solved as
//!   `min -z + sum(w)` s.t. `D^T x - y' = 0`, `y'_i + w_i >= 1` on `S`,
//!   `-c^T x - z >= 0`; the point is read from its row duals
//! - Arbitrary dual: `min -sum(w)` s.t. `Ã y - c.z = 0`, `y_i - w_i >= 0` on `S`,
//!   `z >= 1`, `0 <= w <= 1`; the point is `y / z`
//! - Two-stage: the optimized point LP with `a = 0`, then again with the pure
//!   objective and `d` bounded below by the first optimum
//!
//! Every LP is assembled by [`AuxLpAssembly`]; the formulations only differ in
//! objective, bounds and which rows are homogenized.

use certbound_math::lp::{
    ExactLpSolver, Factorization, Factorizer, LpModel, LpSolution, ObjectiveSense, SparseColumn,
    VarId,
};
use certbound_math::rational::{from_f64, pow2_truncate, rat};
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use tracing::{debug, info, trace};

use crate::approx::ApproximateDualSolution;
use crate::bound::BoundPurpose;
use crate::column_select::{DualColumnSet, select_dual_columns};
use crate::config::{BoundingConfig, CertificateFormulation, CertificatePreference};
use crate::dual_space::{DualCoord, DualSpace, ExtendedDual};
use crate::error::{BoundError, BoundResult};
use crate::relaxation::ExactRelaxation;
use crate::verify::dual_residual;

/// Interior point or ray with its common slack.
#[derive(Debug, Clone, PartialEq)]
pub struct InteriorVector {
    values: ExtendedDual,
    common_slack: BigRational,
}

impl InteriorVector {
    /// Values over the extended dual space of the build-time relaxation.
    pub fn values(&self) -> &ExtendedDual {
        &self.values
    }

    /// Smallest value on `S`; strictly positive.
    pub fn common_slack(&self) -> &BigRational {
        &self.common_slack
    }

    /// Value at a coordinate.
    pub fn get(&self, coord: DualCoord) -> BigRational {
        self.values.get(coord)
    }

    /// Multiply by a positive rational.
    pub fn scaled(&self, factor: &BigRational) -> BoundResult<Self> {
        if !factor.is_positive() {
            return Err(BoundError::Precondition(format!(
                "interior vectors only scale by positive factors, got {factor}"
            )));
        }
        let mut values = self.values.clone();
        values.scale(factor);
        Ok(Self {
            values,
            common_slack: &self.common_slack * factor,
        })
    }
}

/// Everything project-and-shift needs, built once per relaxation.
#[derive(Debug)]
pub struct CertificateData {
    columns: DualColumnSet,
    basis: Box<dyn Factorization>,
    point: Option<InteriorVector>,
    ray: Option<InteriorVector>,
}

impl CertificateData {
    /// The dual column set `S`.
    pub fn columns(&self) -> &DualColumnSet {
        &self.columns
    }

    /// Factorization of `D`, the columns of `Ã` indexed by `S`.
    pub fn basis(&self) -> &dyn Factorization {
        self.basis.as_ref()
    }

    /// Interior point, if one was built.
    pub fn point(&self) -> Option<&InteriorVector> {
        self.point.as_ref()
    }

    /// Interior ray, if one was built.
    pub fn ray(&self) -> Option<&InteriorVector> {
        self.ray.as_ref()
    }

    /// Shape of the relaxation at build time.
    pub fn space(&self) -> DualSpace {
        self.columns.space()
    }
}

/// What an auxiliary LP has to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateTarget {
    /// Interior point, `Ã p = c`
    Point,
    /// Interior ray, `Ã r = 0`
    Ray,
}

impl CertificateTarget {
    fn purpose(self) -> BoundPurpose {
        match self {
            CertificateTarget::Point => BoundPurpose::LowerBound,
            CertificateTarget::Ray => BoundPurpose::Infeasibility,
        }
    }
}

/// Right-hand side of the `Ã y` equality rows.
#[derive(Debug, Clone, Copy)]
enum EqualityRhs {
    /// `Ã y = c`
    Objective,
    /// `Ã y = 0`
    Zero,
    /// `Ã y - c.z = 0` with `z` the given LP column
    Homogenized(VarId),
}

/// Shared scaffolding of the auxiliary LPs.
struct AuxLpAssembly<'a> {
    relax: &'a ExactRelaxation,
    columns: &'a DualColumnSet,
    /// Finite coordinates; LP column `k` of the `y` block is `dual_vars[k]`
    dual_vars: Vec<DualCoord>,
}

impl<'a> AuxLpAssembly<'a> {
    fn new(relax: &'a ExactRelaxation, columns: &'a DualColumnSet) -> Self {
        let dual_vars = columns
            .space()
            .coords()
            .filter(|c| c.has_finite_bound(relax))
            .collect();
        Self {
            relax,
            columns,
            dual_vars,
        }
    }

    fn num_dual_vars(&self) -> usize {
        self.dual_vars.len()
    }

    /// Dual objective coefficient of `y_k`.
    fn cost(&self, coord: DualCoord) -> BigRational {
        coord.cost(self.relax).unwrap_or_else(BigRational::zero)
    }

    /// One nonnegative column per finite coordinate; returns the first index.
    fn add_dual_columns(
        &self,
        model: &mut LpModel,
        objective: impl Fn(DualCoord) -> BigRational,
    ) -> VarId {
        let first = model.num_cols();
        for &coord in &self.dual_vars {
            model.add_column(objective(coord), Some(BigRational::zero()), None);
        }
        first
    }

    /// Rows `(Ã y)_j = rhs_j` for every primal column `j`.
    fn add_equality_rows(&self, model: &mut LpModel, first_y: VarId, rhs: EqualityRhs) {
        let mut rows: Vec<Vec<(VarId, BigRational)>> = vec![Vec::new(); self.relax.num_cols()];
        for (k, coord) in self.dual_vars.iter().enumerate() {
            for (j, a) in coord.column(self.relax) {
                rows[j].push((first_y + k, a));
            }
        }
        for (j, mut coeffs) in rows.into_iter().enumerate() {
            let c = &self.relax.column(j).objective;
            let side = match rhs {
                EqualityRhs::Objective => c.clone(),
                EqualityRhs::Zero => BigRational::zero(),
                EqualityRhs::Homogenized(z) => {
                    if !c.is_zero() {
                        coeffs.push((z, -c));
                    }
                    BigRational::zero()
                }
            };
            model.add_row(coeffs, Some(side.clone()), Some(side));
        }
    }

    /// Rows `y_i - t_i >= 0` for `i` in `S`, where `t_i` is `slack(position in S)`.
    fn add_interior_rows(
        &self,
        model: &mut LpModel,
        first_y: VarId,
        slack: impl Fn(usize) -> VarId,
    ) {
        let mut s = 0;
        for (k, coord) in self.dual_vars.iter().enumerate() {
            if !self.columns.contains(*coord) {
                continue;
            }
            model.add_row(
                vec![(first_y + k, BigRational::one()), (slack(s), -BigRational::one())],
                Some(BigRational::zero()),
                None,
            );
            s += 1;
        }
    }

    /// Spread LP values of the `y` block over the extended dual space.
    fn unpack(&self, values: &[BigRational], divisor: Option<&BigRational>) -> ExtendedDual {
        let mut out = ExtendedDual::zeros(self.columns.space());
        for (coord, v) in self.dual_vars.iter().zip(values) {
            if v.is_zero() {
                continue;
            }
            let v = match divisor {
                Some(d) => v / d,
                None => v.clone(),
            };
            out.set(*coord, v);
        }
        out
    }
}

/// Solve an auxiliary LP, demanding optimality.
fn solve_aux<S: ExactLpSolver + ?Sized>(
    solver: &mut S,
    model: &LpModel,
    what: &str,
) -> BoundResult<LpSolution> {
    let solution = solver
        .solve(model)
        .map_err(|e| BoundError::AuxiliaryLp(format!("{what}: {e}")))?;
    if !solution.is_optimal() {
        return Err(BoundError::AuxiliaryLp(format!(
            "{what} ended {:?}",
            solution.status
        )));
    }
    solution.check_shape(model).map_err(|e| {
        BoundError::AuxiliaryLp(format!("{what} returned a malformed solution: {e}"))
    })?;
    Ok(solution)
}

/// Builds interior points and rays under the configured formulation.
pub struct CertificateBuilder<'a> {
    assembly: AuxLpAssembly<'a>,
    config: &'a BoundingConfig,
    root_objective: Option<f64>,
}

impl<'a> CertificateBuilder<'a> {
    /// Create a builder for the set `columns` of `relax`.
    pub fn new(
        relax: &'a ExactRelaxation,
        columns: &'a DualColumnSet,
        config: &'a BoundingConfig,
        root_objective: Option<f64>,
    ) -> Self {
        Self {
            assembly: AuxLpAssembly::new(relax, columns),
            config,
            root_objective,
        }
    }

    /// Objective weights `(alpha, beta)` of the optimized point LP.
    ///
    /// With a positive objective weight `w`, `beta` is
    /// `(1 - w) max(|z_root|, 1) / w` truncated to a power of two and `alpha`
    /// is one.
    pub fn objective_weights(&self) -> BoundResult<(BigRational, BigRational)> {
        let weight = self.config.objective_weight;
        if weight <= 0.0 {
            return Ok((BigRational::zero(), BigRational::one()));
        }
        let scale = self.root_objective.map_or(1.0, |z| z.abs().max(1.0));
        let beta = (1.0 - weight) * scale / weight;
        if !(beta.is_finite() && beta > 0.0) {
            return Err(BoundError::InvalidConfig(format!(
                "objective weight {weight} gives interior weight {beta}"
            )));
        }
        Ok((BigRational::one(), from_f64(pow2_truncate(beta))?))
    }

    /// Build an interior point or ray.
    pub fn build<S: ExactLpSolver + ?Sized>(
        &self,
        target: CertificateTarget,
        solver: &mut S,
    ) -> BoundResult<InteriorVector> {
        let values = match (target, self.config.formulation) {
            (CertificateTarget::Ray, _) => self.optimized(target, solver)?,
            (CertificateTarget::Point, CertificateFormulation::Optimized) => {
                self.optimized(target, solver)?
            }
            (CertificateTarget::Point, CertificateFormulation::Arbitrary) => {
                self.arbitrary(solver)?
            }
            (CertificateTarget::Point, CertificateFormulation::ArbitraryDual) => {
                self.arbitrary_dual(solver)?
            }
            (CertificateTarget::Point, CertificateFormulation::TwoStage) => {
                self.two_stage(solver)?
            }
        };
        self.finish(target, values)
    }

    /// Model of the optimized formulation; returns it with the `d` column.
    fn optimized_model(
        &self,
        target: CertificateTarget,
        weights: &(BigRational, BigRational),
    ) -> (LpModel, VarId) {
        let a = &self.assembly;
        let (alpha, beta) = weights;
        let mut model = LpModel::new(ObjectiveSense::Maximize);
        let first_y = a.add_dual_columns(&mut model, |c| alpha * a.cost(c));
        let d = match target {
            CertificateTarget::Point => model.add_column(
                beta.clone(),
                Some(BigRational::zero()),
                Some(rat(self.config.big_m)),
            ),
            CertificateTarget::Ray => {
                model.add_column(BigRational::zero(), Some(BigRational::one()), None)
            }
        };
        let rhs = match target {
            CertificateTarget::Point => EqualityRhs::Objective,
            CertificateTarget::Ray => EqualityRhs::Zero,
        };
        a.add_equality_rows(&mut model, first_y, rhs);
        a.add_interior_rows(&mut model, first_y, |_| d);
        (model, d)
    }

    fn optimized<S: ExactLpSolver + ?Sized>(
        &self,
        target: CertificateTarget,
        solver: &mut S,
    ) -> BoundResult<ExtendedDual> {
        let weights = match target {
            CertificateTarget::Point => self.objective_weights()?,
            CertificateTarget::Ray => (BigRational::zero(), BigRational::zero()),
        };
        let (model, d) = self.optimized_model(target, &weights);
        let solution = solve_aux(solver, &model, "optimized interior LP")?;
        if solution.primal[d].is_zero() {
            return Err(BoundError::AuxiliaryLp("common slack is zero".into()));
        }
        Ok(self.assembly.unpack(&solution.primal, None))
    }

    fn two_stage<S: ExactLpSolver + ?Sized>(&self, solver: &mut S) -> BoundResult<ExtendedDual> {
        let a = &self.assembly;
        let (mut model, d) = self.optimized_model(
            CertificateTarget::Point,
            &(BigRational::zero(), BigRational::one()),
        );
        let first = solve_aux(solver, &model, "two-stage interior LP")?;
        let floor = first.primal[d].clone();
        if floor.is_zero() {
            return Err(BoundError::AuxiliaryLp("no interior point exists".into()));
        }
        trace!(%floor, "two-stage interiorness floor");

        for (k, &coord) in a.dual_vars.iter().enumerate() {
            model.set_objective(k, a.cost(coord));
        }
        model.set_objective(d, BigRational::zero());
        model.set_bounds(d, Some(floor), Some(rat(self.config.big_m)));
        let second = solve_aux(solver, &model, "two-stage objective LP")?;
        Ok(a.unpack(&second.primal, None))
    }

    fn arbitrary<S: ExactLpSolver + ?Sized>(&self, solver: &mut S) -> BoundResult<ExtendedDual> {
        let a = &self.assembly;
        let relax = a.relax;
        let n = relax.num_cols();
        let nd = a.num_dual_vars();

        let mut model = LpModel::new(ObjectiveSense::Minimize);
        for _ in 0..n {
            model.add_column(BigRational::zero(), None, None);
        }
        let first_y = model.num_cols();
        for _ in 0..nd {
            model.add_column(BigRational::zero(), Some(BigRational::zero()), None);
        }
        let z = model.add_column(-BigRational::one(), Some(BigRational::zero()), None);
        let first_w = model.num_cols();
        for _ in 0..a.columns.len() {
            model.add_column(BigRational::one(), Some(BigRational::zero()), None);
        }

        for (k, coord) in a.dual_vars.iter().enumerate() {
            let mut coeffs: Vec<(VarId, BigRational)> = coord.column(relax).into_iter().collect();
            coeffs.push((first_y + k, -BigRational::one()));
            model.add_row(coeffs, Some(BigRational::zero()), Some(BigRational::zero()));
        }
        let mut s = 0;
        for (k, coord) in a.dual_vars.iter().enumerate() {
            if a.columns.contains(*coord) {
                model.add_row(
                    vec![(first_y + k, BigRational::one()), (first_w + s, BigRational::one())],
                    Some(BigRational::one()),
                    None,
                );
                s += 1;
            }
        }
        let mut last: Vec<(VarId, BigRational)> = relax
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.objective.is_zero())
            .map(|(j, c)| (j, -&c.objective))
            .collect();
        last.push((z, -BigRational::one()));
        let last_row = model.add_row(last, Some(BigRational::zero()), None);

        let solution = solve_aux(solver, &model, "arbitrary interior LP")?;
        let scale = &solution.row_duals[last_row];
        if !scale.is_positive() {
            return Err(BoundError::AuxiliaryLp(format!(
                "arbitrary interior LP scale is {scale}"
            )));
        }
        Ok(a.unpack(&solution.row_duals[..nd], Some(scale)))
    }

    fn arbitrary_dual<S: ExactLpSolver + ?Sized>(
        &self,
        solver: &mut S,
    ) -> BoundResult<ExtendedDual> {
        let a = &self.assembly;
        let mut model = LpModel::new(ObjectiveSense::Minimize);
        let first_y = a.add_dual_columns(&mut model, |_| BigRational::zero());
        let z = model.add_column(BigRational::zero(), Some(BigRational::one()), None);
        let first_w = model.num_cols();
        for _ in 0..a.columns.len() {
            model.add_column(
                -BigRational::one(),
                Some(BigRational::zero()),
                Some(BigRational::one()),
            );
        }
        a.add_equality_rows(&mut model, first_y, EqualityRhs::Homogenized(z));
        a.add_interior_rows(&mut model, first_y, |s| first_w + s);

        let solution = solve_aux(solver, &model, "arbitrary-dual interior LP")?;
        let scale = &solution.primal[z];
        Ok(a.unpack(&solution.primal[first_y..first_y + a.num_dual_vars()], Some(scale)))
    }

    /// Verify a candidate exactly and attach its common slack.
    fn finish(
        &self,
        target: CertificateTarget,
        values: ExtendedDual,
    ) -> BoundResult<InteriorVector> {
        let a = &self.assembly;
        if !values.is_nonnegative() {
            return Err(BoundError::AuxiliaryLp(format!("{target:?} has negative entries")));
        }
        if dual_residual(a.relax, &values, target.purpose())
            .iter()
            .any(|r| !r.is_zero())
        {
            return Err(BoundError::AuxiliaryLp(format!(
                "{target:?} violates the dual equality"
            )));
        }
        let common_slack = a
            .columns
            .iter()
            .map(|c| values.value(c))
            .min()
            .cloned()
            .ok_or_else(|| BoundError::AuxiliaryLp("empty dual column set".into()))?;
        if !common_slack.is_positive() {
            return Err(BoundError::AuxiliaryLp(format!(
                "{target:?} is not interior (common slack {common_slack})"
            )));
        }
        debug!(
            ?target,
            %common_slack,
            nonzeros = values.nonzeros().count(),
            "interior certificate built"
        );
        Ok(InteriorVector {
            values,
            common_slack,
        })
    }
}

/// Choose `S`, factorize `D` and compute the interior certificates.
///
/// The ray is always attempted; the point is attempted when the preference
/// asks for it or the ray failed. At least one of them must exist.
pub fn build_certificate<S, F>(
    relax: &ExactRelaxation,
    config: &BoundingConfig,
    approx: Option<&ApproximateDualSolution>,
    solver: &mut S,
    factorizer: &F,
) -> BoundResult<CertificateData>
where
    S: ExactLpSolver + ?Sized,
    F: Factorizer + ?Sized,
{
    let columns = select_dual_columns(relax, config, approx, solver)?;
    if columns.is_empty() {
        return Err(BoundError::CertificateUnavailable(
            "relaxation has no finite bound".into(),
        ));
    }

    let d_columns: Vec<SparseColumn> = columns.iter().map(|c| c.column(relax)).collect();
    let basis = factorizer
        .factorize(relax.num_cols(), &d_columns)
        .map_err(BoundError::Factorization)?;
    trace!(rank = basis.rank(), cols = basis.num_cols(), "certificate basis factorized");

    let root_objective = approx.and_then(|a| a.objective);
    let builder = CertificateBuilder::new(relax, &columns, config, root_objective);
    solver.set_iteration_limit(None);
    let ray = builder
        .build(CertificateTarget::Ray, solver)
        .inspect_err(|e| debug!(error = %e, "no interior ray"))
        .ok();
    let want_point = config.preference != CertificatePreference::Ray || ray.is_none();
    let point = if want_point {
        builder
            .build(CertificateTarget::Point, solver)
            .inspect_err(|e| debug!(error = %e, "no interior point"))
            .ok()
    } else {
        None
    };
    solver.set_iteration_limit(config.exact_iteration_limit);

    if point.is_none() && ray.is_none() {
        return Err(BoundError::AuxiliaryLp(
            "neither an interior point nor an interior ray exists".into(),
        ));
    }
    info!(
        included = columns.len(),
        point = point.is_some(),
        ray = ray.is_some(),
        formulation = ?config.formulation,
        "interior certificate ready"
    );
    Ok(CertificateData {
        columns,
        basis,
        point,
        ray,
    })
}
