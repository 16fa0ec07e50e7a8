//! Per-node orchestration of the bounding methods.
//!
//! The engine owns everything that lives as long as one relaxation: the
//! memoized interior certificate, the interval shifter's row cache, the
//! injected exact solver and factorizer. Each call to
//! [`BoundingEngine::compute_safe_bound`] walks a method plan and returns the
//! first certified result; the exact solver closes every plan.

use std::time::{Duration, Instant};

use certbound_math::lp::{ExactLpSolver, Factorizer, LpStatus, RationalSimplex, RectangularLu};
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::approx::ApproximateDualSolution;
use crate::bound::{BoundPurpose, BoundRequest, CertifiedBound};
use crate::certificate::{CertificateData, build_certificate};
use crate::config::{BoundingConfig, BoundingMethod, InterleavePolicy, StrategyMode};
use crate::error::{BoundError, BoundResult};
use crate::interval_shift::IntervalBoundShifter;
use crate::project_shift::project_and_shift;
use crate::relaxation::ExactRelaxation;

/// Lifecycle of the interior certificate of one relaxation.
#[derive(Debug, Default)]
pub enum CertificateState {
    /// Not attempted yet
    #[default]
    Pending,
    /// Built and cached
    Ready(Box<CertificateData>),
    /// Construction failed; not retried for this relaxation
    Failed(BoundError),
}

/// Statistics of the bounding engine
#[derive(Debug, Clone, Default)]
pub struct BoundingStats {
    /// Lower-bound calls to the interval shifter
    pub interval_shift_calls: usize,
    /// Failed lower-bound calls to the interval shifter
    pub interval_shift_failures: usize,
    /// Infeasibility calls to the interval shifter
    pub interval_shift_infeas_calls: usize,
    /// Failed infeasibility calls to the interval shifter
    pub interval_shift_infeas_failures: usize,
    /// Lower-bound calls to project-and-shift
    pub project_shift_calls: usize,
    /// Failed lower-bound calls to project-and-shift
    pub project_shift_failures: usize,
    /// Infeasibility calls to project-and-shift
    pub project_shift_infeas_calls: usize,
    /// Failed infeasibility calls to project-and-shift
    pub project_shift_infeas_failures: usize,
    /// Lower-bound calls to the exact solver
    pub exact_calls: usize,
    /// Failed lower-bound calls to the exact solver
    pub exact_failures: usize,
    /// Infeasibility calls to the exact solver
    pub exact_infeas_calls: usize,
    /// Failed infeasibility calls to the exact solver
    pub exact_infeas_failures: usize,
    /// Simplex iterations spent in exact solves
    pub exact_iterations: usize,
    /// Certificate construction attempts
    pub certificate_builds: usize,
    /// Failed certificate constructions
    pub certificate_failures: usize,
    /// Time spent building certificates
    pub certificate_time: Duration,
    /// Time spent per method
    pub method_time: FxHashMap<BoundingMethod, Duration>,
}

impl BoundingStats {
    fn record(
        &mut self,
        method: BoundingMethod,
        purpose: BoundPurpose,
        ok: bool,
        elapsed: Duration,
    ) {
        let (calls, failures) = match (method, purpose) {
            (BoundingMethod::IntervalShift, BoundPurpose::LowerBound) => {
                (&mut self.interval_shift_calls, &mut self.interval_shift_failures)
            }
            (BoundingMethod::IntervalShift, BoundPurpose::Infeasibility) => (
                &mut self.interval_shift_infeas_calls,
                &mut self.interval_shift_infeas_failures,
            ),
            (BoundingMethod::ProjectShift, BoundPurpose::LowerBound) => {
                (&mut self.project_shift_calls, &mut self.project_shift_failures)
            }
            (BoundingMethod::ProjectShift, BoundPurpose::Infeasibility) => (
                &mut self.project_shift_infeas_calls,
                &mut self.project_shift_infeas_failures,
            ),
            (BoundingMethod::ExactLp, BoundPurpose::LowerBound) => {
                (&mut self.exact_calls, &mut self.exact_failures)
            }
            (BoundingMethod::ExactLp, BoundPurpose::Infeasibility) => {
                (&mut self.exact_infeas_calls, &mut self.exact_infeas_failures)
            }
        };
        *calls += 1;
        if !ok {
            *failures += 1;
        }
        *self.method_time.entry(method).or_default() += elapsed;
    }

    /// Total time spent in one method.
    pub fn time_in(&self, method: BoundingMethod) -> Duration {
        self.method_time.get(&method).copied().unwrap_or_default()
    }
}

/// A certified result and the method that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SafeBound {
    /// The certified bound or infeasibility determination
    pub bound: CertifiedBound,
    /// Method that produced it
    pub method: BoundingMethod,
}

/// Certified bounding for one relaxation.
#[derive(Debug)]
pub struct BoundingEngine<S = RationalSimplex, F = RectangularLu> {
    /// Configuration
    config: BoundingConfig,
    /// Exact LP solver for auxiliary LPs, the root solve and the fallback
    solver: S,
    /// Factorizer for the certificate basis
    factorizer: F,
    /// Memoized interior certificate
    certificate: CertificateState,
    /// Interval shifter with its row cache
    shifter: IntervalBoundShifter,
    /// Statistics
    stats: BoundingStats,
}

impl BoundingEngine {
    /// Create an engine with the rational simplex and rectangular LU.
    pub fn new(config: BoundingConfig) -> BoundResult<Self> {
        Self::with_components(config, RationalSimplex::default(), RectangularLu::default())
    }
}

impl<S: ExactLpSolver, F: Factorizer> BoundingEngine<S, F> {
    /// Create an engine with injected collaborators.
    pub fn with_components(
        config: BoundingConfig,
        mut solver: S,
        factorizer: F,
    ) -> BoundResult<Self> {
        config.validate()?;
        solver.set_iteration_limit(config.exact_iteration_limit);
        Ok(Self {
            config,
            solver,
            factorizer,
            certificate: CertificateState::Pending,
            shifter: IntervalBoundShifter::new(),
            stats: BoundingStats::default(),
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &BoundingConfig {
        &self.config
    }

    /// Get statistics
    pub fn stats(&self) -> &BoundingStats {
        &self.stats
    }

    /// Reset statistics
    pub fn reset_stats(&mut self) {
        self.stats = BoundingStats::default();
    }

    /// The exact solver.
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Current certificate state.
    pub fn certificate_state(&self) -> &CertificateState {
        &self.certificate
    }

    /// The certificate, if built.
    pub fn certificate(&self) -> Option<&CertificateData> {
        match &self.certificate {
            CertificateState::Ready(data) => Some(&**data),
            _ => None,
        }
    }

    /// Forget everything tied to the current relaxation.
    pub fn reset_relaxation(&mut self) {
        self.certificate = CertificateState::Pending;
        self.shifter.reset();
    }

    /// Build the interior certificate unless already attempted.
    ///
    /// Returns the cached certificate on every later call. A failed
    /// construction is cached too and reported as
    /// [`BoundError::CertificateUnavailable`].
    pub fn ensure_certificate(
        &mut self,
        relax: &ExactRelaxation,
        approx: Option<&ApproximateDualSolution>,
    ) -> BoundResult<&CertificateData> {
        if matches!(self.certificate, CertificateState::Pending) {
            let start = Instant::now();
            let result = build_certificate(
                relax,
                &self.config,
                approx,
                &mut self.solver,
                &self.factorizer,
            );
            self.stats.certificate_builds += 1;
            self.stats.certificate_time += start.elapsed();
            self.certificate = match result {
                Ok(data) => CertificateState::Ready(Box::new(data)),
                Err(err) => {
                    self.stats.certificate_failures += 1;
                    warn!(
                        error = %err,
                        "interior certificate construction failed, project-and-shift disabled"
                    );
                    CertificateState::Failed(err)
                }
            };
        }
        match &self.certificate {
            CertificateState::Ready(data) => Ok(&**data),
            CertificateState::Failed(err) => {
                Err(BoundError::CertificateUnavailable(err.to_string()))
            }
            CertificateState::Pending => Err(BoundError::Invariant(
                "certificate still pending after construction".into(),
            )),
        }
    }

    /// Whether the interleave policy forces an exact solve for this request.
    ///
    /// Only lower-bound requests interleave. `WhenPromising` fires when the
    /// floating objective falls short of the cutoff by no more than the
    /// relative feasibility tolerance, so a safe bound would only nearly
    /// prune the node.
    fn interleave_exact(
        &self,
        request: &BoundRequest,
        approx: Option<&ApproximateDualSolution>,
    ) -> bool {
        if request.purpose != BoundPurpose::LowerBound {
            return false;
        }
        match self.config.interleave {
            InterleavePolicy::Never => false,
            InterleavePolicy::WhenPromising => {
                match (approx.and_then(|a| a.objective), request.cutoff_bound) {
                    (Some(objective), Some(cutoff)) => {
                        let slack = self.config.feasibility_tolerance * cutoff.abs().max(1.0);
                        objective >= cutoff - slack && objective < cutoff
                    }
                    _ => false,
                }
            }
            InterleavePolicy::EveryNthDepth(k) => {
                k > 0
                    && request.depth > 0
                    && request.depth % k == 0
                    && request.cutoff_bound.is_none()
            }
        }
    }

    /// Methods to try for a request, in order. The exact solver is always last.
    pub fn method_plan(
        &self,
        request: &BoundRequest,
        approx: Option<&ApproximateDualSolution>,
    ) -> Vec<BoundingMethod> {
        if self.interleave_exact(request, approx) {
            return vec![BoundingMethod::ExactLp];
        }
        match self.config.strategy {
            StrategyMode::Automatic => {
                let mut plan = vec![BoundingMethod::IntervalShift];
                if !matches!(self.certificate, CertificateState::Failed(_)) {
                    plan.push(BoundingMethod::ProjectShift);
                }
                plan.push(BoundingMethod::ExactLp);
                plan
            }
            StrategyMode::Pinned(BoundingMethod::ExactLp) => vec![BoundingMethod::ExactLp],
            StrategyMode::Pinned(method) => vec![method, BoundingMethod::ExactLp],
        }
    }

    /// Compute a certified bound or infeasibility proof.
    ///
    /// Methods fall through on any failure; only when the exact solver fails
    /// as well does this return [`BoundError::NoMethodSucceeded`].
    pub fn compute_safe_bound(
        &mut self,
        relax: &ExactRelaxation,
        approx: Option<&ApproximateDualSolution>,
        request: BoundRequest,
    ) -> BoundResult<SafeBound> {
        let purpose = request.purpose;
        for method in self.method_plan(&request, approx) {
            let start = Instant::now();
            let outcome = match method {
                BoundingMethod::IntervalShift => self.run_interval_shift(relax, approx, purpose),
                BoundingMethod::ProjectShift => self.run_project_shift(relax, approx, purpose),
                BoundingMethod::ExactLp => self.run_exact(relax),
            };
            self.stats.record(method, purpose, outcome.is_ok(), start.elapsed());
            match outcome {
                Ok(bound) => {
                    debug!(?method, ?purpose, %bound, depth = request.depth, "bound certified");
                    return Ok(SafeBound { bound, method });
                }
                Err(err) if err.is_permanent() => {
                    info!(?method, error = %err, "method unavailable for this relaxation")
                }
                Err(err) => debug!(?method, error = %err, "falling through"),
            }
        }
        warn!(?purpose, depth = request.depth, "no bounding method succeeded");
        Err(BoundError::NoMethodSucceeded)
    }

    fn run_interval_shift(
        &mut self,
        relax: &ExactRelaxation,
        approx: Option<&ApproximateDualSolution>,
        purpose: BoundPurpose,
    ) -> BoundResult<CertifiedBound> {
        let approx = approx.ok_or_else(missing_approx)?;
        self.shifter
            .bound(relax, approx, purpose, self.config.feasibility_tolerance)
    }

    fn run_project_shift(
        &mut self,
        relax: &ExactRelaxation,
        approx: Option<&ApproximateDualSolution>,
        purpose: BoundPurpose,
    ) -> BoundResult<CertifiedBound> {
        let approx = approx.ok_or_else(missing_approx)?;
        approx.check(relax)?;
        let preference = self.config.preference;
        let data = self.ensure_certificate(relax, Some(approx))?;
        project_and_shift(relax, data, approx, purpose, preference).map(|c| c.bound)
    }

    fn run_exact(&mut self, relax: &ExactRelaxation) -> BoundResult<CertifiedBound> {
        self.solver.set_iteration_limit(self.config.exact_iteration_limit);
        let solution = self
            .solver
            .solve(relax.as_model())
            .map_err(|e| BoundError::ExactSolve(e.to_string()))?;
        self.stats.exact_iterations += solution.iterations;
        solution
            .check_shape(relax.as_model())
            .map_err(|e| BoundError::ExactSolve(e.to_string()))?;
        match solution.status {
            LpStatus::Optimal => solution
                .objective
                .map(CertifiedBound::Finite)
                .ok_or_else(|| BoundError::ExactSolve("optimal solve without objective".into())),
            LpStatus::Infeasible => Ok(CertifiedBound::Infeasible),
            LpStatus::Unbounded => Ok(CertifiedBound::Unbounded),
            status => Err(BoundError::ExactSolve(format!("exact solve ended {status:?}"))),
        }
    }
}

fn missing_approx() -> BoundError {
    BoundError::Precondition("no approximate dual solution".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CertificateFormulation;
    use certbound_math::rational::rat;

    /// min -x - y  s.t.  x + y <= 10,  0 <= x, y <= 10
    fn box_relaxation() -> ExactRelaxation {
        let mut relax = ExactRelaxation::new();
        relax.add_column(rat(-1), Some(rat(0)), Some(rat(10)));
        relax.add_column(rat(-1), Some(rat(0)), Some(rat(10)));
        relax
            .add_row(vec![(0, rat(1)), (1, rat(1))], None, Some(rat(10)))
            .unwrap();
        relax
    }

    fn optimal_dual() -> ApproximateDualSolution {
        ApproximateDualSolution::new(vec![-1.0], vec![0.0, 0.0]).with_objective(-10.0)
    }

    #[test]
    fn test_interval_shift_first() {
        let relax = box_relaxation();
        let mut engine = BoundingEngine::new(BoundingConfig::default()).unwrap();
        let result = engine
            .compute_safe_bound(&relax, Some(&optimal_dual()), BoundRequest::lower_bound())
            .unwrap();
        assert_eq!(result.method, BoundingMethod::IntervalShift);
        assert_eq!(result.bound, CertifiedBound::Finite(rat(-10)));
        assert_eq!(engine.stats().interval_shift_calls, 1);
        assert_eq!(engine.stats().certificate_builds, 0);
    }

    #[test]
    fn test_pinned_project_shift() {
        let relax = box_relaxation();
        let config = BoundingConfig::default()
            .with_strategy(StrategyMode::Pinned(BoundingMethod::ProjectShift));
        let mut engine = BoundingEngine::new(config).unwrap();
        let result = engine
            .compute_safe_bound(&relax, Some(&optimal_dual()), BoundRequest::lower_bound())
            .unwrap();
        assert_eq!(result.method, BoundingMethod::ProjectShift);
        assert_eq!(result.bound, CertifiedBound::Finite(rat(-10)));
        assert!(engine.certificate().is_some());
        assert_eq!(engine.stats().certificate_builds, 1);
    }

    #[test]
    fn test_missing_approximation_falls_back_to_exact() {
        let relax = box_relaxation();
        let mut engine = BoundingEngine::new(BoundingConfig::default()).unwrap();
        let result = engine
            .compute_safe_bound(&relax, None, BoundRequest::lower_bound())
            .unwrap();
        assert_eq!(result.method, BoundingMethod::ExactLp);
        assert_eq!(result.bound, CertifiedBound::Finite(rat(-10)));
        assert_eq!(engine.stats().interval_shift_failures, 1);
        assert_eq!(engine.stats().project_shift_failures, 1);
        assert_eq!(engine.stats().exact_calls, 1);
        assert!(engine.stats().exact_iterations > 0);
    }

    #[test]
    fn test_ensure_certificate_is_idempotent() {
        let relax = box_relaxation();
        let mut engine = BoundingEngine::new(BoundingConfig::default()).unwrap();
        let first = engine.ensure_certificate(&relax, None).unwrap().point().cloned();
        let second = engine.ensure_certificate(&relax, None).unwrap().point().cloned();
        assert_eq!(first, second);
        assert_eq!(engine.stats().certificate_builds, 1);
    }

    #[test]
    fn test_failed_certificate_is_cached() {
        // no finite bound anywhere
        let mut relax = ExactRelaxation::new();
        relax.add_column(rat(0), None, None);
        let mut engine = BoundingEngine::new(BoundingConfig::default()).unwrap();
        assert!(engine.ensure_certificate(&relax, None).is_err());
        assert!(matches!(
            engine.ensure_certificate(&relax, None),
            Err(BoundError::CertificateUnavailable(_))
        ));
        assert_eq!(engine.stats().certificate_builds, 1);
        let plan = engine.method_plan(&BoundRequest::lower_bound(), None);
        assert_eq!(plan, vec![BoundingMethod::IntervalShift, BoundingMethod::ExactLp]);

        engine.reset_relaxation();
        assert!(matches!(engine.certificate_state(), CertificateState::Pending));
    }

    #[test]
    fn test_interleave_policies() {
        let config = BoundingConfig::default().with_interleave(InterleavePolicy::EveryNthDepth(3));
        let engine = BoundingEngine::new(config).unwrap();
        let exact_only = vec![BoundingMethod::ExactLp];
        assert_eq!(engine.method_plan(&BoundRequest::lower_bound().at_depth(6), None), exact_only);
        assert_ne!(engine.method_plan(&BoundRequest::lower_bound().at_depth(0), None), exact_only);
        assert_ne!(engine.method_plan(&BoundRequest::lower_bound().at_depth(4), None), exact_only);
        assert_ne!(
            engine.method_plan(&BoundRequest::lower_bound().at_depth(6).with_cutoff(1.0), None),
            exact_only
        );

        let config = BoundingConfig::default().with_interleave(InterleavePolicy::WhenPromising);
        let engine = BoundingEngine::new(config).unwrap();
        let approx = optimal_dual();
        // objective -10 just below the cutoff
        let request = BoundRequest::lower_bound().with_cutoff(-10.0 + 1e-9);
        assert_eq!(engine.method_plan(&request, Some(&approx)), exact_only);
        let request = BoundRequest::lower_bound().with_cutoff(-5.0);
        assert_ne!(engine.method_plan(&request, Some(&approx)), exact_only);
        let request = BoundRequest::lower_bound().with_cutoff(-10.0);
        assert_ne!(engine.method_plan(&request, Some(&approx)), exact_only);
    }

    #[test]
    fn test_clearly_prunable_node_skips_exact_solve() {
        let config = BoundingConfig::default().with_interleave(InterleavePolicy::WhenPromising);
        let engine = BoundingEngine::new(config).unwrap();
        let approx = ApproximateDualSolution::new(vec![-1.0], vec![0.0, 0.0]).with_objective(50.0);
        let request = BoundRequest::lower_bound().with_cutoff(-10.0);
        assert_eq!(
            engine.method_plan(&request, Some(&approx)),
            vec![
                BoundingMethod::IntervalShift,
                BoundingMethod::ProjectShift,
                BoundingMethod::ExactLp,
            ]
        );
    }

    #[test]
    fn test_infeasibility_requests_never_interleave() {
        let exact_only = vec![BoundingMethod::ExactLp];
        let config = BoundingConfig::default().with_interleave(InterleavePolicy::EveryNthDepth(2));
        let engine = BoundingEngine::new(config).unwrap();
        assert_eq!(
            engine.method_plan(&BoundRequest::lower_bound().at_depth(4), None),
            exact_only
        );
        assert_ne!(
            engine.method_plan(&BoundRequest::infeasibility().at_depth(4), None),
            exact_only
        );

        let config = BoundingConfig::default().with_interleave(InterleavePolicy::WhenPromising);
        let engine = BoundingEngine::new(config).unwrap();
        let approx = optimal_dual();
        let request = BoundRequest::infeasibility().with_cutoff(-10.0 + 1e-9);
        assert_ne!(engine.method_plan(&request, Some(&approx)), exact_only);
    }

    #[test]
    fn test_exact_infeasible() {
        let mut relax = ExactRelaxation::new();
        relax.add_column(rat(0), Some(rat(0)), None);
        relax.add_row(vec![(0, rat(1))], None, Some(rat(-1))).unwrap();
        let config = BoundingConfig::default()
            .with_strategy(StrategyMode::Pinned(BoundingMethod::ExactLp));
        let mut engine = BoundingEngine::new(config).unwrap();
        let result = engine
            .compute_safe_bound(&relax, None, BoundRequest::infeasibility())
            .unwrap();
        assert_eq!(result.bound, CertifiedBound::Infeasible);
        assert_eq!(engine.stats().exact_infeas_calls, 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = BoundingConfig::default().with_objective_weight(1.5);
        assert!(matches!(
            BoundingEngine::new(config),
            Err(BoundError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_reset_stats() {
        let relax = box_relaxation();
        let config = BoundingConfig::default().with_formulation(CertificateFormulation::TwoStage);
        let mut engine = BoundingEngine::new(config).unwrap();
        engine
            .compute_safe_bound(&relax, None, BoundRequest::lower_bound())
            .unwrap();
        assert!(engine.stats().method_time.contains_key(&BoundingMethod::ExactLp));
        engine.reset_stats();
        assert_eq!(engine.stats().exact_calls, 0);
        assert!(engine.stats().method_time.is_empty());
    }
}
