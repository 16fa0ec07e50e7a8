//! Configuration of the bounding engine.

use serde::{Deserialize, Serialize};

use crate::error::{BoundError, BoundResult};

/// Which extended-dual coordinates take part in certification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DualColumnSelection {
    /// Every coordinate paired with a finite bound
    #[default]
    AllFinite,
    /// Finite bounds that are tight at an exact root LP solution
    ActiveExactRoot,
    /// Finite bounds that are tight (within tolerance) at the floating root solution
    ActiveApproxRoot,
}

/// Auxiliary LP used to compute the interior certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CertificateFormulation {
    /// Weighted mix of interiorness and objective in one LP
    #[default]
    Optimized,
    /// Interiorness only, recovered from the duals of the transposed LP
    Arbitrary,
    /// Interiorness only, stated directly over the dual variables
    ArbitraryDual,
    /// Interiorness first, then the objective with interiorness kept as a floor
    TwoStage,
}

/// Which interior certificate corrects a lower-bound dual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CertificatePreference {
    /// Interior point (bounded shift, better bounds)
    #[default]
    Point,
    /// Interior ray (unbounded shift)
    Ray,
    /// Point when available, ray otherwise
    Either,
}

/// A method able to produce a certified bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundingMethod {
    /// Neumaier-Shcherbina shift with interval arithmetic
    IntervalShift,
    /// Projection onto the dual equality and shift toward an interior certificate
    ProjectShift,
    /// Exact rational LP solve
    ExactLp,
}

/// How methods are chosen per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrategyMode {
    /// Interval shift, then project-and-shift, then the exact solver
    #[default]
    Automatic,
    /// Always try this method first; the exact solver remains the fallback
    Pinned(BoundingMethod),
}

/// When a lower-bound request replaces the safe methods by an exact solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterleavePolicy {
    /// Never
    #[default]
    Never,
    /// When the floating objective is within tolerance below the cutoff bound
    WhenPromising,
    /// At every depth divisible by the value while no cutoff bound is known
    EveryNthDepth(u32),
}

/// Configuration for certified bounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundingConfig {
    /// Dual column selection policy
    pub selection: DualColumnSelection,
    /// Interior certificate formulation
    pub formulation: CertificateFormulation,
    /// Certificate used for lower bounds
    pub preference: CertificatePreference,
    /// Method selection mode
    pub strategy: StrategyMode,
    /// Weight of the true objective in the optimized formulation, in `[0, 1)`
    pub objective_weight: f64,
    /// Upper bound on the common slack of interior points
    pub big_m: i64,
    /// Tolerance for activity tests and near-zero multipliers
    pub feasibility_tolerance: f64,
    /// Iteration limit of the exact root solve used for column selection
    pub root_iteration_limit: Option<usize>,
    /// Iteration limit handed to the exact fallback solve
    pub exact_iteration_limit: Option<usize>,
    /// Interleaving of exact solves in automatic mode
    pub interleave: InterleavePolicy,
}

impl Default for BoundingConfig {
    fn default() -> Self {
        Self {
            selection: DualColumnSelection::AllFinite,
            formulation: CertificateFormulation::Optimized,
            preference: CertificatePreference::Point,
            strategy: StrategyMode::Automatic,
            objective_weight: 0.0,
            big_m: 100,
            feasibility_tolerance: 1e-6,
            root_iteration_limit: Some(100),
            exact_iteration_limit: None,
            interleave: InterleavePolicy::Never,
        }
    }
}

impl BoundingConfig {
    /// Set the dual column selection policy
    #[must_use]
    pub fn with_selection(mut self, selection: DualColumnSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Set the certificate formulation
    #[must_use]
    pub fn with_formulation(mut self, formulation: CertificateFormulation) -> Self {
        self.formulation = formulation;
        self
    }

    /// Set the certificate preference
    #[must_use]
    pub fn with_preference(mut self, preference: CertificatePreference) -> Self {
        self.preference = preference;
        self
    }

    /// Set the strategy mode
    #[must_use]
    pub fn with_strategy(mut self, strategy: StrategyMode) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the objective weight of the optimized formulation
    #[must_use]
    pub fn with_objective_weight(mut self, weight: f64) -> Self {
        self.objective_weight = weight;
        self
    }

    /// Set the exact fallback iteration limit
    #[must_use]
    pub fn with_exact_iteration_limit(mut self, limit: Option<usize>) -> Self {
        self.exact_iteration_limit = limit;
        self
    }

    /// Set the interleave policy
    #[must_use]
    pub fn with_interleave(mut self, interleave: InterleavePolicy) -> Self {
        self.interleave = interleave;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> BoundResult<()> {
        if !(0.0..1.0).contains(&self.objective_weight) {
            return Err(BoundError::InvalidConfig(format!(
                "objective_weight must lie in [0, 1), got {}",
                self.objective_weight
            )));
        }
        if self.big_m <= 0 {
            return Err(BoundError::InvalidConfig(format!(
                "big_m must be positive, got {}",
                self.big_m
            )));
        }
        if !(self.feasibility_tolerance >= 0.0 && self.feasibility_tolerance.is_finite()) {
            return Err(BoundError::InvalidConfig(format!(
                "feasibility_tolerance must be finite and nonnegative, got {}",
                self.feasibility_tolerance
            )));
        }
        if self.interleave == InterleavePolicy::EveryNthDepth(0) {
            return Err(BoundError::InvalidConfig(
                "interleave depth frequency must be positive".into(),
            ));
        }
        Ok(())
    }
}
