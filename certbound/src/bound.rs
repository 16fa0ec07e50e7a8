//! Bound requests and certified results.

use std::fmt;

use certbound_math::rational::to_f64_down;
use num_rational::BigRational;
use serde::{Deserialize, Serialize};

/// What a bound computation has to prove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundPurpose {
    /// A lower bound on the relaxation optimum from dual values
    LowerBound,
    /// Infeasibility of the relaxation from a Farkas ray
    Infeasibility,
}

/// One bound computation request at a search node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundRequest {
    /// What to prove
    pub purpose: BoundPurpose,
    /// Depth of the node in the search tree
    pub depth: u32,
    /// Current cutoff bound, if an incumbent exists
    pub cutoff_bound: Option<f64>,
}

impl BoundRequest {
    /// Lower-bound request at the root.
    pub fn lower_bound() -> Self {
        Self {
            purpose: BoundPurpose::LowerBound,
            depth: 0,
            cutoff_bound: None,
        }
    }

    /// Infeasibility request at the root.
    pub fn infeasibility() -> Self {
        Self {
            purpose: BoundPurpose::Infeasibility,
            depth: 0,
            cutoff_bound: None,
        }
    }

    /// Set the node depth.
    pub fn at_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Set the cutoff bound.
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff_bound = Some(cutoff);
        self
    }
}

/// A bound that holds independently of floating-point rounding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertifiedBound {
    /// The relaxation optimum is at least this value
    Finite(BigRational),
    /// The relaxation is infeasible (bound `+inf`)
    Infeasible,
    /// The relaxation is unbounded (bound `-inf`)
    Unbounded,
}

impl CertifiedBound {
    /// The bound as a float, rounded toward minus infinity.
    pub fn to_f64_down(&self) -> f64 {
        match self {
            CertifiedBound::Finite(value) => to_f64_down(value),
            CertifiedBound::Infeasible => f64::INFINITY,
            CertifiedBound::Unbounded => f64::NEG_INFINITY,
        }
    }

    /// Whether this proves infeasibility.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, CertifiedBound::Infeasible)
    }

    /// The finite value, if any.
    pub fn value(&self) -> Option<&BigRational> {
        match self {
            CertifiedBound::Finite(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for CertifiedBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertifiedBound::Finite(value) => write!(f, "{value}"),
            CertifiedBound::Infeasible => write!(f, "+inf (infeasible)"),
            CertifiedBound::Unbounded => write!(f, "-inf"),
        }
    }
}
