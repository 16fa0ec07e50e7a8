//! # Certified Bound Example
//!
//! This example certifies a lower bound from a slightly wrong floating dual.
//! It covers:
//! - Building an exact relaxation
//! - Running each bounding method on the same node
//! - Reading the engine statistics
//!
//! Run with `RUST_LOG=debug` to see method choices and fallthroughs.

use certbound::{
    ApproximateDualSolution, BoundRequest, BoundingConfig, BoundingEngine, BoundingMethod,
    ExactRelaxation, StrategyMode,
};
use certbound_math::rational::rat;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== CertBound: Safe Dual Bounds ===\n");

    // minimize -x - y  s.t.  x + y <= 10,  0 <= x, y <= 10
    let mut relax = ExactRelaxation::new();
    relax.add_column(rat(-1), Some(rat(0)), Some(rat(10)));
    relax.add_column(rat(-1), Some(rat(0)), Some(rat(10)));
    if let Err(e) = relax.add_row(vec![(0, rat(1)), (1, rat(1))], None, Some(rat(10))) {
        eprintln!("bad row: {e}");
        return;
    }

    // the floating solver is off in the seventh digit
    let approx = ApproximateDualSolution::new(vec![-1.000_000_1], vec![0.0, 0.0]);

    for method in [
        BoundingMethod::IntervalShift,
        BoundingMethod::ProjectShift,
        BoundingMethod::ExactLp,
    ] {
        let config = BoundingConfig::default().with_strategy(StrategyMode::Pinned(method));
        let mut engine = match BoundingEngine::new(config) {
            Ok(engine) => engine,
            Err(e) => {
                eprintln!("config rejected: {e}");
                return;
            }
        };
        match engine.compute_safe_bound(&relax, Some(&approx), BoundRequest::lower_bound()) {
            Ok(safe) => println!(
                "{method:?}: bound {} (as f64 {}) via {:?}",
                safe.bound,
                safe.bound.to_f64_down(),
                safe.method
            ),
            Err(e) => println!("{method:?}: {e}"),
        }
        let stats = engine.stats();
        println!(
            "  certificate builds: {}, exact iterations: {}",
            stats.certificate_builds, stats.exact_iterations
        );
    }
}
