//! # Exact Linear Programming Example
//!
//! This example solves a small LP with the rational simplex and prints the
//! exact optimum, primal values and row duals.
//! It covers:
//! - Building a general-form model
//! - Reading duals in the `c - A^T y` convention
//! - Enclosing an exact value in a float interval
//!
//! ## See Also
//! - [`RationalSimplex`](certbound_math::lp::RationalSimplex)
//! - [`Interval`](certbound_math::Interval)

use certbound_math::Interval;
use certbound_math::lp::{ExactLpSolver, LpModel, ObjectiveSense, RationalSimplex};
use certbound_math::rational::rat;

fn main() {
    println!("=== CertBound Math: Exact Linear Programming ===\n");

    // maximize x + y  s.t.  x + 2y <= 4, 2x + y <= 3, x, y >= 0
    let mut model = LpModel::new(ObjectiveSense::Maximize);
    let x = model.add_column(rat(1), Some(rat(0)), None);
    let y = model.add_column(rat(1), Some(rat(0)), None);
    model.add_row(vec![(x, rat(1)), (y, rat(2))], None, Some(rat(4)));
    model.add_row(vec![(x, rat(2)), (y, rat(1))], None, Some(rat(3)));

    let mut simplex = RationalSimplex::default();
    let solution = match simplex.solve(&model) {
        Ok(solution) => solution,
        Err(e) => {
            eprintln!("solve failed: {e}");
            return;
        }
    };

    println!("status:    {:?}", solution.status);
    if let Some(objective) = &solution.objective {
        println!("objective: {objective}");
        let enclosure = Interval::enclose(objective);
        println!("enclosure: [{}, {}]", enclosure.inf, enclosure.sup);
    }
    for (j, value) in solution.primal.iter().enumerate() {
        println!("x{j} = {value}");
    }
    for (i, dual) in solution.row_duals.iter().enumerate() {
        println!("y{i} = {dual}");
    }
    println!("iterations: {}", solution.iterations);
}
