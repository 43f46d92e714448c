use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::problem::{Problem, Relation};

// Generate a random dense LP problem with the specified size and seed.
// For use in benchmarks and randomized tests.
//
// Every row is built around a hidden point x0 > 0 so the problem is always
// feasible, and a final row bounding the sum of the variables keeps it
// bounded. Right-hand sides are never negative.
pub fn dense_seeded(rows: usize, cols: usize, seed: u64) -> Problem {
    assert!(cols > 0);
    let mut rng = StdRng::seed_from_u64(seed);

    let x0: Vec<f64> = (0..cols).map(|_| rng.gen_range(0.5..2.0)).collect();

    let mut constraints = Vec::with_capacity(rows + 1);
    let mut rhs = Vec::with_capacity(rows + 1);
    let mut relations = Vec::with_capacity(rows + 1);
    for _ in 0..rows {
        let mut row: Vec<f64> = (0..cols).map(|_| rng.gen_range(-3.0..3.0)).collect();
        let mut activity: f64 = row.iter().zip(&x0).map(|(a, x)| a * x).sum();
        if activity < 0.0 {
            for v in row.iter_mut() {
                *v = -*v;
            }
            activity = -activity;
        }
        let (relation, b) = match rng.gen_range(0..3) {
            0 => (Relation::LessEqual, activity + rng.gen_range(0.0..2.0)),
            1 => (Relation::GreaterEqual, activity * rng.gen_range(0.0..1.0)),
            _ => (Relation::Equal, activity),
        };
        constraints.push(row);
        rhs.push(b);
        relations.push(relation);
    }

    constraints.push(vec![1.0; cols]);
    rhs.push(x0.iter().sum::<f64>() + 10.0);
    relations.push(Relation::LessEqual);

    let objective: Vec<f64> = (0..cols).map(|_| rng.gen_range(-1.0..2.0)).collect();

    // The shapes agree by construction.
    match Problem::new(objective, constraints, rhs, Some(relations)) {
        Ok(problem) => problem,
        Err(err) => panic!("generated an invalid problem: {}", err),
    }
}

/// The hidden feasible point of `dense_seeded(_, cols, seed)`.
pub fn feasible_point(cols: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..cols).map(|_| rng.gen_range(0.5..2.0)).collect()
}
