#![cfg(test)]

use crate::bench_util::{dense_seeded, feasible_point};
use crate::config::SolverConfig;
use crate::method::Method;
use crate::problem::{LPResult, Problem, Solution};

const SIZES: [(usize, usize); 4] = [(2, 3), (4, 4), (5, 8), (8, 10)];
const SEEDS: [u64; 6] = [13, 37, 58, 23, 1, 2024];

fn optimum(solution: &Solution) -> (f64, Vec<f64>) {
    match solution.result {
        LPResult::Optimum { value, ref x } => (value, x.data().clone()),
        ref other => panic!("Expected optimum on a feasible bounded problem, got {:?}", other),
    }
}

fn check_optimum(problem: &Problem, value: f64, x: &[f64]) {
    let scale = 1.0 + value.abs();
    assert_eq!(x.len(), problem.num_variables());
    assert!(x.iter().all(|&v| v >= 0.0), "negative variable in {:?}", x);
    assert!(problem.is_feasible(x, 1e-6), "infeasible solution {:?}", x);
    assert!((problem.objective_value(x) - value).abs() < 1e-6 * scale,
            "objective {} does not reproduce value {}", problem.objective_value(x), value);
}

#[test]
fn two_phase_solutions_are_feasible() {
    let config = SolverConfig::default();
    for &(rows, cols) in SIZES.iter() {
        for &seed in SEEDS.iter() {
            let problem = dense_seeded(rows, cols, seed);
            let solution = Method::TwoPhase.solve(&problem, &config)
                .expect("Simplex test failed");
            let (value, x) = optimum(&solution);
            check_optimum(&problem, value, &x);

            // The hidden point is feasible, so the optimum is at least as good.
            let x0 = feasible_point(cols, seed);
            assert!(problem.is_feasible(&x0, 1e-9));
            assert!(value >= problem.objective_value(&x0) - 1e-6);
        }
    }
}

#[test]
fn dual_matches_two_phase() {
    let config = SolverConfig::default();
    for &(rows, cols) in SIZES.iter() {
        for &seed in SEEDS.iter() {
            let problem = dense_seeded(rows, cols, seed);
            let primal = Method::TwoPhase.solve(&problem, &config)
                .expect("Simplex test failed");
            let dual = Method::Dual.solve(&problem, &config)
                .expect("Dual test failed");
            let (primal_value, _) = optimum(&primal);
            let (dual_value, x) = optimum(&dual);
            assert!((primal_value - dual_value).abs() < 1e-6 * (1.0 + primal_value.abs()),
                    "{}x{} seed {}: primal {} vs dual {}",
                    rows, cols, seed, primal_value, dual_value);
            check_optimum(&problem, dual_value, &x);
        }
    }
}

#[test]
fn solving_is_deterministic() {
    let config = SolverConfig::default();
    for &seed in SEEDS.iter() {
        let problem = dense_seeded(5, 8, seed);
        for method in [Method::TwoPhase, Method::Dual].iter() {
            let first = method.solve(&problem, &config).expect("Solve should not fail");
            let second = method.solve(&problem, &config).expect("Solve should not fail");
            assert_eq!(first, second);
        }
    }
}

#[test]
fn iteration_cap_is_respected() {
    for &seed in SEEDS.iter() {
        let problem = dense_seeded(8, 10, seed);
        let full = Method::TwoPhase.solve(&problem, &SolverConfig::default())
            .expect("Solve should not fail");
        assert!(full.iterations > 0);

        let config = SolverConfig::default().with_max_iterations(0);
        let capped = Method::TwoPhase.solve(&problem, &config)
            .expect("Solve should not fail");
        assert_eq!(capped.result, LPResult::IterationLimitExceeded);
        assert_eq!(capped.iterations, 0);

        let cap = full.iterations / 2;
        let config = SolverConfig::default().with_max_iterations(cap);
        let capped = Method::TwoPhase.solve(&problem, &config)
            .expect("Solve should not fail");
        assert_eq!(capped.result, LPResult::IterationLimitExceeded, "seed {}", seed);
        // Artificial removal needs all its pivots at once, so it may stop short.
        assert!(capped.iterations <= cap, "seed {}: {} pivots over a cap of {}",
                seed, capped.iterations, cap);
    }
}
