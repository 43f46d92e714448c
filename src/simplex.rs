// Two-phase tableau simplex.
//
// Phase one minimizes the sum of the artificial variables. A positive
// minimum proves infeasibility; otherwise the artificial columns are dropped
// and phase two minimizes the negated (maximized) objective from the basis
// phase one left behind.

use std::vec::Vec;

use log::debug;
use rulinalg::vector::Vector;

use crate::config::SolverConfig;
use crate::error::Error;
use crate::problem::*;
use crate::tableau::{PivotChoice, Tableau};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhaseResult {
    Optimal,
    Unbounded,
    IterationLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feasibility {
    Feasible,
    Infeasible,
    IterationLimit,
}

// Pivots until the objective row is optimal, counting pivots into
// `iterations`. The cap is checked only when another pivot is needed.
fn optimize(
    tableau: &mut Tableau,
    config: &SolverConfig,
    iterations: &mut usize,
) -> Result<PhaseResult, Error> {
    loop {
        match tableau.select_pivot(config.pivot_tolerance) {
            PivotChoice::Optimal => return Ok(PhaseResult::Optimal),
            PivotChoice::Unbounded { column } => {
                debug!("column {} has no limiting row", column);
                return Ok(PhaseResult::Unbounded);
            },
            PivotChoice::Pivot { row, column } => {
                if *iterations >= config.max_iterations {
                    return Ok(PhaseResult::IterationLimit);
                }
                tableau.pivot(row, column, config.pivot_tolerance)?;
                *iterations += 1;
            },
        }
    }
}

fn phase_one(
    tableau: &mut Tableau,
    config: &SolverConfig,
    iterations: &mut usize,
) -> Result<Feasibility, Error> {
    if tableau.num_artificial() == 0 {
        debug!("phase one skipped, initial basis is feasible");
        return Ok(Feasibility::Feasible);
    }

    let costs: Vec<f64> = (0..tableau.columns())
        .map(|j| if tableau.is_artificial(j) { 1.0 } else { 0.0 })
        .collect();
    tableau.set_objective(&costs);
    debug!(
        "phase one: {} artificial variables, initial infeasibility {}",
        tableau.num_artificial(),
        tableau.objective_value()
    );

    match optimize(tableau, config, iterations)? {
        PhaseResult::Optimal => {},
        PhaseResult::Unbounded => return Err(Error::UnboundedPhaseOne),
        PhaseResult::IterationLimit => return Ok(Feasibility::IterationLimit),
    }

    let infeasibility = tableau.objective_value();
    if infeasibility > config.feasibility_tolerance {
        debug!("phase one ended with infeasibility {}", infeasibility);
        return Ok(Feasibility::Infeasible);
    }

    // Pivots that remove artificial variables count against the cap too.
    let pending = tableau.pending_removals(config.pivot_tolerance);
    if *iterations + pending > config.max_iterations {
        debug!("{} pivots needed to remove artificial variables exceed the cap", pending);
        return Ok(Feasibility::IterationLimit);
    }
    let pivots = tableau.remove_artificials(config.pivot_tolerance)?;
    debug!(
        "phase one done after {} pivots, {} needed to remove artificial variables",
        *iterations, pivots
    );
    *iterations += pivots;
    Ok(Feasibility::Feasible)
}

fn phase_two(
    tableau: &mut Tableau,
    problem: &Problem,
    config: &SolverConfig,
    iterations: &mut usize,
) -> Result<LPResult, Error> {
    // The tableau minimizes, so a maximized objective enters negated.
    let sign = problem.direction().sign();
    let costs: Vec<f64> = problem.objective().iter().map(|&c| -sign * c).collect();
    tableau.set_objective(&costs);

    let result = match optimize(tableau, config, iterations)? {
        PhaseResult::Optimal => {
            let x = tableau.extract(problem.num_variables(), config.pivot_tolerance);
            // Adding zero turns a negative zero into a positive one.
            let value = -sign * tableau.objective_value() + 0.0;
            LPResult::Optimum {
                value,
                x: Vector::new(x),
            }
        },
        PhaseResult::Unbounded => LPResult::Unbounded,
        PhaseResult::IterationLimit => LPResult::IterationLimitExceeded,
    };
    Ok(result)
}

// Runs both phases and hands back the final tableau alongside the solution.
pub(crate) fn solve_with_tableau(
    problem: &Problem,
    config: &SolverConfig,
) -> Result<(Solution, Tableau), Error> {
    config.validate()?;
    let mut tableau = Tableau::build(problem)?;
    let mut iterations = 0;
    debug!(
        "solving {} x {} problem, tableau has {} columns",
        problem.num_constraints(),
        problem.num_variables(),
        tableau.columns()
    );

    let result = match phase_one(&mut tableau, config, &mut iterations)? {
        Feasibility::Infeasible => LPResult::Infeasible,
        Feasibility::IterationLimit => LPResult::IterationLimitExceeded,
        Feasibility::Feasible => phase_two(&mut tableau, problem, config, &mut iterations)?,
    };

    let solution = Solution { result, iterations };
    debug!("finished with status {} after {} pivots", solution.status(), iterations);
    Ok((solution, tableau))
}

/// Solves `problem` with the two-phase simplex method.
///
/// Infeasible, unbounded and iteration-capped problems are reported through
/// `Solution::result`; an `Err` means the input was malformed or the engine
/// hit an internal inconsistency.
pub fn solve(problem: &Problem, config: &SolverConfig) -> Result<Solution, Error> {
    solve_with_tableau(problem, config).map(|(solution, _)| solution)
}

#[cfg(test)]
use crate::builder::{Constraint, Objective, ProblemBuilder};

#[cfg(test)]
fn expect_optimum(solution: &Solution, value: f64, expected: &[f64]) {
    match solution.result {
        LPResult::Optimum { value: v, ref x } => {
            assert!((v - value).abs() < 1.0e-6, "expected value {}, got {}", value, v);
            assert_eq!(x.size(), expected.len());
            for (i, x_i) in x.iter().enumerate() {
                assert!((x_i - expected[i]).abs() < 1.0e-6,
                        "x[{}]: expected {}, got {}", i, expected[i], x_i);
            }
        },
        ref other => panic!("Expected optimum, got {:?}", other),
    }
}

#[test]
fn test_solve() {
    let problem = Problem::new(
        vec![3.0, 5.0],
        vec![vec![1.0, 0.0], vec![0.0, 2.0], vec![3.0, 2.0]],
        vec![4.0, 12.0, 18.0],
        None,
    )
    .expect("Problem should be valid");
    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    expect_optimum(&solution, 36.0, &[2.0, 6.0]);
    assert_eq!(solution.iterations, 2);
    assert_eq!(solution.status(), Status::Optimal);
}

#[test]
fn test_solve_twice() {
    let problem = Problem::new(
        vec![2.0, 3.0, 4.0],
        vec![vec![3.0, 2.0, 1.0], vec![2.0, 5.0, 3.0]],
        vec![10.0, 15.0],
        Some(vec![Relation::LessEqual, Relation::GreaterEqual]),
    )
    .expect("Problem should be valid");
    let config = SolverConfig::default();
    let first = solve(&problem, &config).expect("Solve should not fail");
    let second = solve(&problem, &config).expect("Solve should not fail");
    assert_eq!(first, second);
}

#[test]
fn test_solve_infeasible() {
    let problem = Problem::new(
        vec![1.0],
        vec![vec![1.0], vec![1.0]],
        vec![5.0, 2.0],
        Some(vec![Relation::GreaterEqual, Relation::LessEqual]),
    )
    .expect("Problem should be valid");
    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    assert_eq!(solution.result, LPResult::Infeasible);
    assert_eq!(solution.iterations, 1);
    assert_eq!(solution.optimal_value(), None);
    assert_eq!(solution.variables(), None);
}

#[test]
fn test_solve_infeasible_equalities() {
    let problem = Problem::new(
        vec![1.0, 1.0, 1.0],
        vec![vec![1.0, 1.0, 0.0], vec![0.0, -1.0, 1.0], vec![1.0, 0.0, 1.0]],
        vec![5.0, 10.0, 12.0],
        Some(vec![Relation::Equal, Relation::Equal, Relation::Equal]),
    )
    .expect("Problem should be valid");
    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    assert_eq!(solution.result, LPResult::Infeasible);
}

#[test]
fn test_solve_unbounded() {
    let problem = Problem::new(vec![1.0, 0.0], vec![vec![0.0, 1.0]], vec![3.0], None)
        .expect("Problem should be valid");
    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    assert_eq!(solution.result, LPResult::Unbounded);
    assert_eq!(solution.status(), Status::Unbounded);
}

#[test]
fn test_solve_without_constraints() {
    let problem = Problem::new(vec![1.0], vec![], vec![], None)
        .expect("Problem should be valid");
    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    assert_eq!(solution.result, LPResult::Unbounded);
    assert_eq!(solution.iterations, 0);

    let problem = Problem::new(vec![-1.0, 0.0], vec![], vec![], None)
        .expect("Problem should be valid");
    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    expect_optimum(&solution, 0.0, &[0.0, 0.0]);
}

#[test]
fn test_solve_equality() {
    let problem = Problem::new(
        vec![2.0, 3.0],
        vec![vec![1.0, 1.0], vec![1.0, 2.0]],
        vec![5.0, 8.0],
        Some(vec![Relation::Equal, Relation::LessEqual]),
    )
    .expect("Problem should be valid");
    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    expect_optimum(&solution, 13.0, &[2.0, 3.0]);
}

#[test]
fn test_solve_greater_equal() {
    let problem = Problem::new(
        vec![1.0, 1.0],
        vec![vec![1.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0]],
        vec![2.0, 3.0, 4.0],
        Some(vec![Relation::GreaterEqual, Relation::LessEqual, Relation::LessEqual]),
    )
    .expect("Problem should be valid");
    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    expect_optimum(&solution, 7.0, &[3.0, 4.0]);
}

#[test]
fn test_solve_minimize() {
    let mut builder = ProblemBuilder::new();
    let x1 = builder.new_variable();
    let x2 = builder.new_variable();
    builder.add_constraint(Constraint::new()
        .add(x1, 1.0)
        .add(x2, 1.0)
        .value(Relation::GreaterEqual, 4.0));
    builder.add_constraint(Constraint::new()
        .add(x1, 1.0)
        .value(Relation::LessEqual, 3.0));
    builder.set_objective(Objective::new()
        .add(x1, 2.0)
        .add(x2, 3.0)
        .direction(ObjectiveDirection::Minimize));
    let problem = builder.build().expect("Problem should be valid");

    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    expect_optimum(&solution, 9.0, &[3.0, 1.0]);
}

#[test]
fn test_solve_redundant_equalities() {
    let problem = Problem::new(
        vec![1.0, 2.0],
        vec![vec![1.0, 1.0], vec![2.0, 2.0]],
        vec![2.0, 4.0],
        Some(vec![Relation::Equal, Relation::Equal]),
    )
    .expect("Problem should be valid");
    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    expect_optimum(&solution, 4.0, &[0.0, 2.0]);
    assert_eq!(solution.iterations, 2);
}

#[test]
fn test_solve_degenerate() {
    let problem = Problem::new(
        vec![1.0, 1.0],
        vec![vec![1.0, 1.0], vec![1.0, 0.0]],
        vec![4.0, 0.0],
        None,
    )
    .expect("Problem should be valid");
    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    expect_optimum(&solution, 4.0, &[0.0, 4.0]);
    assert_eq!(solution.iterations, 2);
}

#[test]
fn test_solve_cycling_candidate_terminates() {
    // Degenerate at the origin; known to cycle under the largest-coefficient
    // rule with some tie-breaks.
    let problem = Problem::new(
        vec![10.0, -57.0, -9.0, -24.0],
        vec![
            vec![0.5, -5.5, -2.5, 9.0],
            vec![0.5, -1.5, -0.5, 1.0],
            vec![1.0, 0.0, 0.0, 0.0],
        ],
        vec![0.0, 0.0, 1.0],
        None,
    )
    .expect("Problem should be valid");
    let config = SolverConfig::default().with_max_iterations(100);
    let solution = solve(&problem, &config).expect("Solve should not fail");
    assert!(solution.iterations <= 100);
    match solution.result {
        LPResult::Optimum { value, .. } => assert!((value - 1.0).abs() < 1e-6),
        LPResult::IterationLimitExceeded => {},
        ref other => panic!("Expected optimum or iteration limit, got {:?}", other),
    }
}

#[test]
fn test_iteration_limit() {
    let problem = Problem::new(
        vec![3.0, 5.0],
        vec![vec![1.0, 0.0], vec![0.0, 2.0], vec![3.0, 2.0]],
        vec![4.0, 12.0, 18.0],
        None,
    )
    .expect("Problem should be valid");
    let config = SolverConfig::default().with_max_iterations(1);
    let solution = solve(&problem, &config).expect("Solve should not fail");
    assert_eq!(solution.result, LPResult::IterationLimitExceeded);
    assert_eq!(solution.iterations, 1);

    // A start that is already optimal needs no pivots at all.
    let problem = Problem::new(vec![-1.0, -1.0], vec![vec![1.0, 1.0]], vec![1.0], None)
        .expect("Problem should be valid");
    let config = SolverConfig::default().with_max_iterations(0);
    let solution = solve(&problem, &config).expect("Solve should not fail");
    expect_optimum(&solution, 0.0, &[0.0, 0.0]);
}

#[test]
fn test_solve_negative_rhs() {
    // x1 - x2 >= -3 is solved as -x1 + x2 <= 3.
    let problem = Problem::new(
        vec![-1.0, 1.0],
        vec![vec![1.0, -1.0], vec![1.0, 0.0]],
        vec![-3.0, 10.0],
        Some(vec![Relation::GreaterEqual, Relation::LessEqual]),
    )
    .expect("Problem should be valid");
    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    expect_optimum(&solution, 3.0, &[0.0, 3.0]);
    assert_eq!(solution.iterations, 1);

    let problem = Problem::new(
        vec![-1.0, -1.0],
        vec![vec![1.0, -1.0]],
        vec![-2.0],
        Some(vec![Relation::Equal]),
    )
    .expect("Problem should be valid");
    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    expect_optimum(&solution, -2.0, &[0.0, 2.0]);

    // -x1 <= -2 needs phase one, x1 <= -1 cannot hold for x1 >= 0.
    let problem = Problem::new(vec![-1.0], vec![vec![-1.0]], vec![-2.0], None)
        .expect("Problem should be valid");
    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    expect_optimum(&solution, -2.0, &[2.0]);

    let problem = Problem::new(vec![1.0], vec![vec![1.0]], vec![-1.0], None)
        .expect("Problem should be valid");
    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    assert_eq!(solution.result, LPResult::Infeasible);
    assert_eq!(solution.iterations, 0);
}

#[test]
fn test_iteration_limit_covers_artificial_removal() {
    // Phase one is optimal at the start, leaving the artificial of
    // -x1 - x2 = 0 basic at zero. Removing it takes one pivot.
    let problem = Problem::new(
        vec![1.0, 1.0],
        vec![vec![-1.0, -1.0], vec![1.0, 0.0]],
        vec![0.0, 3.0],
        Some(vec![Relation::Equal, Relation::LessEqual]),
    )
    .expect("Problem should be valid");
    let config = SolverConfig::default().with_max_iterations(0);
    let solution = solve(&problem, &config).expect("Solve should not fail");
    assert_eq!(solution.result, LPResult::IterationLimitExceeded);
    assert_eq!(solution.iterations, 0);

    let config = SolverConfig::default().with_max_iterations(1);
    let solution = solve(&problem, &config).expect("Solve should not fail");
    expect_optimum(&solution, 0.0, &[0.0, 0.0]);
    assert_eq!(solution.iterations, 1);
}

#[test]
fn test_iteration_limit_in_phase_one() {
    let problem = Problem::new(
        vec![1.0, 1.0],
        vec![vec![1.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0]],
        vec![2.0, 3.0, 4.0],
        Some(vec![Relation::GreaterEqual, Relation::LessEqual, Relation::LessEqual]),
    )
    .expect("Problem should be valid");
    let config = SolverConfig::default().with_max_iterations(0);
    let solution = solve(&problem, &config).expect("Solve should not fail");
    assert_eq!(solution.result, LPResult::IterationLimitExceeded);
    assert_eq!(solution.iterations, 0);
}

#[test]
fn test_invalid_config() {
    let problem = Problem::new(vec![1.0], vec![vec![1.0]], vec![1.0], None)
        .expect("Problem should be valid");
    let config = SolverConfig {
        pivot_tolerance: -1.0,
        ..SolverConfig::default()
    };
    assert!(matches!(solve(&problem, &config), Err(Error::InvalidConfig(_))));
}
