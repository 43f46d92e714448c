// Solving through the dual.
//
// The primal is first brought to the form
//
//   maximize c'^Tx  subject to  A'x <= b',  x >= 0
//
// by negating >= rows, splitting = rows into a pair of <= rows and negating c
// for minimization. Its dual
//
//   minimize b'^Ty  subject to  A'^Ty >= c',  y >= 0
//
// is solved with the two-phase method. At a dual optimum the reduced cost of
// the slack or surplus column of dual row j is the primal value x_j.

use std::vec::Vec;

use log::debug;
use rulinalg::vector::Vector;

use crate::config::SolverConfig;
use crate::error::Error;
use crate::problem::*;
use crate::simplex;

fn negated(row: &[f64]) -> Vec<f64> {
    row.iter().map(|v| -v).collect()
}

/// Builds the dual of `problem` as a minimization problem with one variable
/// per `<=` row of the normalized primal and one constraint per primal
/// variable. Dual rows whose right-hand side would be negative are negated.
pub fn dual_problem(problem: &Problem) -> Result<Problem, Error> {
    problem.validate()?;
    let n = problem.num_variables();
    let a = problem.constraints();
    let b = problem.rhs();
    let sign = problem.direction().sign();

    let mut rows: Vec<(Vec<f64>, f64)> = Vec::new();
    for (i, &relation) in problem.relations().iter().enumerate() {
        let row: Vec<f64> = (0..n).map(|j| a[[i, j]]).collect();
        match relation {
            Relation::LessEqual => rows.push((row, b[i])),
            Relation::GreaterEqual => rows.push((negated(&row), -b[i])),
            Relation::Equal => {
                let opposite = negated(&row);
                rows.push((row, b[i]));
                rows.push((opposite, -b[i]));
            },
        }
    }

    let objective: Vec<f64> = rows.iter().map(|&(_, rhs)| rhs).collect();
    let mut constraints = Vec::with_capacity(n);
    let mut rhs = Vec::with_capacity(n);
    let mut relations = Vec::with_capacity(n);
    for j in 0..n {
        let c_j = sign * problem.objective()[j];
        let column: Vec<f64> = rows.iter().map(|(row, _)| row[j]).collect();
        if c_j > 0.0 {
            constraints.push(column);
            rhs.push(c_j);
            relations.push(Relation::GreaterEqual);
        } else {
            constraints.push(negated(&column));
            rhs.push(-c_j);
            relations.push(Relation::LessEqual);
        }
    }

    let dual = Problem::new(objective, constraints, rhs, Some(relations))?;
    Ok(dual.with_direction(ObjectiveDirection::Minimize))
}

/// Solves `problem` by running the two-phase method on its dual.
///
/// An unbounded dual means an infeasible primal. An infeasible dual leaves
/// the primal either infeasible or unbounded, so the primal is then solved
/// directly to tell the two apart; the same happens for a primal without
/// constraints, whose dual has no variables.
pub fn solve(problem: &Problem, config: &SolverConfig) -> Result<Solution, Error> {
    config.validate()?;
    if problem.num_constraints() == 0 {
        debug!("no constraints, solving the primal directly");
        return simplex::solve(problem, config);
    }

    let dual = dual_problem(problem)?;
    debug!(
        "dual has {} variables and {} constraints",
        dual.num_variables(),
        dual.num_constraints()
    );
    let (dual_solution, tableau) = simplex::solve_with_tableau(&dual, config)?;
    let iterations = dual_solution.iterations;

    let result = match dual_solution.result {
        LPResult::Optimum { value, .. } => {
            let x: Vec<f64> = (0..problem.num_variables())
                .map(|j| match tableau.slack_column(j) {
                    Some(column) => tableau.reduced_cost(column).max(0.0),
                    None => 0.0,
                })
                .collect();
            LPResult::Optimum {
                value: problem.direction().sign() * value + 0.0,
                x: Vector::new(x),
            }
        },
        LPResult::Unbounded => LPResult::Infeasible,
        LPResult::IterationLimitExceeded => LPResult::IterationLimitExceeded,
        LPResult::Infeasible => {
            debug!("dual is infeasible, solving the primal to classify it");
            let remaining = config.with_max_iterations(config.max_iterations.saturating_sub(iterations));
            let primal = simplex::solve(problem, &remaining)?;
            return Ok(Solution {
                result: primal.result,
                iterations: iterations + primal.iterations,
            });
        },
    };
    Ok(Solution { result, iterations })
}

#[cfg(test)]
fn expect_optimum(solution: &Solution, value: f64, expected: &[f64]) {
    match solution.result {
        LPResult::Optimum { value: v, ref x } => {
            assert!((v - value).abs() < 1.0e-6, "expected value {}, got {}", value, v);
            for (i, x_i) in x.iter().enumerate() {
                assert!((x_i - expected[i]).abs() < 1.0e-6,
                        "x[{}]: expected {}, got {}", i, expected[i], x_i);
            }
        },
        ref other => panic!("Expected optimum, got {:?}", other),
    }
}

#[test]
fn build_dual() {
    let problem = Problem::new(
        vec![1.0, -2.0],
        vec![vec![1.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0]],
        vec![4.0, 1.0, 2.0],
        Some(vec![Relation::LessEqual, Relation::GreaterEqual, Relation::Equal]),
    )
    .expect("Problem should be valid");
    let dual = dual_problem(&problem).expect("Dual should be valid");

    // Normalized rows: x1 + x2 <= 4, -x1 <= -1, x2 <= 2, -x2 <= -2
    assert_eq!(dual.num_variables(), 4);
    assert_eq!(dual.num_constraints(), 2);
    assert_eq!(dual.objective().data(), &vec![4.0, -1.0, 2.0, -2.0]);
    assert_eq!(dual.constraints().data(),
               &vec![1.0, -1.0, 0.0, 0.0,
                     -1.0, 0.0, -1.0, 1.0]);
    assert_eq!(dual.rhs().data(), &vec![1.0, 2.0]);
    assert_eq!(dual.relations(), &[Relation::GreaterEqual, Relation::LessEqual]);
    assert_eq!(dual.direction(), ObjectiveDirection::Minimize);
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
fn test_solve_minimize() {
    let problem = Problem::new(
        vec![2.0, 3.0],
        vec![vec![1.0, 1.0], vec![1.0, 0.0]],
        vec![4.0, 3.0],
        Some(vec![Relation::GreaterEqual, Relation::LessEqual]),
    )
    .expect("Problem should be valid")
    .with_direction(ObjectiveDirection::Minimize);
    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    expect_optimum(&solution, 9.0, &[3.0, 1.0]);
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
}

#[test]
fn test_solve_unbounded() {
    let problem = Problem::new(vec![1.0, 0.0], vec![vec![0.0, 1.0]], vec![3.0], None)
        .expect("Problem should be valid");
    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    assert_eq!(solution.result, LPResult::Unbounded);

    let problem = Problem::new(vec![1.0], vec![], vec![], None)
        .expect("Problem should be valid");
    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    assert_eq!(solution.result, LPResult::Unbounded);
}

#[test]
fn test_solve_negative_rhs() {
    // Every point with x2 = x1 + 3 and x1 <= 10 is optimal.
    let problem = Problem::new(
        vec![-1.0, 1.0],
        vec![vec![1.0, -1.0], vec![1.0, 0.0]],
        vec![-3.0, 10.0],
        Some(vec![Relation::GreaterEqual, Relation::LessEqual]),
    )
    .expect("Problem should be valid");
    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    assert!((solution.optimal_value().expect("Expected optimum") - 3.0).abs() < 1e-6);
    let x = solution.variables().expect("Expected optimum");
    assert!(problem.is_feasible(x, 1e-6));
    assert!((problem.objective_value(x) - 3.0).abs() < 1e-6);

    let problem = Problem::new(vec![1.0], vec![vec![1.0]], vec![-1.0], None)
        .expect("Problem should be valid");
    let solution = solve(&problem, &SolverConfig::default())
        .expect("Solve should not fail");
    assert_eq!(solution.result, LPResult::Infeasible);
}
