// Dense simplex tableau.
//
// Layout of the matrix, for m constraint rows:
//
//   rows 0..m        constraint rows, row i has basic variable basis[i]
//   row m            objective row of reduced costs; the last cell holds -z
//
//   columns 0..n                         structural variables
//   columns n..n+s                       slack (<=) and surplus (>=) variables
//   columns n+s..n+s+a                   artificial variables (>= and =)
//   last column                          right-hand side
//
// The objective row is always minimized; it is optimal once no reduced cost
// is below -tolerance.

use rulinalg::matrix::{BaseMatrix, Matrix};
use log::trace;

use crate::error::Error;
use crate::problem::{Problem, Relation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotChoice {
    Optimal,
    Unbounded { column: usize },
    Pivot { row: usize, column: usize },
}

#[derive(Debug, Clone)]
pub struct Tableau {
    matrix: Matrix<f64>,
    basis: Vec<usize>,
    num_structural: usize,
    num_slack: usize,
    num_artificial: usize,
    // Slack or surplus column of every input constraint, None for `=`.
    slack_columns: Vec<Option<usize>>,
}

impl Tableau {
    /// Builds the augmented tableau with a zero objective row.
    ///
    /// A row with a negative right-hand side is negated first, which turns
    /// `<=` into `>=` and back, so the right-hand side column starts out
    /// non-negative. Every `<=` row then starts with its slack column in the
    /// basis, every `>=` or `=` row with its artificial column.
    pub fn build(problem: &Problem) -> Result<Tableau, Error> {
        problem.validate()?;
        let n = problem.num_variables();
        let m = problem.num_constraints();
        let a = problem.constraints();
        let b = problem.rhs();
        let relations: Vec<Relation> = problem
            .relations()
            .iter()
            .enumerate()
            .map(|(i, &relation)| if b[i] < 0.0 { relation.reversed() } else { relation })
            .collect();

        let num_slack = relations.iter().filter(|&&r| r != Relation::Equal).count();
        let num_artificial = relations.iter().filter(|&&r| r != Relation::LessEqual).count();
        let cols = n + num_slack + num_artificial + 1;

        let mut data = vec![0.0; (m + 1) * cols];
        let mut basis = Vec::with_capacity(m);
        let mut slack_columns = Vec::with_capacity(m);
        let mut next_slack = n;
        let mut next_artificial = n + num_slack;

        for (i, &relation) in relations.iter().enumerate() {
            let sign = if b[i] < 0.0 { -1.0 } else { 1.0 };
            let row = &mut data[i * cols..(i + 1) * cols];
            for (j, entry) in row.iter_mut().take(n).enumerate() {
                *entry = sign * a[[i, j]];
            }
            row[cols - 1] = sign * b[i];

            match relation {
                Relation::LessEqual => {
                    row[next_slack] = 1.0;
                    basis.push(next_slack);
                    slack_columns.push(Some(next_slack));
                    next_slack += 1;
                },
                Relation::GreaterEqual => {
                    row[next_slack] = -1.0;
                    slack_columns.push(Some(next_slack));
                    next_slack += 1;
                    row[next_artificial] = 1.0;
                    basis.push(next_artificial);
                    next_artificial += 1;
                },
                Relation::Equal => {
                    row[next_artificial] = 1.0;
                    basis.push(next_artificial);
                    slack_columns.push(None);
                    next_artificial += 1;
                },
            }
        }

        Ok(Tableau {
            matrix: Matrix::new(m + 1, cols, data),
            basis,
            num_structural: n,
            num_slack,
            num_artificial,
            slack_columns,
        })
    }

    /// Number of constraint rows.
    pub fn rows(&self) -> usize {
        self.basis.len()
    }

    /// Number of variable columns, excluding the right-hand side.
    pub fn columns(&self) -> usize {
        self.matrix.cols() - 1
    }

    pub fn basis(&self) -> &[usize] {
        &self.basis
    }

    pub fn num_artificial(&self) -> usize {
        self.num_artificial
    }

    pub fn is_artificial(&self, column: usize) -> bool {
        column >= self.first_artificial() && column < self.columns()
    }

    pub fn slack_column(&self, constraint: usize) -> Option<usize> {
        self.slack_columns.get(constraint).cloned().unwrap_or(None)
    }

    /// Number of basic artificial rows that `remove_artificials` would pivot
    /// on rather than drop.
    pub fn pending_removals(&self, tol: f64) -> usize {
        let first_artificial = self.first_artificial();
        (0..self.rows())
            .filter(|&row| self.is_artificial(self.basis[row]))
            .filter(|&row| (0..first_artificial).any(|j| self.matrix[[row, j]].abs() > tol))
            .count()
    }

    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.matrix[[row, column]]
    }

    pub fn rhs(&self, row: usize) -> f64 {
        self.matrix[[row, self.rhs_column()]]
    }

    pub fn reduced_cost(&self, column: usize) -> f64 {
        self.matrix[[self.rows(), column]]
    }

    /// Current value of the minimized objective.
    pub fn objective_value(&self) -> f64 {
        -self.matrix[[self.rows(), self.rhs_column()]]
    }

    fn first_artificial(&self) -> usize {
        self.num_structural + self.num_slack
    }

    fn rhs_column(&self) -> usize {
        self.matrix.cols() - 1
    }

    /// Replaces the objective row with `costs` (missing entries are zero)
    /// and prices out the current basis, so that every basic column has a
    /// reduced cost of zero.
    pub fn set_objective(&mut self, costs: &[f64]) {
        let m = self.rows();
        let rhs = self.rhs_column();
        for j in 0..=rhs {
            self.matrix[[m, j]] = if j < rhs { costs.get(j).cloned().unwrap_or(0.0) } else { 0.0 };
        }
        for row in 0..m {
            let cost = self.matrix[[m, self.basis[row]]];
            if cost == 0.0 {
                continue;
            }
            for j in 0..=rhs {
                let delta = cost * self.matrix[[row, j]];
                self.matrix[[m, j]] -= delta;
            }
        }
    }

    /// Entering column: most negative reduced cost, lowest index on ties.
    pub fn entering_column(&self, tol: f64) -> Option<usize> {
        let m = self.rows();
        let mut entering: Option<(usize, f64)> = None;
        for j in 0..self.columns() {
            let cost = self.matrix[[m, j]];
            if cost >= -tol {
                continue;
            }
            match entering {
                Some((_, best)) if cost >= best => {},
                _ => entering = Some((j, cost)),
            }
        }
        entering.map(|(j, _)| j)
    }

    /// Leaving row for `column`: minimum ratio of right-hand side to a
    /// positive column entry, lowest index on ties. None means the column
    /// can be increased without limit.
    pub fn leaving_row(&self, column: usize, tol: f64) -> Option<usize> {
        let rhs = self.rhs_column();
        let mut leaving: Option<(usize, f64)> = None;
        for i in 0..self.rows() {
            let entry = self.matrix[[i, column]];
            if entry <= tol {
                continue;
            }
            let ratio = self.matrix[[i, rhs]].max(0.0) / entry;
            match leaving {
                Some((_, best)) if ratio >= best => {},
                _ => leaving = Some((i, ratio)),
            }
        }
        leaving.map(|(i, _)| i)
    }

    pub fn select_pivot(&self, tol: f64) -> PivotChoice {
        match self.entering_column(tol) {
            None => PivotChoice::Optimal,
            Some(column) => match self.leaving_row(column, tol) {
                None => PivotChoice::Unbounded { column },
                Some(row) => PivotChoice::Pivot { row, column },
            },
        }
    }

    /// Turns `column` into a unit column with its 1 in `row`, including the
    /// objective row, and makes `column` basic in `row`.
    pub fn pivot(&mut self, row: usize, column: usize, tol: f64) -> Result<(), Error> {
        let value = self.matrix[[row, column]];
        if !(value.abs() > tol) {
            return Err(Error::ZeroPivot { row, column, value });
        }
        trace!("pivot on row {}, column {} (element {})", row, column, value);

        let cols = self.matrix.cols();
        for j in 0..cols {
            self.matrix[[row, j]] /= value;
        }
        self.matrix[[row, column]] = 1.0;

        for i in 0..self.matrix.rows() {
            if i == row {
                continue;
            }
            let factor = self.matrix[[i, column]];
            if factor == 0.0 {
                continue;
            }
            for j in 0..cols {
                let delta = factor * self.matrix[[row, j]];
                self.matrix[[i, j]] -= delta;
            }
            self.matrix[[i, column]] = 0.0;
        }

        // Rounding can push a degenerate right-hand side just below zero.
        let rhs = self.rhs_column();
        for i in 0..self.rows() {
            let v = self.matrix[[i, rhs]];
            if v < 0.0 && v > -tol {
                self.matrix[[i, rhs]] = 0.0;
            }
        }

        self.basis[row] = column;
        Ok(())
    }

    /// Drops the artificial columns and clears the objective row.
    ///
    /// Artificial variables that are still basic (at value zero) are first
    /// pivoted out on any non-artificial entry of their row. A row without
    /// such an entry is a linear combination of the others and is removed.
    /// Returns the number of pivots performed.
    pub fn remove_artificials(&mut self, tol: f64) -> Result<usize, Error> {
        let first_artificial = self.first_artificial();
        let rhs = self.rhs_column();
        let mut pivots = 0;
        let mut redundant = Vec::new();

        for row in 0..self.rows() {
            if !self.is_artificial(self.basis[row]) {
                continue;
            }
            let replacement = (0..first_artificial).find(|&j| self.matrix[[row, j]].abs() > tol);
            match replacement {
                Some(column) => {
                    self.matrix[[row, rhs]] = 0.0;
                    self.pivot(row, column, tol)?;
                    pivots += 1;
                },
                None => {
                    trace!("constraint row {} is redundant", row);
                    redundant.push(row);
                },
            }
        }

        let keep_rows: Vec<usize> = (0..self.rows())
            .filter(|row| !redundant.contains(row))
            .collect();
        let keep_cols: Vec<usize> = (0..first_artificial).chain(Some(rhs)).collect();

        let mut data = Vec::with_capacity((keep_rows.len() + 1) * keep_cols.len());
        for &i in keep_rows.iter() {
            data.extend(keep_cols.iter().map(|&j| self.matrix[[i, j]]));
        }
        data.extend(keep_cols.iter().map(|_| 0.0));

        self.matrix = Matrix::new(keep_rows.len() + 1, keep_cols.len(), data);
        self.basis = keep_rows.iter().map(|&i| self.basis[i]).collect();
        self.num_artificial = 0;
        Ok(pivots)
    }

    /// Values of the first `n` columns.
    ///
    /// A column has a value only when it is basic and forms a unit column
    /// over the constraint rows; the value is then the right-hand side of the
    /// row holding the 1. Every other column is zero.
    pub fn extract(&self, n: usize, tol: f64) -> Vec<f64> {
        let rhs = self.rhs_column();
        (0..n)
            .map(|j| {
                let mut unit_row = None;
                for i in 0..self.rows() {
                    let v = self.matrix[[i, j]];
                    if (v - 1.0).abs() <= tol && unit_row.is_none() {
                        unit_row = Some(i);
                    } else if v.abs() > tol {
                        return 0.0;
                    }
                }
                match unit_row {
                    Some(i) if self.basis[i] == j => self.matrix[[i, rhs]].max(0.0),
                    _ => 0.0,
                }
            })
            .collect()
    }
}

#[cfg(test)]
fn canonical() -> Problem {
    Problem::new(
        vec![3.0, 5.0],
        vec![vec![1.0, 0.0], vec![0.0, 2.0], vec![3.0, 2.0]],
        vec![4.0, 12.0, 18.0],
        None,
    )
    .expect("Problem should be valid")
}

#[test]
fn build_mixed_relations() {
    let problem = Problem::new(
        vec![1.0, 2.0],
        vec![vec![1.0, 1.0], vec![1.0, -1.0], vec![2.0, 1.0]],
        vec![4.0, 1.0, 3.0],
        Some(vec![Relation::LessEqual, Relation::GreaterEqual, Relation::Equal]),
    )
    .expect("Problem should be valid");
    let tableau = Tableau::build(&problem).expect("Build should not fail");

    // 2 structural, 2 slack/surplus, 2 artificial, 1 right-hand side
    assert_eq!(tableau.rows(), 3);
    assert_eq!(tableau.columns(), 6);
    assert_eq!(tableau.matrix.data(),
               &vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 4.0,
                     1.0, -1.0, 0.0, -1.0, 1.0, 0.0, 1.0,
                     2.0, 1.0, 0.0, 0.0, 0.0, 1.0, 3.0,
                     0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    assert_eq!(tableau.basis(), &[2, 4, 5]);
    assert_eq!(tableau.num_artificial(), 2);
    assert!(tableau.is_artificial(4));
    assert!(!tableau.is_artificial(3));
    assert!(!tableau.is_artificial(6));
    assert_eq!(tableau.slack_column(0), Some(2));
    assert_eq!(tableau.slack_column(1), Some(3));
    assert_eq!(tableau.slack_column(2), None);
}

#[test]
fn build_negative_rhs() {
    let problem = Problem::new(
        vec![1.0, 1.0],
        vec![vec![1.0, -1.0], vec![2.0, 1.0], vec![1.0, 1.0]],
        vec![-3.0, -1.0, -2.0],
        Some(vec![Relation::GreaterEqual, Relation::LessEqual, Relation::Equal]),
    )
    .expect("Problem should be valid");
    let tableau = Tableau::build(&problem).expect("Build should not fail");

    // Rows become -x1 + x2 <= 3, -2x1 - x2 >= 1, -x1 - x2 = 2.
    // Columns: x1, x2, slack, surplus, two artificials, right-hand side
    assert_eq!(tableau.matrix.data(),
               &vec![-1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 3.0,
                     -2.0, -1.0, 0.0, -1.0, 1.0, 0.0, 1.0,
                     -1.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0,
                     0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    assert_eq!(tableau.basis(), &[2, 4, 5]);
    assert_eq!(tableau.slack_column(0), Some(2));
    assert_eq!(tableau.slack_column(1), Some(3));
    assert_eq!(tableau.slack_column(2), None);
    assert!((0..tableau.rows()).all(|i| tableau.rhs(i) >= 0.0));
}

#[test]
fn price_out_artificial_basis() {
    let problem = Problem::new(
        vec![1.0],
        vec![vec![1.0], vec![1.0]],
        vec![5.0, 2.0],
        Some(vec![Relation::GreaterEqual, Relation::LessEqual]),
    )
    .expect("Problem should be valid");
    let mut tableau = Tableau::build(&problem).expect("Build should not fail");
    tableau.set_objective(&[0.0, 0.0, 0.0, 1.0]);

    // Columns: x1, surplus, slack, artificial
    let row: Vec<f64> = (0..=tableau.columns()).map(|j| tableau.get(tableau.rows(), j)).collect();
    assert_eq!(row, vec![-1.0, 1.0, 0.0, 0.0, -5.0]);
    assert_eq!(tableau.objective_value(), 5.0);
}

#[test]
fn pivot_makes_unit_column() {
    let mut tableau = Tableau::build(&canonical()).expect("Build should not fail");
    tableau.set_objective(&[-3.0, -5.0]);
    assert_eq!(tableau.select_pivot(1e-9), PivotChoice::Pivot { row: 1, column: 1 });

    tableau.pivot(1, 1, 1e-9).expect("Pivot should not fail");
    for i in 0..=tableau.rows() {
        let expected = if i == 1 { 1.0 } else { 0.0 };
        assert_eq!(tableau.get(i, 1), expected);
    }
    assert_eq!(tableau.basis(), &[2, 1, 4]);
    assert_eq!(tableau.rhs(1), 6.0);
    assert_eq!(tableau.rhs(2), 6.0);
    assert_eq!(tableau.objective_value(), -30.0);

    assert_eq!(tableau.select_pivot(1e-9), PivotChoice::Pivot { row: 2, column: 0 });
    tableau.pivot(2, 0, 1e-9).expect("Pivot should not fail");
    assert_eq!(tableau.select_pivot(1e-9), PivotChoice::Optimal);
    assert_eq!(tableau.objective_value(), -36.0);
    assert_eq!(tableau.extract(2, 1e-9), vec![2.0, 6.0]);
}

#[test]
fn zero_pivot_is_an_error() {
    let mut tableau = Tableau::build(&canonical()).expect("Build should not fail");
    let result = tableau.pivot(0, 1, 1e-9);
    assert_eq!(result, Err(Error::ZeroPivot { row: 0, column: 1, value: 0.0 }));
}

#[test]
fn unbounded_column() {
    let problem = Problem::new(vec![1.0, 0.0], vec![vec![0.0, 1.0]], vec![3.0], None)
        .expect("Problem should be valid");
    let mut tableau = Tableau::build(&problem).expect("Build should not fail");
    tableau.set_objective(&[-1.0, 0.0]);
    assert_eq!(tableau.select_pivot(1e-9), PivotChoice::Unbounded { column: 0 });
}

#[test]
fn ratio_ties_pick_lowest_row() {
    let problem = Problem::new(
        vec![1.0, 1.0],
        vec![vec![2.0, 1.0], vec![1.0, 3.0], vec![1.0, 0.0]],
        vec![4.0, 5.0, 2.0],
        None,
    )
    .expect("Problem should be valid");
    let mut tableau = Tableau::build(&problem).expect("Build should not fail");
    tableau.set_objective(&[-1.0, -1.0]);
    assert_eq!(tableau.entering_column(1e-9), Some(0));
    assert_eq!(tableau.leaving_row(0, 1e-9), Some(0));
}

#[test]
fn remove_redundant_row() {
    let problem = Problem::new(
        vec![1.0, 2.0],
        vec![vec![1.0, 1.0], vec![2.0, 2.0]],
        vec![2.0, 4.0],
        Some(vec![Relation::Equal, Relation::Equal]),
    )
    .expect("Problem should be valid");
    let mut tableau = Tableau::build(&problem).expect("Build should not fail");
    tableau.set_objective(&[0.0, 0.0, 1.0, 1.0]);
    assert_eq!(tableau.objective_value(), 6.0);

    assert_eq!(tableau.select_pivot(1e-9), PivotChoice::Pivot { row: 0, column: 0 });
    tableau.pivot(0, 0, 1e-9).expect("Pivot should not fail");
    assert_eq!(tableau.select_pivot(1e-9), PivotChoice::Optimal);
    assert_eq!(tableau.objective_value(), 0.0);

    assert_eq!(tableau.pending_removals(1e-9), 0);
    let pivots = tableau.remove_artificials(1e-9).expect("Removal should not fail");
    assert_eq!(pivots, 0);
    assert_eq!(tableau.rows(), 1);
    assert_eq!(tableau.columns(), 2);
    assert_eq!(tableau.basis(), &[0]);
    assert_eq!(tableau.matrix.data(), &vec![1.0, 1.0, 2.0, 0.0, 0.0, 0.0]);
}

#[test]
fn drive_out_degenerate_artificial() {
    // x1 + x2 = 0 keeps its artificial basic at zero until it is pivoted out.
    let problem = Problem::new(
        vec![1.0, 1.0],
        vec![vec![1.0, 1.0], vec![1.0, 0.0]],
        vec![0.0, 3.0],
        Some(vec![Relation::Equal, Relation::LessEqual]),
    )
    .expect("Problem should be valid");
    let mut tableau = Tableau::build(&problem).expect("Build should not fail");
    // Columns: x1, x2, slack, artificial
    assert_eq!(tableau.basis(), &[3, 2]);
    tableau.set_objective(&[0.0, 0.0, 0.0, 1.0]);
    assert_eq!(tableau.objective_value(), 0.0);

    assert_eq!(tableau.pending_removals(1e-9), 1);
    let pivots = tableau.remove_artificials(1e-9).expect("Removal should not fail");
    assert_eq!(pivots, 1);
    assert_eq!(tableau.rows(), 2);
    assert_eq!(tableau.columns(), 3);
    assert_eq!(tableau.basis(), &[0, 2]);
    assert_eq!(tableau.rhs(0), 0.0);
    assert_eq!(tableau.rhs(1), 3.0);
}
