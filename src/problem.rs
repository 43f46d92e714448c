use std::fmt;

use rulinalg::matrix::{BaseMatrix, Matrix};
use rulinalg::vector::Vector;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    #[serde(rename = "<=", alias = "le", alias = "≤")]
    LessEqual,
    #[serde(rename = ">=", alias = "ge", alias = "≥")]
    GreaterEqual,
    #[serde(rename = "=", alias = "eq", alias = "==")]
    Equal,
}

impl Relation {
    /// The relation that holds after both sides are negated.
    pub fn reversed(self) -> Relation {
        match self {
            Relation::LessEqual => Relation::GreaterEqual,
            Relation::GreaterEqual => Relation::LessEqual,
            Relation::Equal => Relation::Equal,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match *self {
            Relation::LessEqual => "<=",
            Relation::GreaterEqual => ">=",
            Relation::Equal => "=",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveDirection {
    #[default]
    Maximize,
    Minimize,
}

impl ObjectiveDirection {
    // Multiplier turning the user's objective into one that is maximized.
    pub fn sign(self) -> f64 {
        match self {
            ObjectiveDirection::Maximize => 1.0,
            ObjectiveDirection::Minimize => -1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Problem {
    // Linear program:
    // Optimize c^Tx (in the given direction)
    // subject to a_i^Tx {<=, >=, =} b_i for every row i
    // and x >= 0
    c: Vector<f64>,
    a: Matrix<f64>,
    b: Vector<f64>,
    relations: Vec<Relation>,
    direction: ObjectiveDirection,
}

impl Problem {
    /// Builds a maximization problem from dense rows.
    ///
    /// When `relations` is `None` every row is a `<=` constraint.
    pub fn new(
        objective: Vec<f64>,
        constraints: Vec<Vec<f64>>,
        rhs: Vec<f64>,
        relations: Option<Vec<Relation>>,
    ) -> Result<Problem, Error> {
        let n = objective.len();
        let m = constraints.len();
        if n == 0 {
            return Err(Error::EmptyObjective);
        }
        if rhs.len() != m {
            return Err(Error::ShapeMismatch {
                what: "right-hand side",
                expected: m,
                found: rhs.len(),
            });
        }
        let relations = relations.unwrap_or_else(|| vec![Relation::LessEqual; m]);
        if relations.len() != m {
            return Err(Error::ShapeMismatch {
                what: "relations",
                expected: m,
                found: relations.len(),
            });
        }

        let mut a_data = Vec::with_capacity(m * n);
        for row in constraints.iter() {
            if row.len() != n {
                return Err(Error::ShapeMismatch {
                    what: "constraint row",
                    expected: n,
                    found: row.len(),
                });
            }
            a_data.extend_from_slice(row);
        }

        let problem = Problem {
            c: Vector::new(objective),
            a: Matrix::new(m, n, a_data),
            b: Vector::new(rhs),
            relations,
            direction: ObjectiveDirection::Maximize,
        };
        problem.validate()?;
        Ok(problem)
    }

    pub fn with_direction(mut self, direction: ObjectiveDirection) -> Problem {
        self.direction = direction;
        self
    }

    /// Checks that the geometry agrees and every coefficient is finite.
    pub fn validate(&self) -> Result<(), Error> {
        let n = self.c.size();
        let m = self.b.size();
        if n == 0 {
            return Err(Error::EmptyObjective);
        }
        if self.a.cols() != n {
            return Err(Error::ShapeMismatch {
                what: "constraint row",
                expected: n,
                found: self.a.cols(),
            });
        }
        if self.a.rows() != m {
            return Err(Error::ShapeMismatch {
                what: "right-hand side",
                expected: self.a.rows(),
                found: m,
            });
        }
        if self.relations.len() != m {
            return Err(Error::ShapeMismatch {
                what: "relations",
                expected: m,
                found: self.relations.len(),
            });
        }
        if self.c.iter().any(|v| !v.is_finite()) {
            return Err(Error::NonFinite { what: "objective" });
        }
        if self.a.data().iter().any(|v| !v.is_finite()) {
            return Err(Error::NonFinite { what: "constraints" });
        }
        if self.b.iter().any(|v| !v.is_finite()) {
            return Err(Error::NonFinite { what: "right-hand side" });
        }
        Ok(())
    }

    pub fn num_variables(&self) -> usize {
        self.c.size()
    }

    pub fn num_constraints(&self) -> usize {
        self.b.size()
    }

    pub fn objective(&self) -> &Vector<f64> {
        &self.c
    }

    pub fn constraints(&self) -> &Matrix<f64> {
        &self.a
    }

    pub fn rhs(&self) -> &Vector<f64> {
        &self.b
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn direction(&self) -> ObjectiveDirection {
        self.direction
    }

    /// Evaluates c^Tx.
    pub fn objective_value(&self, x: &[f64]) -> f64 {
        self.c.iter().zip(x).map(|(c, x)| c * x).sum()
    }

    /// Evaluates a_i^Tx for constraint row `i`.
    pub fn row_activity(&self, i: usize, x: &[f64]) -> f64 {
        let n = self.num_variables();
        self.a.data()[i * n..(i + 1) * n]
            .iter()
            .zip(x)
            .map(|(a, x)| a * x)
            .sum()
    }

    /// Whether `x` satisfies every constraint and sign restriction within `tol`.
    pub fn is_feasible(&self, x: &[f64], tol: f64) -> bool {
        if x.len() != self.num_variables() || x.iter().any(|&v| v < -tol) {
            return false;
        }
        (0..self.num_constraints()).all(|i| {
            let lhs = self.row_activity(i, x);
            let rhs = self.b[i];
            match self.relations[i] {
                Relation::LessEqual => lhs <= rhs + tol,
                Relation::GreaterEqual => lhs >= rhs - tol,
                Relation::Equal => (lhs - rhs).abs() <= tol,
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Optimal,
    Infeasible,
    Unbounded,
    IterationLimitExceeded,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LPResult {
    Optimum { value: f64, x: Vector<f64> },
    Infeasible,
    Unbounded,
    IterationLimitExceeded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub result: LPResult,
    // Pivots performed over both phases.
    pub iterations: usize,
}

impl Solution {
    pub fn status(&self) -> Status {
        match self.result {
            LPResult::Optimum { .. } => Status::Optimal,
            LPResult::Infeasible => Status::Infeasible,
            LPResult::Unbounded => Status::Unbounded,
            LPResult::IterationLimitExceeded => Status::IterationLimitExceeded,
        }
    }

    pub fn optimal_value(&self) -> Option<f64> {
        match self.result {
            LPResult::Optimum { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn variables(&self) -> Option<&[f64]> {
        match self.result {
            LPResult::Optimum { ref x, .. } => Some(x.data().as_slice()),
            _ => None,
        }
    }
}

#[test]
fn relations_default_to_less_equal() {
    let problem = Problem::new(
        vec![1.0, 1.0],
        vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        vec![1.0, 2.0],
        None,
    )
    .expect("Problem should be valid");
    assert_eq!(problem.relations(), &[Relation::LessEqual, Relation::LessEqual]);
    assert_eq!(problem.direction(), ObjectiveDirection::Maximize);
}

#[test]
fn rejects_bad_shapes() {
    let short_row = Problem::new(vec![1.0, 1.0], vec![vec![1.0]], vec![1.0], None);
    assert_eq!(
        short_row.unwrap_err(),
        Error::ShapeMismatch {
            what: "constraint row",
            expected: 2,
            found: 1
        }
    );

    let rhs = Problem::new(vec![1.0], vec![vec![1.0]], vec![1.0, 2.0], None);
    assert!(matches!(rhs, Err(Error::ShapeMismatch { what: "right-hand side", .. })));

    let relations = Problem::new(
        vec![1.0],
        vec![vec![1.0]],
        vec![1.0],
        Some(vec![Relation::LessEqual, Relation::Equal]),
    );
    assert!(matches!(relations, Err(Error::ShapeMismatch { what: "relations", .. })));

    let empty = Problem::new(vec![], vec![], vec![], None);
    assert_eq!(empty.unwrap_err(), Error::EmptyObjective);

    let nan = Problem::new(vec![f64::NAN], vec![], vec![], None);
    assert_eq!(nan.unwrap_err(), Error::NonFinite { what: "objective" });
}

#[test]
fn feasibility_check() {
    let problem = Problem::new(
        vec![1.0, 1.0],
        vec![vec![1.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0]],
        vec![4.0, 1.0, 3.0],
        Some(vec![Relation::LessEqual, Relation::GreaterEqual, Relation::Equal]),
    )
    .expect("Problem should be valid");
    assert!(problem.is_feasible(&[1.0, 3.0], 1e-9));
    assert!(!problem.is_feasible(&[0.5, 3.0], 1e-9));
    assert!(!problem.is_feasible(&[2.0, 3.0], 1e-9));
    assert!(!problem.is_feasible(&[1.0, -3.0], 1e-9));
    assert_eq!(problem.objective_value(&[1.0, 3.0]), 4.0);
}
