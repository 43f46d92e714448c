use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::vec::Vec;

use crate::error::Error;
use crate::problem::{ObjectiveDirection, Problem, Relation};

#[derive(Debug, Clone)]
pub struct Constraint {
    coefficients: HashMap<usize, f64>,
    relation: Relation,
    value: f64,
}

impl Default for Constraint {
    fn default() -> Constraint {
        Constraint::new()
    }
}

impl Constraint {
    pub fn new() -> Constraint {
        Constraint {
            coefficients: HashMap::new(),
            relation: Relation::LessEqual,
            value: 0.0,
        }
    }

    pub fn add(mut self, var_index: usize, coeff: f64) -> Constraint {
        match self.coefficients.entry(var_index) {
            Entry::Occupied(ent) => {
                *ent.into_mut() += coeff;
            },
            Entry::Vacant(ent) => {
                ent.insert(coeff);
            },
        }
        self
    }

    pub fn value(mut self, relation: Relation, val: f64) -> Constraint {
        self.relation = relation;
        self.value = val;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Objective {
    coefficients: HashMap<usize, f64>,
    direction: ObjectiveDirection,
}

impl Default for Objective {
    fn default() -> Objective {
        Objective::new()
    }
}

impl Objective {
    pub fn new() -> Objective {
        Objective {
            coefficients: HashMap::new(),
            direction: ObjectiveDirection::Maximize,
        }
    }

    pub fn add(mut self, var_index: usize, coeff: f64) -> Objective {
        match self.coefficients.entry(var_index) {
            Entry::Occupied(ent) => {
                *ent.into_mut() += coeff;
            },
            Entry::Vacant(ent) => {
                ent.insert(coeff);
            },
        }
        self
    }

    pub fn direction(mut self, dir: ObjectiveDirection) -> Objective {
        self.direction = dir;
        self
    }
}

// Collects sparse constraints over non-negative variables and densifies them
// into a `Problem`.
#[derive(Debug, Clone, Default)]
pub struct ProblemBuilder {
    num_variables: usize,
    constraints: Vec<Constraint>,
    objective: Objective,
}

impl ProblemBuilder {
    pub fn new() -> ProblemBuilder {
        ProblemBuilder {
            num_variables: 0,
            constraints: Vec::new(),
            objective: Objective::new(),
        }
    }

    pub fn new_variable(&mut self) -> usize {
        let result = self.num_variables;
        self.num_variables += 1;
        result
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = objective;
    }

    pub fn build(&self) -> Result<Problem, Error> {
        let n = self.num_variables;
        let check_index = |var: usize| {
            if var < n {
                Ok(())
            } else {
                Err(Error::ShapeMismatch {
                    what: "variable index",
                    expected: n,
                    found: var,
                })
            }
        };

        let mut c_data = vec![0.0; n];
        for (&var, &coeff) in &self.objective.coefficients {
            check_index(var)?;
            c_data[var] = coeff;
        }

        let mut rows = Vec::with_capacity(self.constraints.len());
        let mut b_data = Vec::with_capacity(self.constraints.len());
        let mut relations = Vec::with_capacity(self.constraints.len());
        for constraint in self.constraints.iter() {
            let mut constraint_row = vec![0.0; n];
            for (&var, &coeff) in &constraint.coefficients {
                check_index(var)?;
                constraint_row[var] = coeff;
            }
            rows.push(constraint_row);
            b_data.push(constraint.value);
            relations.push(constraint.relation);
        }

        let problem = Problem::new(c_data, rows, b_data, Some(relations))?;
        Ok(problem.with_direction(self.objective.direction))
    }
}

#[test]
fn build_constraint() {
    let constraint = Constraint::new()
        .add(0, 1.0)
        .add(1, 2.0)
        .add(0, -3.0)
        .value(Relation::LessEqual, 5.0);
    assert_eq!(constraint.coefficients.len(), 2);
    assert_eq!(constraint.coefficients[&0], -2.0);
    assert_eq!(constraint.coefficients[&1], 2.0);
    assert_eq!(constraint.relation, Relation::LessEqual);
    assert_eq!(constraint.value, 5.0);
}

#[test]
fn build_problem() {
    let mut builder = ProblemBuilder::new();
    let var1 = builder.new_variable();
    let var2 = builder.new_variable();
    let constraint1 = Constraint::new()
        .add(var1, 1.0)
        .add(var2, 2.0)
        .value(Relation::LessEqual, 5.0);
    builder.add_constraint(constraint1);
    let constraint2 = Constraint::new()
        .add(var1, 5.0)
        .add(var2, 3.0)
        .value(Relation::Equal, 10.0);
    builder.add_constraint(constraint2);
    let constraint3 = Constraint::new()
        .add(var2, 1.0)
        .value(Relation::GreaterEqual, 2.0);
    builder.add_constraint(constraint3);
    let objective = Objective::new()
        .add(var1, 1.0)
        .add(var2, 1.0)
        .direction(ObjectiveDirection::Minimize);
    builder.set_objective(objective);

    let problem = builder.build().expect("Problem should be valid");
    assert_eq!(problem.num_variables(), 2);
    assert_eq!(problem.num_constraints(), 3);
    assert_eq!(problem.constraints().data(),
               &vec![1.0, 2.0,
                     5.0, 3.0,
                     0.0, 1.0]);
    assert_eq!(problem.rhs().data(), &vec![5.0, 10.0, 2.0]);
    assert_eq!(problem.objective().data(), &vec![1.0, 1.0]);
    assert_eq!(problem.relations(),
               &[Relation::LessEqual, Relation::Equal, Relation::GreaterEqual]);
    assert_eq!(problem.direction(), ObjectiveDirection::Minimize);
}

#[test]
fn unknown_variable() {
    let mut builder = ProblemBuilder::new();
    let var1 = builder.new_variable();
    builder.add_constraint(Constraint::new().add(var1 + 1, 1.0).value(Relation::LessEqual, 1.0));
    builder.set_objective(Objective::new().add(var1, 1.0));
    assert!(matches!(builder.build(), Err(Error::ShapeMismatch { what: "variable index", .. })));
}
