use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::SolverConfig;
use crate::dual;
use crate::error::Error;
use crate::problem::{Problem, Solution};
use crate::simplex;

/// Solution method, chosen once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// Two-phase simplex on the problem itself.
    #[default]
    TwoPhase,
    /// Two-phase simplex on the dual problem.
    Dual,
}

impl Method {
    pub fn name(self) -> &'static str {
        match self {
            Method::TwoPhase => "two-phase",
            Method::Dual => "dual",
        }
    }

    pub fn solve(self, problem: &Problem, config: &SolverConfig) -> Result<Solution, Error> {
        match self {
            Method::TwoPhase => simplex::solve(problem, config),
            Method::Dual => dual::solve(problem, config),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Method, String> {
        match s {
            "two-phase" | "twophase" | "two_phase" => Ok(Method::TwoPhase),
            "dual" => Ok(Method::Dual),
            _ => Err(format!("unknown method `{}`, expected `two-phase` or `dual`", s)),
        }
    }
}

#[test]
fn parse_method() {
    assert_eq!("two-phase".parse::<Method>(), Ok(Method::TwoPhase));
    assert_eq!("dual".parse::<Method>(), Ok(Method::Dual));
    assert!("simplex".parse::<Method>().is_err());
    assert_eq!(serde_json::to_string(&Method::TwoPhase).expect("Serialize should not fail"),
               "\"two-phase\"");
}

#[test]
fn methods_agree() {
    let problem = Problem::new(
        vec![1.0, 2.0, 3.0],
        vec![vec![1.0, 1.0, 1.0], vec![0.0, 1.0, 2.0]],
        vec![10.0, 8.0],
        None,
    )
    .expect("Problem should be valid");
    let config = SolverConfig::default();
    let primal = Method::TwoPhase.solve(&problem, &config).expect("Solve should not fail");
    let dual = Method::Dual.solve(&problem, &config).expect("Solve should not fail");
    let (p, d) = match (primal.optimal_value(), dual.optimal_value()) {
        (Some(p), Some(d)) => (p, d),
        other => panic!("Expected two optima, got {:?}", other),
    };
    assert!((p - d).abs() < 1e-6);
}
