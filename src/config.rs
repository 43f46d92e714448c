use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;
pub const DEFAULT_PIVOT_TOLERANCE: f64 = 1e-9;
pub const DEFAULT_FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// Per-call solver settings. Nothing here is shared between solves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct SolverConfig {
    /// Cap on the number of pivots over both phases, including those that
    /// remove artificial variables after phase one.
    pub max_iterations: usize,
    /// Smallest magnitude accepted as a pivot element, and the slack allowed
    /// on reduced costs before a column counts as improving.
    pub pivot_tolerance: f64,
    /// Largest artificial objective value still treated as feasible.
    pub feasibility_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> SolverConfig {
        SolverConfig {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            pivot_tolerance: DEFAULT_PIVOT_TOLERANCE,
            feasibility_tolerance: DEFAULT_FEASIBILITY_TOLERANCE,
        }
    }
}

impl SolverConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> SolverConfig {
        self.max_iterations = max_iterations;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.pivot_tolerance) {
            return Err(Error::InvalidConfig(format!(
                "pivot tolerance must be positive and finite, got {}",
                self.pivot_tolerance
            )));
        }
        if !positive(self.feasibility_tolerance) {
            return Err(Error::InvalidConfig(format!(
                "feasibility tolerance must be positive and finite, got {}",
                self.feasibility_tolerance
            )));
        }
        Ok(())
    }
}

#[test]
fn partial_config_uses_defaults() {
    let config: SolverConfig = serde_json::from_str(r#"{"maxIterations": 7}"#)
        .expect("Config should parse");
    assert_eq!(config.max_iterations, 7);
    assert_eq!(config.pivot_tolerance, DEFAULT_PIVOT_TOLERANCE);
    assert_eq!(config.feasibility_tolerance, DEFAULT_FEASIBILITY_TOLERANCE);
    assert!(config.validate().is_ok());
}

#[test]
fn rejects_bad_tolerances() {
    let config = SolverConfig {
        pivot_tolerance: 0.0,
        ..SolverConfig::default()
    };
    assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

    let config = SolverConfig {
        feasibility_tolerance: f64::NAN,
        ..SolverConfig::default()
    };
    assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

    let unknown = serde_json::from_str::<SolverConfig>(r#"{"maxIter": 7}"#);
    assert!(unknown.is_err());
}
