pub mod error;
pub mod problem;
pub mod builder;
pub mod config;
pub mod tableau;
pub mod simplex;
pub mod dual;
pub mod method;
pub mod adapter;

#[doc(hidden)]
pub mod bench_util;

mod random_tests;

pub use config::SolverConfig;
pub use error::Error;
pub use method::Method;
pub use problem::{LPResult, ObjectiveDirection, Problem, Relation, Solution, Status};
