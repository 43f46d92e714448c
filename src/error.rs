use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("shape mismatch in {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("objective must have at least one coefficient")]
    EmptyObjective,
    #[error("non-finite value in {what}")]
    NonFinite { what: &'static str },
    #[error("invalid solver configuration: {0}")]
    InvalidConfig(String),
    #[error("attempted to pivot on near-zero element {value} at row {row}, column {column}")]
    ZeroPivot {
        row: usize,
        column: usize,
        value: f64,
    },
    #[error("phase one reported an unbounded artificial objective")]
    UnboundedPhaseOne,
}

impl Error {
    // Errors caused by the shape or content of the caller's problem, as
    // opposed to failures inside the engine.
    pub fn is_input_error(&self) -> bool {
        match *self {
            Error::ShapeMismatch { .. } | Error::EmptyObjective | Error::NonFinite { .. } => true,
            Error::InvalidConfig(_) | Error::ZeroPivot { .. } | Error::UnboundedPhaseOne => false,
        }
    }
}
