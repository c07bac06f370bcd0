//! Error types of the solver.

use thiserror::Error;

/// Errors raised while turning problem text into a model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// the expression has no `coefficient variable` term at all
    #[error("invalid expression format: `{0}` has no terms")]
    NoTerms(String),

    /// a sign or a lone decimal point in front of a variable that is not a number
    #[error("invalid expression format: coefficient `{coefficient}` of `{variable}` is not a number")]
    InvalidCoefficient { coefficient: String, variable: String },

    #[error("right-hand side `{0}` is not a number")]
    InvalidRightHandSide(String),

    #[error("unknown relational operator `{0}`")]
    UnknownOperator(String),

    #[error("unknown optimization sense `{0}`, expected `max` or `min`")]
    UnknownSense(String),

    /// variable names are a single letter followed by digits
    #[error("invalid variable name `{0}`")]
    InvalidVariableName(String),

    /// constraint text that is not `lhs <op> rhs`
    #[error("malformed constraint `{0}`, expected `<lhs> <= | >= | = <rhs>`")]
    MalformedConstraint(String),

    #[error("grammar error: {0}")]
    Grammar(String),
}

/// Errors of the whole solving pipeline.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("duplicate constraint id `{0}`")]
    DuplicateConstraint(String),

    /// the relaxation oracle could not produce an answer
    #[error("relaxation oracle failed: {0}")]
    Oracle(String),

    /// malformed solver configuration or problem file
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type of the solving pipeline.
pub type SolverResult<T> = Result<T, SolverError>;
