use thiserror::Error;

use crate::variable::VarId;

/// Errors raised while building symbolic arithmetic.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ArithmeticError {
    #[error("Divide by zero")]
    DivideByZero,

    #[error("Negative shift amount: {0}")]
    NegativeShift(i64),
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum SolveError {
    /// Malformed or unsupported constraint, detected before solving.
    #[error("Invalid constraint: {0}")]
    InvalidConstraint(String),

    #[error("Invalid random variable: {0}")]
    InvalidVariable(String),

    #[error("Unknown variable {0}")]
    UnknownVariable(VarId),

    #[error("No possible variable assignments can satisfy the constraints")]
    Unsatisfiable,

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

pub type Result<T> = std::result::Result<T, SolveError>;
