use thiserror::Error;

use crate::runtime::object::ObjectHolder;

/// Errors that abort a Mython program.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Undefined name '{name}'")]
    UndefinedName { name: String },
    #[error("Unknown field '{field}'")]
    UnknownField { field: String },
    #[error("Expected a class instance, got {type_name}")]
    ExpectedInstance { type_name: String },
    #[error("Method '{method}' with {arity} argument(s) not found")]
    UnknownMethod { method: String, arity: usize },
    #[error("Cannot apply '{operation}' to {lhs} and {rhs}")]
    InvalidOperands {
        operation: &'static str,
        lhs: String,
        rhs: String,
    },
    #[error("Cannot compare {lhs} and {rhs}")]
    IncomparableValues { lhs: String, rhs: String },
    #[error("Method '{method}' must return a bool")]
    NonBoolComparison { method: String },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Output stream error: {message}")]
    OutputStream { message: String },
    #[error("Return statement outside of a method body")]
    ReturnOutsideMethod,
}

impl From<std::io::Error> for RuntimeError {
    fn from(error: std::io::Error) -> Self {
        Self::OutputStream {
            message: error.to_string(),
        }
    }
}

/// Non-local outcomes of statement execution: a hard error, or the early
/// return signal travelling to the enclosing method body.
#[derive(Debug)]
pub enum Interrupt {
    Return(ObjectHolder),
    Error(RuntimeError),
}

impl From<RuntimeError> for Interrupt {
    fn from(error: RuntimeError) -> Self {
        Self::Error(error)
    }
}

impl From<std::io::Error> for Interrupt {
    fn from(error: std::io::Error) -> Self {
        Self::Error(error.into())
    }
}

pub type ExecResult = Result<ObjectHolder, Interrupt>;
