//! Error types for expression compilation and evaluation.

use crate::data::ExprType;
use thiserror::Error;

/// Failure classes surfaced to whoever formats the query response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed literal, unresolved reference, or no usable overload
    SemanticCheck,
    /// A resolved function was called with values outside its domain
    ExpressionEvaluation,
    /// The relation scan (or anything else below the core) failed
    Upstream,
}

/// Errors that can occur while compiling or evaluating expressions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("{0}")]
    SemanticCheck(String),

    #[error(
        "unsupported argument type for function {function} with arguments [{}]",
        join_types(.arg_types)
    )]
    UnsupportedArguments {
        function: String,
        arg_types: Vec<ExprType>,
    },

    #[error(
        "ambiguous signatures for function {function} with arguments [{}]",
        join_types(.arg_types)
    )]
    AmbiguousSignature {
        function: String,
        arg_types: Vec<ExprType>,
    },

    #[error("unsupported function name: {0}")]
    UnknownFunction(String),

    #[error("can't resolve field {0} in schema")]
    UnknownField(String),

    #[error("{0}")]
    ExpressionEvaluation(String),
}

impl ExpressionError {
    pub fn semantic(message: impl Into<String>) -> Self {
        ExpressionError::SemanticCheck(message.into())
    }

    pub fn evaluation(message: impl Into<String>) -> Self {
        ExpressionError::ExpressionEvaluation(message.into())
    }

    /// Classify this error for the response layer
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExpressionError::ExpressionEvaluation(_) => ErrorKind::ExpressionEvaluation,
            _ => ErrorKind::SemanticCheck,
        }
    }
}

fn join_types(types: &[ExprType]) -> String {
    types
        .iter()
        .map(|ty| ty.name())
        .collect::<Vec<_>>()
        .join(",")
}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;
