use std::fmt;

use thiserror::Error;

use crate::ast::Span;

/// Failures raised while executing a program. Every one of these is fatal to
/// the run in progress; nothing is retried inside the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Undefined variable '{name}'")]
    UndefinedVariable { name: String },
    #[error("Undefined function '{name}'")]
    UndefinedFunction { name: String },
    #[error("Undefined record key '{key}'")]
    UndefinedKey { key: String },
    #[error("Duplicate function definition '{name}'")]
    DuplicateFunction { name: String },
    #[error("Function '{name}' expected {expected} arguments, got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Type error: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },
    #[error("Operator '{operator}' is not supported for types {left} and {right}")]
    InvalidOperands {
        operator: String,
        left: String,
        right: String,
    },
    #[error("List index out of bounds: index {index}, len {len}")]
    IndexOutOfBounds { index: i64, len: usize },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Return statement outside of a function")]
    ReturnOutsideFunction,
    #[error("Call stack is empty")]
    EmptyStack,
}

impl RuntimeError {
    pub(crate) fn type_mismatch(expected: &str, got: &str) -> Self {
        RuntimeError::TypeMismatch {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }

    /// Attaches the position of the node that triggered this error.
    pub(crate) fn at(self, span: Span) -> ExecutionError {
        ExecutionError {
            kind: self,
            span: Some(span),
        }
    }
}

/// A [`RuntimeError`] annotated with the source position of the node that
/// raised it, rendered as `"<message>: <line>:<col>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionError {
    pub kind: RuntimeError,
    pub span: Option<Span>,
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "{}: {span}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<RuntimeError> for ExecutionError {
    fn from(kind: RuntimeError) -> Self {
        ExecutionError { kind, span: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_position_after_message() {
        let error = RuntimeError::UndefinedVariable {
            name: "x".to_string(),
        }
        .at(Span { line: 3, col: 7 });
        assert_eq!(error.to_string(), "Undefined variable 'x': 3:7");
    }

    #[test]
    fn omits_position_when_unknown() {
        let error = ExecutionError::from(RuntimeError::EmptyStack);
        assert_eq!(error.to_string(), "Call stack is empty");
    }
}
