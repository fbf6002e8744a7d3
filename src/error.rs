use std::fmt::Display;

use thiserror::Error;

/// What went wrong while executing a program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),
    #[error("Undefined property '{0}'.")]
    UndefinedProperty(String),
    #[error("{0}")]
    TypeMismatch(String),
    #[error("Expected {expected} arguments but got {got}.")]
    ArityMismatch { expected: usize, got: usize },
    #[error("Division by zero.")]
    DivisionByZero,
    #[error("Index {index} out of bounds for length {length}.")]
    IndexOutOfBounds { index: i64, length: usize },
    #[error("Stack overflow: more than {0} nested calls.")]
    StackOverflow(usize),
    /// A `return`, `break` or `continue` reached a point that can't handle it.
    #[error("Unexpected '{0}' outside of its enclosing construct.")]
    ControlFlowEscape(&'static str),
    #[error("Failed to write output: {0}")]
    Io(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub line: Option<i32>,
}

impl RuntimeError {
    /// Negative lines come from synthetic tokens and are dropped.
    pub fn new(kind: ErrorKind, line: i32) -> Self {
        Self { kind, line: (line >= 0).then_some(line) }
    }

    /// An error raised by code that doesn't know where it was called from.
    pub fn unlocated(kind: ErrorKind) -> Self {
        Self { kind, line: None }
    }

    pub fn type_mismatch(line: i32, msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch(msg.into()), line)
    }

    pub fn undefined_variable(line: i32, name: &str) -> Self {
        Self::new(ErrorKind::UndefinedVariable(name.to_owned()), line)
    }

    /// Attach `line` unless the error already knows where it happened.
    pub fn or_at(mut self, line: i32) -> Self {
        if self.line.is_none() && line >= 0 {
            self.line = Some(line);
        }
        self
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "[line {line}] {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<std::io::Error> for RuntimeError {
    fn from(e: std::io::Error) -> Self {
        Self::unlocated(ErrorKind::Io(e.to_string()))
    }
}
