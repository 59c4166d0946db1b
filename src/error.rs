// ABOUTME: Error types propagated through the reader, evaluator, and builtins

use crate::value::Value;
use thiserror::Error;

/// `Syntax` covers both reader-level structural errors (where `offset` is a
/// meaningful byte position into the source text) and evaluator-level shape
/// errors such as a malformed `let*` binding list or a binds/exprs arity
/// mismatch (where `offset` is `0`, since there is no source position once a
/// `Value` is being evaluated rather than read). `Host` covers everything
/// else: type mismatches in builtins, I/O failures, integer-parse failures,
/// and "not callable" errors.
#[derive(Error, Debug, Clone)]
pub enum LispError {
    #[error("unexpected end of input")]
    Eof,

    #[error("no input")]
    NoInput,

    #[error("{message}")]
    Syntax { offset: usize, message: String },

    #[error("'{0}' not found")]
    SymbolNotFound(String),

    /// A language-level `throw`; carries the raised value verbatim.
    #[error("{0}")]
    Throw(Value),

    #[error("{0}")]
    Host(String),
}

impl LispError {
    pub fn syntax(offset: usize, message: impl Into<String>) -> Self {
        LispError::Syntax {
            offset,
            message: message.into(),
        }
    }

    pub fn host(message: impl Into<String>) -> Self {
        LispError::Host(message.into())
    }

    /// The value a `(catch* sym ...)` handler binds `sym` to: the payload
    /// for a `throw`, or an exception wrapper around the message for any
    /// other error kind.
    pub fn into_caught_value(self) -> Value {
        match self {
            LispError::Throw(v) => v,
            other => Value::Exception(other.to_string().into()),
        }
    }
}
