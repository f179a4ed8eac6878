//! Error taxonomy: parse-time failures, evaluation-time failures, the Avro
//! adapter's own errors, and a top-level aggregate for library consumers
//! who want to handle any of them with a single `?`.

use thiserror::Error;

/// A parser failure: the root [`crate::parse_cl`]/[`crate::parse_avro_schema`]
/// entry points report the farthest cursor reached and an optional message.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("invalid source at line {line}, col {col}: {message}")]
    InvalidSource {
        pos: usize,
        line: usize,
        col: usize,
        message: String,
    },
}

/// A runtime failure raised while evaluating the CLR expression graph.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("name not found: {name}")]
    NameNotFound { name: String },

    #[error("field not found: {name}")]
    FieldNotFound { name: String },

    #[error("index out of range: {index} (length {len})")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// Errors raised by the Avro schema adapter (grammar + name registry).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AvroError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("unknown schema name: {fullname}")]
    UnknownName { fullname: String },

    #[error("schema name already registered: {fullname}")]
    DuplicateName { fullname: String },
}

/// Aggregate error type for the crate's public entry points.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CrateError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Avro(#[from] AvroError),
}
