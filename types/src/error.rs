//! Errors raised while interpreting backend values.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unrecognised timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("unknown {kind} value: {value:?}")]
    UnknownVariant { kind: &'static str, value: String },
}
