use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("empty identifier")]
    EmptyId,

    #[error("serialization error: {0}")]
    Serialization(String),
}
