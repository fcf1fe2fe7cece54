use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("config error in {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store error: {0}")]
    Store(#[from] blobcup_store::StoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] blobcup_ledger::LedgerError),

    #[error("identity error: {0}")]
    Identity(#[from] blobcup_identity::IdentityError),

    #[error("bracket error: {0}")]
    Bracket(#[from] blobcup_bracket::BracketError),

    #[error("type error: {0}")]
    Type(#[from] blobcup_types::TypeError),
}

pub type SdkResult<T> = Result<T, SdkError>;
