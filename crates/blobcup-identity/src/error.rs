use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("I/O error on profile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid identity: {0}")]
    Invalid(#[from] blobcup_types::TypeError),
}

pub type IdentityResult<T> = Result<T, IdentityError>;
