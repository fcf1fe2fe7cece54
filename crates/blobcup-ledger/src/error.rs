/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("malformed ledger: {0}")]
    Malformed(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store error: {0}")]
    Store(#[from] blobcup_store::StoreError),

    #[error("identity error: {0}")]
    Identity(#[from] blobcup_identity::IdentityError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
