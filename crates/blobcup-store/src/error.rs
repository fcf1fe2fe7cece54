/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested blob does not exist.
    #[error("blob not found: {container}/{key}")]
    NotFound { container: String, key: String },

    /// The store answered with a non-success status.
    #[error("{operation} failed with status {status} for {target}")]
    Status {
        operation: &'static str,
        status: u16,
        target: String,
    },

    /// The request never got an answer (DNS, TLS, timeout, reset).
    #[error("transport error during {operation}: {reason}")]
    Transport {
        operation: &'static str,
        reason: String,
    },

    /// A text read returned bytes that are not UTF-8.
    #[error("blob {container}/{key} is not valid UTF-8")]
    Encoding { container: String, key: String },

    /// The container listing could not be decoded.
    #[error("malformed container listing: {0}")]
    Listing(String),

    /// The store configuration is unusable.
    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),

    /// Storage backend is read-only.
    #[error("store is read-only")]
    ReadOnly,

    /// Storage backend is unreachable.
    #[error("store is unavailable")]
    Unavailable,
}

impl StoreError {
    pub fn not_found(container: &str, key: &str) -> Self {
        Self::NotFound {
            container: container.to_string(),
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
