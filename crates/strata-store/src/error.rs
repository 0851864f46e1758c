/// Errors from ordered-store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored record could not be decoded.
    #[error("corrupt record for key {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// The store handle has been closed; no further operations are accepted.
    #[error("store is closed")]
    Closed,

    /// A lookup named a field with no registered secondary index.
    #[error("field is not indexed: {0}")]
    NotIndexed(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
