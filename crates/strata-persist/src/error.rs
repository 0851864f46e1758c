use thiserror::Error;

use strata_store::StoreError;

#[derive(Debug, Error)]
pub enum PersistError {
    /// Invalid open parameters. Fatal; raised during configure, before any
    /// store is touched.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The object carries no key. Raised before any I/O is attempted.
    #[error("cannot save a document without a key")]
    MissingKey,

    /// A must-exist read path (merge) found nothing under the key.
    #[error("no record in {collection} under key {key}")]
    NotFound { collection: String, key: String },

    /// A finder named a field with no declared index.
    #[error("field is not indexed: {0}")]
    NotIndexed(String),

    /// Anything else from the underlying store; always propagated, never
    /// swallowed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result alias for persister operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// Lift a store error, promoting its not-indexed case to the persister's
/// own variant so finder callers see one error kind.
pub(crate) fn lift(err: StoreError) -> PersistError {
    match err {
        StoreError::NotIndexed(field) => PersistError::NotIndexed(field),
        other => PersistError::Store(other),
    }
}
