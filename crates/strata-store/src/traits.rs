use crate::error::StoreResult;

/// One operation inside an atomic batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    /// Write `value` under `key`, overwriting any previous value.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Remove `key`. Deleting a missing key is a no-op.
    Delete { key: Vec<u8> },
}

impl BatchOp {
    /// The key this operation touches.
    pub fn key(&self) -> &[u8] {
        match self {
            BatchOp::Put { key, .. } => key,
            BatchOp::Delete { key } => key,
        }
    }
}

/// An ordered key-value store handle.
///
/// This is the engine contract: compaction, logging, and durability are the
/// backend's concern, never the caller's. All implementations must satisfy
/// these invariants:
/// - Keys are opaque byte strings ordered lexicographically.
/// - A read miss is `Ok(None)`, never an error.
/// - `delete` is idempotent; deleting a missing key succeeds.
/// - `apply` commits a batch atomically within this handle: either every
///   operation takes effect or none does.
/// - `keys` enumerates a finite, ascending snapshot of the key space and is
///   restartable per call.
/// - After `close`, every operation fails with `StoreError::Closed`;
///   `close` itself is idempotent.
/// - All I/O errors are propagated, never silently ignored.
pub trait OrderedStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Write `value` under `key`, overwriting any previous value.
    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Remove `key` if present.
    fn delete(&self, key: &[u8]) -> StoreResult<()>;

    /// Atomically apply a batch of puts and deletes.
    fn apply(&self, batch: &[BatchOp]) -> StoreResult<()>;

    /// All keys starting with `prefix`, in ascending byte order.
    fn keys(&self, prefix: &[u8]) -> StoreResult<Vec<Vec<u8>>>;

    /// Release the handle. In-flight operations have undefined outcome;
    /// callers drain first.
    fn close(&self) -> StoreResult<()>;
}
