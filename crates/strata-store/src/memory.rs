use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::{BatchOp, OrderedStore};

struct MemoryInner {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    closed: bool,
}

/// In-memory, BTreeMap-based ordered store.
///
/// Intended for tests and embedding. Keys are held in sorted order behind a
/// `RwLock` for safe concurrent access; batches commit under a single write
/// lock, which makes them atomic with respect to every other operation.
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryInner {
                entries: BTreeMap::new(),
                closed: false,
            }),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").entries.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().expect("lock poisoned").entries.is_empty()
    }

    /// Build a store pre-populated with the given entries.
    pub(crate) fn from_entries(entries: BTreeMap<Vec<u8>, Vec<u8>>) -> Self {
        Self {
            inner: RwLock::new(MemoryInner {
                entries,
                closed: false,
            }),
        }
    }

    /// A point-in-time copy of the full key space.
    pub(crate) fn snapshot(&self) -> StoreResult<BTreeMap<Vec<u8>, Vec<u8>>> {
        let inner = self.inner.read().expect("lock poisoned");
        if inner.closed {
            return Err(StoreError::Closed);
        }
        Ok(inner.entries.clone())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn check_open(inner: &MemoryInner) -> StoreResult<()> {
    if inner.closed {
        Err(StoreError::Closed)
    } else {
        Ok(())
    }
}

impl OrderedStore for MemoryStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let inner = self.inner.read().expect("lock poisoned");
        check_open(&inner)?;
        Ok(inner.entries.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let mut inner = self.inner.write().expect("lock poisoned");
        check_open(&inner)?;
        inner.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        let mut inner = self.inner.write().expect("lock poisoned");
        check_open(&inner)?;
        inner.entries.remove(key);
        Ok(())
    }

    fn apply(&self, batch: &[BatchOp]) -> StoreResult<()> {
        let mut inner = self.inner.write().expect("lock poisoned");
        check_open(&inner)?;
        for op in batch {
            match op {
                BatchOp::Put { key, value } => {
                    inner.entries.insert(key.clone(), value.clone());
                }
                BatchOp::Delete { key } => {
                    inner.entries.remove(key);
                }
            }
        }
        Ok(())
    }

    fn keys(&self, prefix: &[u8]) -> StoreResult<Vec<Vec<u8>>> {
        let inner = self.inner.read().expect("lock poisoned");
        check_open(&inner)?;
        Ok(inner
            .entries
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn close(&self) -> StoreResult<()> {
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.closed = true;
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().expect("lock poisoned");
        f.debug_struct("MemoryStore")
            .field("key_count", &inner.entries.len())
            .field("closed", &inner.closed)
            .finish()
    }
}
