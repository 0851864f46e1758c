use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::memory::MemoryStore;
use crate::traits::{BatchOp, OrderedStore};

const SNAPSHOT_FILE_NAME: &str = "strata-store.bin";

/// Filesystem-backed ordered store.
///
/// The full key space lives in memory and is rewritten to a single
/// bincode snapshot file after every mutation, through a temp-file rename
/// so a crash mid-write never leaves a torn snapshot behind. Durability is
/// therefore snapshot-grained: the last completed mutation is on disk, an
/// interrupted one is lost whole.
///
/// Opening creates the store directory (and intermediate directories) if
/// it does not exist.
pub struct FsStore {
    snapshot_file: PathBuf,
    inner: MemoryStore,
}

impl FsStore {
    /// Open (or create) a store rooted at the given directory.
    pub fn open<P: AsRef<Path>>(root: P) -> StoreResult<Self> {
        fs::create_dir_all(root.as_ref())?;
        let snapshot_file = root.as_ref().join(SNAPSHOT_FILE_NAME);
        let entries: BTreeMap<Vec<u8>, Vec<u8>> = if snapshot_file.exists() {
            let raw = fs::read(&snapshot_file)?;
            bincode::deserialize(&raw).map_err(|e| StoreError::Serialization(e.to_string()))?
        } else {
            BTreeMap::new()
        };
        debug!(path = %snapshot_file.display(), keys = entries.len(), "opened fs store");

        Ok(Self {
            snapshot_file,
            inner: MemoryStore::from_entries(entries),
        })
    }

    fn persist(&self) -> StoreResult<()> {
        let snapshot = self.inner.snapshot()?;
        let raw =
            bincode::serialize(&snapshot).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = self.snapshot_file.with_extension("bin.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.snapshot_file)?;
        Ok(())
    }
}

impl OrderedStore for FsStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.inner.put(key, value)?;
        self.persist()
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.inner.delete(key)?;
        self.persist()
    }

    fn apply(&self, batch: &[BatchOp]) -> StoreResult<()> {
        self.inner.apply(batch)?;
        self.persist()
    }

    fn keys(&self, prefix: &[u8]) -> StoreResult<Vec<Vec<u8>>> {
        self.inner.keys(prefix)
    }

    fn close(&self) -> StoreResult<()> {
        self.inner.close()
    }
}

impl std::fmt::Debug for FsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsStore")
            .field("snapshot_file", &self.snapshot_file)
            .field("inner", &self.inner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reopen_restores_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        store.put(b"a", b"1").unwrap();
        store.put(b"b", b"2").unwrap();
        drop(store);

        let reopened = FsStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(reopened.get(b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn delete_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        store.put(b"a", b"1").unwrap();
        store.delete(b"a").unwrap();
        drop(store);

        let reopened = FsStore::open(dir.path()).unwrap();
        assert!(reopened.get(b"a").unwrap().is_none());
    }

    #[test]
    fn open_creates_intermediate_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("deep").join("nested").join("store");
        let store = FsStore::open(&nested).unwrap();
        store.put(b"k", b"v").unwrap();
        assert!(nested.join(SNAPSHOT_FILE_NAME).exists());
    }

    #[test]
    fn batch_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        store
            .apply(&[
                BatchOp::Put {
                    key: b"x".to_vec(),
                    value: b"1".to_vec(),
                },
                BatchOp::Put {
                    key: b"y".to_vec(),
                    value: b"2".to_vec(),
                },
            ])
            .unwrap();
        drop(store);

        let reopened = FsStore::open(dir.path()).unwrap();
        assert_eq!(reopened.keys(b"").unwrap().len(), 2);
    }

    #[test]
    fn operations_after_close_fail() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        store.close().unwrap();
        assert!(matches!(store.put(b"a", b"1"), Err(StoreError::Closed)));
    }
}
