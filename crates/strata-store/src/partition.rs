use std::sync::Arc;

use crate::error::StoreResult;
use crate::traits::{BatchOp, OrderedStore};

/// Fencepost byte separating partition name segments from key material.
///
/// `0xFF` never occurs in valid UTF-8, so string-typed segment names and
/// object keys can never collide with the framing.
const FENCE: u8 = 0xFF;

/// A named, independently enumerable key range within a shared ordered
/// store.
///
/// Partitions are implemented by key prefixing: each nesting level adds a
/// `\xFF<name>\xFF` segment in front of the caller's key. They are cheap,
/// ephemeral views; nothing about the partition itself is persisted, and
/// deriving one performs no I/O.
#[derive(Clone)]
pub struct Partition {
    store: Arc<dyn OrderedStore>,
    prefix: Vec<u8>,
    name: String,
}

impl Partition {
    /// The root view over a store: no prefix, full key space.
    pub fn root(store: Arc<dyn OrderedStore>) -> Self {
        Self {
            store,
            prefix: Vec::new(),
            name: String::new(),
        }
    }

    /// Derive the nested partition with the given name.
    pub fn sublevel(&self, name: &str) -> Partition {
        let mut prefix = Vec::with_capacity(self.prefix.len() + name.len() + 2);
        prefix.extend_from_slice(&self.prefix);
        prefix.push(FENCE);
        prefix.extend_from_slice(name.as_bytes());
        prefix.push(FENCE);
        Partition {
            store: Arc::clone(&self.store),
            prefix,
            name: name.to_string(),
        }
    }

    /// The name of this partition (empty for the root view).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the value stored under `key` within this partition.
    pub fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.store.get(&self.scoped(key))
    }

    /// Write `value` under `key` within this partition.
    pub fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.store.put(&self.scoped(key), value)
    }

    /// Remove `key` from this partition if present.
    pub fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.store.delete(&self.scoped(key))
    }

    /// Atomically apply a batch whose keys are relative to this partition.
    pub fn apply(&self, batch: &[BatchOp]) -> StoreResult<()> {
        let scoped: Vec<BatchOp> = batch
            .iter()
            .map(|op| match op {
                BatchOp::Put { key, value } => BatchOp::Put {
                    key: self.scoped(key),
                    value: value.clone(),
                },
                BatchOp::Delete { key } => BatchOp::Delete {
                    key: self.scoped(key),
                },
            })
            .collect();
        self.store.apply(&scoped)
    }

    /// This partition's direct keys, in ascending order, with the prefix
    /// stripped. Keys belonging to nested sublevels are excluded.
    pub fn keys(&self) -> StoreResult<Vec<Vec<u8>>> {
        let raw = self.store.keys(&self.prefix)?;
        Ok(raw
            .into_iter()
            .map(|key| key[self.prefix.len()..].to_vec())
            .filter(|suffix| suffix.first() != Some(&FENCE))
            .collect())
    }

    /// The absolute key this partition maps `key` to. For composing one
    /// store-level batch across sibling partitions.
    pub(crate) fn scoped(&self, key: &[u8]) -> Vec<u8> {
        let mut scoped = Vec::with_capacity(self.prefix.len() + key.len());
        scoped.extend_from_slice(&self.prefix);
        scoped.extend_from_slice(key);
        scoped
    }

    /// The shared store handle backing this partition.
    pub(crate) fn raw_store(&self) -> &Arc<dyn OrderedStore> {
        &self.store
    }
}

impl std::fmt::Debug for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Partition")
            .field("name", &self.name)
            .field("prefix_len", &self.prefix.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn root() -> Partition {
        Partition::root(Arc::new(MemoryStore::new()))
    }

    // -----------------------------------------------------------------------
    // Scoping and isolation
    // -----------------------------------------------------------------------

    #[test]
    fn sibling_partitions_are_isolated() {
        let root = root();
        let a = root.sublevel("a");
        let b = root.sublevel("b");

        a.put(b"k", b"from-a").unwrap();
        b.put(b"k", b"from-b").unwrap();

        assert_eq!(a.get(b"k").unwrap(), Some(b"from-a".to_vec()));
        assert_eq!(b.get(b"k").unwrap(), Some(b"from-b".to_vec()));
    }

    #[test]
    fn partition_keys_are_invisible_to_the_root_key_space() {
        let root = root();
        let sub = root.sublevel("posts");
        sub.put(b"k", b"v").unwrap();
        root.put(b"direct", b"v").unwrap();

        assert_eq!(root.keys().unwrap(), vec![b"direct".to_vec()]);
        assert!(root.get(b"k").unwrap().is_none());
    }

    #[test]
    fn nested_sublevels_do_not_leak_into_parent_keys() {
        let root = root();
        let posts = root.sublevel("posts");
        posts.put(b"p1", b"body").unwrap();
        posts.sublevel("drafts").put(b"d1", b"draft").unwrap();

        assert_eq!(posts.keys().unwrap(), vec![b"p1".to_vec()]);
    }

    #[test]
    fn same_name_resolves_to_the_same_key_range() {
        let root = root();
        root.sublevel("shared").put(b"k", b"v").unwrap();
        let again = root.sublevel("shared");
        assert_eq!(again.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    #[test]
    fn keys_are_stripped_and_ordered() {
        let root = root();
        let sub = root.sublevel("s");
        sub.put(b"b", b"2").unwrap();
        sub.put(b"a", b"1").unwrap();
        sub.put(b"c", b"3").unwrap();
        assert_eq!(
            sub.keys().unwrap(),
            vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]
        );
    }

    #[test]
    fn apply_scopes_every_op() {
        let root = root();
        let sub = root.sublevel("s");
        sub.put(b"gone", b"x").unwrap();
        sub.apply(&[
            BatchOp::Put {
                key: b"kept".to_vec(),
                value: b"1".to_vec(),
            },
            BatchOp::Delete {
                key: b"gone".to_vec(),
            },
        ])
        .unwrap();

        assert_eq!(sub.get(b"kept").unwrap(), Some(b"1".to_vec()));
        assert!(sub.get(b"gone").unwrap().is_none());
        assert!(root.keys().unwrap().is_empty());
    }

    #[test]
    fn delete_only_touches_this_partition() {
        let root = root();
        let a = root.sublevel("a");
        let b = root.sublevel("b");
        a.put(b"k", b"1").unwrap();
        b.put(b"k", b"2").unwrap();

        a.delete(b"k").unwrap();
        assert!(a.get(b"k").unwrap().is_none());
        assert_eq!(b.get(b"k").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn empty_partition_lists_no_keys() {
        let root = root();
        assert!(root.sublevel("empty").keys().unwrap().is_empty());
    }
}
