use std::collections::BTreeSet;
use std::sync::RwLock;

use serde_json::Value;
use tracing::{debug, warn};

use strata_model::Body;

use crate::error::{StoreError, StoreResult};
use crate::partition::Partition;
use crate::traits::{BatchOp, OrderedStore};

/// Reserved sublevel holding index entries. The fencepost framing keeps it
/// disjoint from every possible object key.
const INDEX_SUBLEVEL: &str = ".idx";

/// Separator between the field name and the canonical value in an index
/// entry key. `0xFF` cannot occur in either side (both are UTF-8).
const SEP: u8 = 0xFF;

/// A partition of JSON-encoded object bodies with secondary-index
/// maintenance.
///
/// For every registered field, a body write keeps one index entry of the
/// form `field \xFF canonical(value) -> object key` in a reserved sublevel.
/// Index maintenance rides in the same atomic batch as the body mutation,
/// so the index can never observe a half-applied write.
///
/// One object key is kept per (field, value) pair; when two objects share
/// a value the later write wins, matching the lookup contract of returning
/// a single record.
pub struct IndexedPartition {
    data: Partition,
    index: Partition,
    fields: RwLock<BTreeSet<String>>,
}

impl IndexedPartition {
    /// Wrap a partition, reserving its `.idx` sublevel for index entries.
    pub fn new(partition: Partition) -> Self {
        let index = partition.sublevel(INDEX_SUBLEVEL);
        Self {
            data: partition,
            index,
            fields: RwLock::new(BTreeSet::new()),
        }
    }

    /// Declare a secondary index on `field`. Re-registering is a no-op.
    pub fn register(&self, field: &str) {
        let mut fields = self.fields.write().expect("lock poisoned");
        if fields.insert(field.to_string()) {
            debug!(partition = self.data.name(), field, "registered index");
        }
    }

    /// Returns `true` if `field` has a registered index.
    pub fn is_registered(&self, field: &str) -> bool {
        self.fields.read().expect("lock poisoned").contains(field)
    }

    /// Read the body stored under `key`.
    pub fn get_body(&self, key: &str) -> StoreResult<Option<Body>> {
        match self.data.get(key.as_bytes())? {
            None => Ok(None),
            Some(raw) => decode_body(key, &raw).map(Some),
        }
    }

    /// Write `body` under `key`, maintaining index entries for every
    /// registered field in the same atomic batch.
    pub fn put_body(&self, key: &str, body: &Body) -> StoreResult<()> {
        let raw = serde_json::to_vec(body).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let old = self.lenient_body(key)?;

        let mut batch = self.index_delta(key, old.as_ref(), Some(body))?;
        batch.push(BatchOp::Put {
            key: self.data.scoped(key.as_bytes()),
            value: raw,
        });
        self.data.raw_store().apply(&batch)
    }

    /// Delete the body under `key` and its index entries. Deleting a
    /// missing key is a no-op.
    pub fn delete_body(&self, key: &str) -> StoreResult<()> {
        let old = self.lenient_body(key)?;
        let mut batch = self.index_delta(key, old.as_ref(), None)?;
        batch.push(BatchOp::Delete {
            key: self.data.scoped(key.as_bytes()),
        });
        self.data.raw_store().apply(&batch)
    }

    /// Delete many bodies (and their index entries) in one atomic batch.
    pub fn delete_many(&self, keys: &[&str]) -> StoreResult<()> {
        let mut batch = Vec::new();
        for key in keys {
            let old = self.lenient_body(key)?;
            batch.extend(self.index_delta(key, old.as_ref(), None)?);
            batch.push(BatchOp::Delete {
                key: self.data.scoped(key.as_bytes()),
            });
        }
        debug!(partition = self.data.name(), count = keys.len(), "batch delete");
        self.data.raw_store().apply(&batch)
    }

    /// Resolve an indexed field value to its object's body.
    ///
    /// Errors with `StoreError::NotIndexed` if `field` was never
    /// registered; a dangling index entry resolves to `Ok(None)`.
    pub fn lookup(&self, field: &str, value: &Value) -> StoreResult<Option<Body>> {
        if !self.is_registered(field) {
            return Err(StoreError::NotIndexed(field.to_string()));
        }
        let entry = entry_key(field, value);
        let Some(key_bytes) = self.index.get(&entry)? else {
            return Ok(None);
        };
        let key = String::from_utf8_lossy(&key_bytes).into_owned();
        self.get_body(&key)
    }

    /// Query by arbitrary field/value pairs.
    ///
    /// The first registered field in the query drives the index probe;
    /// every other pair is checked against the loaded body. A query with
    /// no registered field errors with `StoreError::NotIndexed`.
    pub fn find(&self, query: &Body) -> StoreResult<Option<Body>> {
        let probe = query
            .iter()
            .find(|(field, value)| self.is_registered(field.as_str()) && !value.is_null());
        let Some((field, value)) = probe else {
            let named = query.keys().next().cloned().unwrap_or_default();
            return Err(StoreError::NotIndexed(named));
        };

        let Some(body) = self.lookup(field, value)? else {
            return Ok(None);
        };
        for (field, value) in query {
            if body.get(field) != Some(value) {
                return Ok(None);
            }
        }
        Ok(Some(body))
    }

    /// Object keys in this partition, ascending. Index entries never
    /// appear here.
    pub fn keys(&self) -> StoreResult<Vec<Vec<u8>>> {
        self.data.keys()
    }

    /// Like `get_body`, but a corrupt predecessor only logs: it must not
    /// block an overwrite or delete, merely its own index cleanup.
    fn lenient_body(&self, key: &str) -> StoreResult<Option<Body>> {
        match self.data.get(key.as_bytes())? {
            None => Ok(None),
            Some(raw) => match decode_body(key, &raw) {
                Ok(body) => Ok(Some(body)),
                Err(e) => {
                    warn!(key, error = %e, "unreadable previous body; skipping index cleanup");
                    Ok(None)
                }
            },
        }
    }

    /// Index-entry operations that take an object from `old` to `new`.
    ///
    /// Stale entries are removed only when they still point at this key,
    /// so deleting an object whose indexed value was since claimed by
    /// another object leaves the newer mapping intact.
    fn index_delta(
        &self,
        key: &str,
        old: Option<&Body>,
        new: Option<&Body>,
    ) -> StoreResult<Vec<BatchOp>> {
        let fields = self.fields.read().expect("lock poisoned").clone();
        let mut batch = Vec::new();

        for field in &fields {
            let old_value = old.and_then(|b| b.get(field)).filter(|v| !v.is_null());
            let new_value = new.and_then(|b| b.get(field)).filter(|v| !v.is_null());
            if old_value == new_value && new_value.is_some() {
                continue;
            }

            if let Some(value) = old_value {
                let entry = entry_key(field, value);
                if self.index.get(&entry)?.as_deref() == Some(key.as_bytes()) {
                    batch.push(BatchOp::Delete {
                        key: self.index.scoped(&entry),
                    });
                }
            }
            if let Some(value) = new_value {
                batch.push(BatchOp::Put {
                    key: self.index.scoped(&entry_key(field, value)),
                    value: key.as_bytes().to_vec(),
                });
            }
        }
        Ok(batch)
    }
}

impl std::fmt::Debug for IndexedPartition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields = self.fields.read().expect("lock poisoned");
        f.debug_struct("IndexedPartition")
            .field("partition", &self.data.name())
            .field("indexed_fields", &fields.len())
            .finish()
    }
}

/// Canonical index representation of a field value: strings index as
/// themselves, everything else as its compact JSON encoding.
fn canonical(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn entry_key(field: &str, value: &Value) -> Vec<u8> {
    let canon = canonical(value);
    let mut key = Vec::with_capacity(field.len() + canon.len() + 1);
    key.extend_from_slice(field.as_bytes());
    key.push(SEP);
    key.extend_from_slice(canon.as_bytes());
    key
}

fn decode_body(key: &str, raw: &[u8]) -> StoreResult<Body> {
    serde_json::from_slice(raw).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
