use std::sync::Arc;

use tracing::debug;

use strata_model::{Attachment, Body, Document, Model, Target};
use strata_store::{BatchOp, IndexedPartition, OrderedStore, Partition};

use crate::codec::{flatten, inflate};
use crate::config::PersistOptions;
use crate::error::{PersistError, PersistResult};
use crate::finders::Finders;

/// The persistence adapter for one domain collection.
///
/// A persister owns two logical partitions carved out of its configured
/// stores: one for object bodies (with secondary-index maintenance) and
/// one for attachment bytes, sub-partitioned per object key. All
/// operations are synchronous and return explicit results; plain read
/// misses are `Ok(None)`, never errors.
///
/// The body write and the attachment batch inside [`save`](Self::save)
/// commit separately: a crash between the two leaves the body updated and
/// the attachments stale. The two partitions may live on different store
/// handles, so no single batch can span them.
pub struct Persister<M: Model> {
    db: Arc<dyn OrderedStore>,
    attachdb: Arc<dyn OrderedStore>,
    dbname: String,
    objects: Arc<IndexedPartition>,
    attachments: Partition,
    finders: Finders<M>,
}

impl<M: Model> Persister<M> {
    /// Resolve the configured stores, derive the collection's partitions,
    /// and bind the declared index fields.
    pub fn configure(options: PersistOptions) -> PersistResult<Self> {
        let opened = options.open(M::collection())?;
        let objects = Arc::new(IndexedPartition::new(
            Partition::root(Arc::clone(&opened.db)).sublevel(&opened.dbname),
        ));
        let attachments = Partition::root(Arc::clone(&opened.attachdb)).sublevel(&opened.dbname);
        let finders = Finders::bind(Arc::clone(&objects));

        debug!(
            collection = %opened.dbname,
            indexes = M::indexed_fields().len(),
            "configured persister"
        );
        Ok(Self {
            db: opened.db,
            attachdb: opened.attachdb,
            dbname: opened.dbname,
            objects,
            attachments,
            finders,
        })
    }

    /// The collection name this persister serves.
    pub fn collection(&self) -> &str {
        &self.dbname
    }

    /// The typed index lookups bound to this collection.
    pub fn finders(&self) -> &Finders<M> {
        &self.finders
    }

    /// The attachment sub-partition scoped to one object key.
    fn attachments_for(&self, key: &str) -> Partition {
        self.attachments.sublevel(key)
    }

    // ---------------------------------------------------------------
    // Save / read
    // ---------------------------------------------------------------

    /// Store an object's serialized form: the body under its key, and the
    /// flattened attachments as one batch against the key's sub-partition
    /// (puts for payloads, deletes for tombstones).
    ///
    /// Fails with [`PersistError::MissingKey`] before any I/O if the
    /// object has no key.
    pub fn save(&self, object: &M, document: Document) -> PersistResult<()> {
        let key = object.key();
        if key.is_empty() {
            return Err(PersistError::MissingKey);
        }

        let flat = flatten(document);
        self.objects.put_body(key, &flat.body)?;

        if flat.attachments.is_empty() {
            return Ok(());
        }
        let ops: Vec<BatchOp> = flat
            .attachments
            .iter()
            .map(|attachment| {
                if attachment.is_tombstone() {
                    BatchOp::Delete {
                        key: attachment.name.as_bytes().to_vec(),
                    }
                } else {
                    BatchOp::Put {
                        key: attachment.name.as_bytes().to_vec(),
                        value: attachment.payload.clone(),
                    }
                }
            })
            .collect();
        self.attachments_for(key).apply(&ops)?;

        debug!(key, attachments = ops.len(), "saved object");
        Ok(())
    }

    /// Alias of [`save`](Self::save): stored bodies are overwritten in
    /// place, so an update is a save.
    pub fn update(&self, object: &M, document: Document) -> PersistResult<()> {
        self.save(object, document)
    }

    /// Fetch one object by key. A miss is `Ok(None)`.
    pub fn get(&self, key: &str) -> PersistResult<Option<M>> {
        Ok(inflate(self.objects.get_body(key)?))
    }

    /// Fetch many objects, strictly one at a time in input order. Missing
    /// keys are omitted from the result; the first real error aborts the
    /// whole batch.
    pub fn get_batch<K: AsRef<str>>(&self, keys: &[K]) -> PersistResult<Vec<M>> {
        let mut found = Vec::new();
        for key in keys {
            if let Some(body) = self.objects.get_body(key.as_ref())? {
                found.extend(inflate(Some(body)));
            }
        }
        Ok(found)
    }

    /// Shallow-overlay `patch` onto the stored body (patch wins on
    /// conflicts) and write the result back. Requires an existing record;
    /// a miss is [`PersistError::NotFound`]. Attachments are untouched.
    pub fn merge(&self, key: &str, patch: Body) -> PersistResult<()> {
        let mut body = self
            .objects
            .get_body(key)?
            .ok_or_else(|| PersistError::NotFound {
                collection: self.dbname.clone(),
                key: key.to_string(),
            })?;
        for (field, value) in patch {
            body.insert(field, value);
        }
        Ok(self.objects.put_body(key, &body)?)
    }

    // ---------------------------------------------------------------
    // Remove / destroy
    // ---------------------------------------------------------------

    /// Delete the body under the target's key, then unconditionally clean
    /// up its attachment sub-partition -- even if the body never existed.
    pub fn remove(&self, target: Target<'_, M>) -> PersistResult<()> {
        let key = target.key();
        self.objects.delete_body(key)?;
        self.remove_attachments_for(key)?;
        debug!(key, "removed object");
        Ok(())
    }

    /// Delete every listed object: one attachment-cleanup task per member
    /// plus one batch deleting all bodies, fanned out concurrently. The
    /// first failure is surfaced and completed work is not rolled back.
    ///
    /// Resolves to the input length; members that were already absent are
    /// not distinguished from deleted ones.
    pub fn destroy_many(&self, targets: &[Target<'_, M>]) -> PersistResult<usize> {
        let keys: Vec<&str> = targets.iter().map(Target::key).collect();

        std::thread::scope(|scope| {
            let cleanups: Vec<_> = keys
                .iter()
                .map(|&key| scope.spawn(move || self.remove_attachments_for(key)))
                .collect();
            let bodies =
                scope.spawn(|| self.objects.delete_many(&keys).map_err(PersistError::from));

            let mut first_error = None;
            for handle in cleanups {
                let result = match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                };
                if let Err(e) = result {
                    first_error.get_or_insert(e);
                }
            }
            let result = match bodies.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            };
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }

            match first_error {
                Some(error) => Err(error),
                None => Ok(()),
            }
        })?;

        debug!(count = targets.len(), "destroyed objects");
        Ok(targets.len())
    }

    /// Enumerate the key's attachment sub-partition and delete everything
    /// in one batch. An empty sub-partition succeeds with no write I/O.
    pub fn remove_attachments_for(&self, key: &str) -> PersistResult<()> {
        let sub = self.attachments_for(key);
        let names = sub.keys()?;
        if names.is_empty() {
            return Ok(());
        }
        let ops: Vec<BatchOp> = names
            .into_iter()
            .map(|name| BatchOp::Delete { key: name })
            .collect();
        sub.apply(&ops)?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Attachments
    // ---------------------------------------------------------------

    /// Read one attachment payload. A miss is `Ok(None)`.
    pub fn attachment(&self, key: &str, name: &str) -> PersistResult<Option<Vec<u8>>> {
        Ok(self.attachments_for(key).get(name.as_bytes())?)
    }

    /// Store one attachment payload. The body is not touched.
    pub fn save_attachment(&self, object: &M, attachment: &Attachment) -> PersistResult<()> {
        let key = object.key();
        if key.is_empty() {
            return Err(PersistError::MissingKey);
        }
        self.attachments_for(key)
            .put(attachment.name.as_bytes(), &attachment.payload)?;
        Ok(())
    }

    /// Delete one attachment. The body is not touched.
    pub fn remove_attachment(&self, object: &M, name: &str) -> PersistResult<()> {
        let key = object.key();
        if key.is_empty() {
            return Err(PersistError::MissingKey);
        }
        self.attachments_for(key).delete(name.as_bytes())?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Enumeration and finders
    // ---------------------------------------------------------------

    /// Every object key in the collection, in ascending order.
    pub fn all_keys(&self) -> PersistResult<Vec<String>> {
        Ok(self
            .objects
            .keys()?
            .into_iter()
            .map(|key| String::from_utf8_lossy(&key).into_owned())
            .collect())
    }

    /// Look one object up by a declared index field.
    pub fn by(&self, field: &str, value: impl Into<serde_json::Value>) -> PersistResult<Option<M>> {
        self.finders.by(field, value)
    }

    /// Query by arbitrary field/value pairs; at least one must be a
    /// declared index field.
    pub fn find(&self, query: &Body) -> PersistResult<Option<M>> {
        self.finders.find(query)
    }

    // ---------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------

    /// Reserved for collaborators needing schema setup; nothing to do
    /// here.
    pub fn provision(&self) -> PersistResult<()> {
        Ok(())
    }

    /// Close the objects store, then the attachment store. Both closes
    /// are attempted; the first error is surfaced.
    pub fn shutdown(&self) -> PersistResult<()> {
        debug!(collection = %self.dbname, "shutting down persister");
        let objects = self.db.close();
        let attachments = self.attachdb.close();
        objects?;
        attachments?;
        Ok(())
    }
}

impl<M: Model> std::fmt::Debug for Persister<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persister")
            .field("collection", &self.dbname)
            .field("finders", &self.finders)
            .finish()
    }
}
