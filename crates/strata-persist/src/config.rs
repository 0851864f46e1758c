use std::path::PathBuf;
use std::sync::Arc;

use strata_store::{FsStore, OrderedStore};

use crate::error::{PersistError, PersistResult};

/// Subdirectory of a `path` configuration holding the attachment store.
const ATTACHMENTS_DIR: &str = "attachments";

/// Open parameters for a [`Persister`](crate::Persister).
///
/// Exactly one of [`handles`](Self::handles) or [`path`](Self::path) must
/// be supplied; anything else fails with
/// [`PersistError::Configuration`] before any store is touched. The
/// collection name defaults to the model's own declaration and can be
/// overridden with [`dbname`](Self::dbname).
#[derive(Default)]
pub struct PersistOptions {
    db: Option<Arc<dyn OrderedStore>>,
    attachdb: Option<Arc<dyn OrderedStore>>,
    dbpath: Option<PathBuf>,
    dbname: Option<String>,
}

impl PersistOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use two pre-opened store handles: one for object bodies, one for
    /// attachment bytes.
    pub fn handles(mut self, db: Arc<dyn OrderedStore>, attachdb: Arc<dyn OrderedStore>) -> Self {
        self.db = Some(db);
        self.attachdb = Some(attachdb);
        self
    }

    /// Open filesystem-backed stores rooted at `path`; attachments live
    /// under `path/attachments`. Intermediate directories are created.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dbpath = Some(path.into());
        self
    }

    /// Override the collection name.
    pub fn dbname(mut self, name: impl Into<String>) -> Self {
        self.dbname = Some(name.into());
        self
    }

    /// Validate and resolve the configured stores.
    pub(crate) fn open(self, default_name: &str) -> PersistResult<Opened> {
        let dbname = self.dbname.unwrap_or_else(|| default_name.to_string());

        match (self.db, self.attachdb, self.dbpath) {
            (Some(_), Some(_), Some(_)) => Err(PersistError::Configuration(
                "specify either store handles or a dbpath, not both".into(),
            )),
            (Some(db), Some(attachdb), None) => Ok(Opened {
                db,
                attachdb,
                dbname,
            }),
            (Some(_), None, _) | (None, Some(_), _) => Err(PersistError::Configuration(
                "store handles must be given as a (db, attachdb) pair".into(),
            )),
            (None, None, Some(path)) => {
                let db = FsStore::open(&path)?;
                let attachdb = FsStore::open(path.join(ATTACHMENTS_DIR))?;
                Ok(Opened {
                    db: Arc::new(db),
                    attachdb: Arc::new(attachdb),
                    dbname,
                })
            }
            _ => Err(PersistError::Configuration(
                "you must specify either a (db, attachdb) pair or a dbpath".into(),
            )),
        }
    }
}

impl std::fmt::Debug for PersistOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistOptions")
            .field("handles", &self.db.is_some())
            .field("dbpath", &self.dbpath)
            .field("dbname", &self.dbname)
            .finish()
    }
}

/// The resolved configuration: two open stores and a collection name.
pub(crate) struct Opened {
    pub db: Arc<dyn OrderedStore>,
    pub attachdb: Arc<dyn OrderedStore>,
    pub dbname: String,
}

impl std::fmt::Debug for Opened {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Opened")
            .field("dbname", &self.dbname)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_store::MemoryStore;

    fn handle() -> Arc<dyn OrderedStore> {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn neither_source_is_rejected() {
        let err = PersistOptions::new().open("things").unwrap_err();
        assert!(matches!(err, PersistError::Configuration(_)));
    }

    #[test]
    fn both_sources_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = PersistOptions::new()
            .handles(handle(), handle())
            .path(dir.path())
            .open("things")
            .unwrap_err();
        assert!(matches!(err, PersistError::Configuration(_)));
    }

    #[test]
    fn half_a_handle_pair_is_rejected() {
        let opts = PersistOptions {
            db: Some(handle()),
            ..PersistOptions::default()
        };
        let err = opts.open("things").unwrap_err();
        assert!(matches!(err, PersistError::Configuration(_)));
    }

    #[test]
    fn handles_resolve_with_default_name() {
        let opened = PersistOptions::new()
            .handles(handle(), handle())
            .open("things")
            .unwrap();
        assert_eq!(opened.dbname, "things");
    }

    #[test]
    fn dbname_overrides_the_default() {
        let opened = PersistOptions::new()
            .handles(handle(), handle())
            .dbname("archive")
            .open("things")
            .unwrap();
        assert_eq!(opened.dbname, "archive");
    }

    #[test]
    fn path_opens_both_stores() {
        let dir = tempfile::tempdir().unwrap();
        let opened = PersistOptions::new().path(dir.path()).open("things").unwrap();
        opened.db.put(b"k", b"v").unwrap();
        opened.attachdb.put(b"k", b"v").unwrap();
        assert!(dir.path().join(ATTACHMENTS_DIR).is_dir());
    }
}
