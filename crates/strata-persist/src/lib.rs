//! Persistence adapter mapping keyed domain objects onto an ordered
//! key-value store.
//!
//! A [`Persister`] serves one domain collection. It splits each object's
//! serialized form into a body record and zero or more named attachment
//! payloads, stores them in two logical partitions (bodies in a
//! structured, secondary-indexed partition; attachment bytes in per-key
//! sub-partitions), and recombines them on read. The modeling layer above
//! owns validation and dirty tracking; the store below owns durability.
//! This crate owns only the mapping in between.
//!
//! # Operations
//!
//! - [`Persister::save`] / [`Persister::update`] -- flatten and store
//! - [`Persister::get`] / [`Persister::get_batch`] -- fetch and inflate
//! - [`Persister::merge`] -- shallow patch over the stored body
//! - [`Persister::remove`] / [`Persister::destroy_many`] -- delete with
//!   attachment cleanup
//! - [`Persister::attachment`] and friends -- attachment lifecycle
//! - [`Persister::by`] / [`Persister::find`] -- secondary-index lookups
//!   via [`Finders`]
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::{json, Value};
//! use strata_model::{Body, Model};
//! use strata_persist::{PersistOptions, Persister};
//! use strata_store::MemoryStore;
//!
//! #[derive(Debug, Default)]
//! struct Account {
//!     key: String,
//!     email: String,
//! }
//!
//! impl Model for Account {
//!     fn collection() -> &'static str {
//!         "accounts"
//!     }
//!
//!     fn indexed_fields() -> &'static [&'static str] {
//!         &["email"]
//!     }
//!
//!     fn key(&self) -> &str {
//!         &self.key
//!     }
//!
//!     fn init_from_storage(&mut self, raw: Body) {
//!         if let Some(Value::String(key)) = raw.get("key") {
//!             self.key = key.clone();
//!         }
//!         if let Some(Value::String(email)) = raw.get("email") {
//!             self.email = email.clone();
//!         }
//!     }
//! }
//!
//! # fn main() -> Result<(), strata_persist::PersistError> {
//! let persister: Persister<Account> = Persister::configure(
//!     PersistOptions::new().handles(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new())),
//! )?;
//!
//! let account = Account { key: "a1".into(), email: "a@example.com".into() };
//! let document = json!({"key": "a1", "email": "a@example.com"})
//!     .as_object()
//!     .cloned()
//!     .unwrap();
//! persister.save(&account, document)?;
//!
//! let found = persister.by("email", "a@example.com")?.unwrap();
//! assert_eq!(found.key, "a1");
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod finders;
pub mod persister;

// Re-export primary types at crate root for ergonomic imports.
pub use codec::{flatten, inflate, Flattened};
pub use config::PersistOptions;
pub use error::{PersistError, PersistResult};
pub use finders::Finders;
pub use persister::Persister;
