//! Ordered key-value layer for Strata.
//!
//! This crate defines the contract a storage engine must satisfy and the
//! namespacing machinery layered on top of it. The engine itself is a
//! black box: anything that can get/put/delete bytes by ordered key,
//! apply an atomic batch, and enumerate a prefix qualifies.
//!
//! # Layers
//!
//! - [`OrderedStore`] -- the engine contract ([`BatchOp`] for batches)
//! - [`Partition`] -- named sublevel views by key prefixing; cheap,
//!   ephemeral, arbitrarily nestable
//! - [`IndexedPartition`] -- JSON bodies plus secondary-index maintenance
//!   and lookup, riding the same atomic batches as the body writes
//!
//! # Backends
//!
//! - [`MemoryStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`FsStore`] -- snapshot-file persistence for single-process use
//!
//! # Design Rules
//!
//! 1. A read miss is `Ok(None)`, never an error.
//! 2. Deletes are idempotent.
//! 3. Batches are atomic within one store handle; nothing is promised
//!    across two handles.
//! 4. Partition framing uses `0xFF` fenceposts, which valid UTF-8 names
//!    and keys can never contain.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod indexed;
pub mod memory;
pub mod partition;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use fs::FsStore;
pub use indexed::IndexedPartition;
pub use memory::MemoryStore;
pub use partition::Partition;
pub use traits::{BatchOp, OrderedStore};
