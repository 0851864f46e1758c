//! Domain-model contracts for Strata.
//!
//! This crate defines the surface a domain type must expose so a
//! [`strata-persist`] persister can store and rehydrate it. It carries no
//! I/O of its own; everything here is plain data plus one capability trait.
//!
//! # Key Types
//!
//! - [`Body`] -- an object's serialized fields, excluding attachment payloads
//! - [`Document`] -- the full serialized form as emitted by the modeling
//!   layer, possibly still carrying the reserved attachments map
//! - [`Attachment`] -- a named byte payload tied to one object key
//! - [`Model`] -- the capability trait for keyed, rehydratable domain types
//! - [`Target`] -- an explicit "object or key" argument for delete paths
//!
//! [`strata-persist`]: https://github.com/strata-kv/strata

pub mod body;
pub mod traits;

pub use body::{Attachment, Body, Document, ATTACHMENTS_FIELD};
pub use traits::{Model, Target};
