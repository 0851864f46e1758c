//! The flatten/inflate codec between serialized documents and stored
//! bodies.
//!
//! Both directions are pure: no I/O, no failure modes. A document with no
//! attachments map flattens to an empty attachment list, and a malformed
//! body inflates without complaint -- field validation belongs to the
//! modeling layer, not here.

use serde_json::Value;

use strata_model::{Attachment, Body, Document, Model, ATTACHMENTS_FIELD};

/// A document split into its storable parts.
#[derive(Clone, Debug, PartialEq)]
pub struct Flattened {
    /// The field set to store under the object key.
    pub body: Body,
    /// Named payloads (and tombstones) bound for the key's attachment
    /// sub-partition.
    pub attachments: Vec<Attachment>,
}

/// Split a serialized document into a body and its attachment list.
///
/// The reserved attachments field is removed from the body whatever its
/// shape; only an object-valued map contributes attachments.
pub fn flatten(mut document: Document) -> Flattened {
    let mut attachments = Vec::new();
    if let Some(Value::Object(map)) = document.remove(ATTACHMENTS_FIELD) {
        for (name, entry) in &map {
            attachments.push(Attachment::from_entry(name, entry));
        }
    }
    Flattened {
        body: document,
        attachments,
    }
}

/// Rehydrate a stored body into a live domain object.
///
/// `None` in means not found, `None` out. Properties are copied as-is by
/// the model's own `init_from_storage`; schema mismatches never fail.
pub fn inflate<M: Model>(body: Option<Body>) -> Option<M> {
    body.map(|raw| {
        let mut object = M::default();
        object.init_from_storage(raw);
        object
    })
}
