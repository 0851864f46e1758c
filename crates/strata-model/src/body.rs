use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved field name carrying the attachments map inside a [`Document`].
///
/// The codec strips this field before the body is stored; it never reaches
/// the objects partition.
pub const ATTACHMENTS_FIELD: &str = "_attachments";

/// An object's serialized field set, excluding attachment payloads.
///
/// One body is stored per object key; later saves overwrite in place.
pub type Body = Map<String, Value>;

/// The full serialized form of a domain object as the modeling layer emits
/// it: a [`Body`] that may still contain the reserved [`ATTACHMENTS_FIELD`]
/// entry (attachment name to `{"body": ...}` payload).
pub type Document = Map<String, Value>;

/// A named byte payload associated with exactly one object key.
///
/// An attachment with an empty payload is a tombstone: its presence in a
/// save signals deletion of the stored attachment rather than storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment name, unique within the owning object's sub-partition.
    pub name: String,
    /// Raw payload bytes. Empty means tombstone.
    pub payload: Vec<u8>,
}

impl Attachment {
    /// Create an attachment from a name and raw payload bytes.
    pub fn new(name: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Create a tombstone for the named attachment.
    pub fn tombstone(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: Vec::new(),
        }
    }

    /// Returns `true` if this attachment marks a deletion.
    pub fn is_tombstone(&self) -> bool {
        self.payload.is_empty()
    }

    /// Decode one entry of the reserved attachments map.
    ///
    /// Payload values are accepted loosely, mirroring what modeling layers
    /// actually emit:
    ///
    /// - a JSON string becomes its UTF-8 bytes
    /// - an array of integers becomes raw bytes (non-integers are dropped)
    /// - an object is unwrapped through its `"body"` field
    /// - anything else (null, absent, numbers, booleans) is a tombstone
    pub fn from_entry(name: &str, value: &Value) -> Self {
        Self {
            name: name.to_string(),
            payload: payload_bytes(value),
        }
    }
}

fn payload_bytes(value: &Value) -> Vec<u8> {
    match value {
        Value::String(s) => s.as_bytes().to_vec(),
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_u64())
            .map(|n| n as u8)
            .collect(),
        Value::Object(map) => map.get("body").map(payload_bytes).unwrap_or_default(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_payload_decodes_to_utf8_bytes() {
        let att = Attachment::from_entry("note", &json!({"body": "hi"}));
        assert_eq!(att.name, "note");
        assert_eq!(att.payload, b"hi");
        assert!(!att.is_tombstone());
    }

    #[test]
    fn byte_array_payload_decodes_raw() {
        let att = Attachment::from_entry("icon", &json!({"body": [0, 255, 16]}));
        assert_eq!(att.payload, vec![0u8, 255, 16]);
    }

    #[test]
    fn bare_string_entry_is_accepted() {
        let att = Attachment::from_entry("note", &json!("hello"));
        assert_eq!(att.payload, b"hello");
    }

    #[test]
    fn empty_string_is_a_tombstone() {
        let att = Attachment::from_entry("note", &json!({"body": ""}));
        assert!(att.is_tombstone());
    }

    #[test]
    fn null_body_is_a_tombstone() {
        let att = Attachment::from_entry("note", &json!({"body": null}));
        assert!(att.is_tombstone());
    }

    #[test]
    fn missing_body_field_is_a_tombstone() {
        let att = Attachment::from_entry("note", &json!({}));
        assert!(att.is_tombstone());
    }

    #[test]
    fn tombstone_constructor_is_empty() {
        let att = Attachment::tombstone("gone");
        assert_eq!(att.name, "gone");
        assert!(att.is_tombstone());
    }
}
