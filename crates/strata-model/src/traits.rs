//! The [`Model`] trait defining what a domain type must expose to be
//! persisted, and the [`Target`] argument type for delete paths.

use crate::body::Body;

/// Capability trait for domain types stored through a persister.
///
/// Implementations must satisfy these invariants:
/// - `key()` returns the caller-assigned object key; an empty key means the
///   object has not been keyed yet and cannot be saved.
/// - `init_from_storage` is raw rehydration: it must accept arbitrary field
///   maps without validation and must not fail on unknown, missing, or
///   mistyped fields. Fields it does not recognize are simply ignored.
/// - `collection()` and `indexed_fields()` are static declarations; they
///   are read once at configuration time.
pub trait Model: Default {
    /// Default collection name for this type (conventionally plural).
    fn collection() -> &'static str;

    /// Field names to maintain secondary indexes for.
    fn indexed_fields() -> &'static [&'static str] {
        &[]
    }

    /// The object key, assigned by the caller before first save.
    fn key(&self) -> &str;

    /// Initialize this instance directly from a stored body map, bypassing
    /// validated construction.
    fn init_from_storage(&mut self, raw: Body);
}

/// A delete-path argument that is either a bare key or a live object.
///
/// Callers say explicitly which one they hold instead of one argument
/// doing double duty.
#[derive(Clone, Copy, Debug)]
pub enum Target<'a, M: Model> {
    /// A bare object key.
    Key(&'a str),
    /// A live domain object; its key is used.
    Object(&'a M),
}

impl<'a, M: Model> Target<'a, M> {
    /// The object key this target names.
    pub fn key(&self) -> &str {
        match self {
            Target::Key(key) => key,
            Target::Object(object) => object.key(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[derive(Debug, Default)]
    struct Gadget {
        key: String,
        label: String,
    }

    impl Model for Gadget {
        fn collection() -> &'static str {
            "gadgets"
        }

        fn key(&self) -> &str {
            &self.key
        }

        fn init_from_storage(&mut self, raw: Body) {
            if let Some(Value::String(key)) = raw.get("key") {
                self.key = key.clone();
            }
            if let Some(Value::String(label)) = raw.get("label") {
                self.label = label.clone();
            }
        }
    }

    #[test]
    fn target_key_resolves_both_variants() {
        let gadget = Gadget {
            key: "g1".into(),
            label: "widget".into(),
        };
        assert_eq!(Target::<Gadget>::Key("raw").key(), "raw");
        assert_eq!(Target::Object(&gadget).key(), "g1");
    }

    #[test]
    fn init_from_storage_ignores_unknown_fields() {
        let mut raw = Body::new();
        raw.insert("key".into(), Value::String("g2".into()));
        raw.insert("bogus".into(), Value::Bool(true));
        raw.insert("label".into(), Value::Number(7.into()));

        let mut gadget = Gadget::default();
        gadget.init_from_storage(raw);
        assert_eq!(gadget.key, "g2");
        // Mistyped label left at its default.
        assert_eq!(gadget.label, "");
    }

    #[test]
    fn default_model_declares_no_indexes() {
        assert!(Gadget::indexed_fields().is_empty());
    }
}
