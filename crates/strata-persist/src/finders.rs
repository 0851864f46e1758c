//! Secondary-index lookups bound to a domain type.
//!
//! Lookups go through an explicit registration table: built once at
//! configure time from the model's declared index fields, consulted by
//! name afterwards. Each lookup reads the raw body from the objects
//! partition and inflates it before returning.

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use strata_model::{Body, Model};
use strata_store::IndexedPartition;

use crate::codec::inflate;
use crate::error::{lift, PersistError, PersistResult};

/// Typed index lookups for one collection.
pub struct Finders<M: Model> {
    objects: Arc<IndexedPartition>,
    fields: &'static [&'static str],
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Finders<M> {
    /// Register the model's declared index fields with the objects
    /// partition and record them in the table. Duplicate declarations
    /// are idempotent.
    pub(crate) fn bind(objects: Arc<IndexedPartition>) -> Self {
        for field in M::indexed_fields() {
            objects.register(field);
        }
        Self {
            objects,
            fields: M::indexed_fields(),
            _model: PhantomData,
        }
    }

    /// The declared index fields, in declaration order.
    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    /// Look one object up by a declared index field.
    pub fn by(&self, field: &str, value: impl Into<Value>) -> PersistResult<Option<M>> {
        if !self.fields.iter().any(|declared| *declared == field) {
            return Err(PersistError::NotIndexed(field.to_string()));
        }
        let body = self.objects.lookup(field, &value.into()).map_err(lift)?;
        Ok(inflate(body))
    }

    /// Query by arbitrary field/value pairs; at least one must be a
    /// declared index field.
    pub fn find(&self, query: &Body) -> PersistResult<Option<M>> {
        let body = self.objects.find(query).map_err(lift)?;
        Ok(inflate(body))
    }
}

impl<M: Model> std::fmt::Debug for Finders<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Finders")
            .field("collection", &M::collection())
            .field("fields", &self.fields)
            .finish()
    }
}
