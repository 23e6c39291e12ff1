//! Generic create/edit orchestration for styles.
//!
//! The controller never knows concrete subtypes: the create path resolves a
//! type tag through the registry, the edit path re-materializes the stored
//! subtype, and both converge on the same describe/populate/commit steps
//! through the [`Style`](crate::style::Style) capability trait.
//!
//! Commits are all-or-nothing: validation failures happen before any store
//! write, and the scoped transaction rolls back on every early exit.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::error::{Error, ValidationError};
use crate::layer::LayerStore;
use crate::registry::StyleRegistry;
use crate::store::{StoreTransaction, StyleStore};
use crate::style::{load_concrete, record_of, FieldDescriptor, StyleId};

/// Create/edit controller generic over all registered style subtypes.
pub struct EditController {
    registry: Arc<StyleRegistry>,
    store: Arc<dyn StyleStore>,
    layers: Arc<dyn LayerStore>,
}

impl EditController {
    pub fn new(
        registry: Arc<StyleRegistry>,
        store: Arc<dyn StyleStore>,
        layers: Arc<dyn LayerStore>,
    ) -> Self {
        Self {
            registry,
            store,
            layers,
        }
    }

    /// Creates a style for a layer.
    ///
    /// The payload's `cls` field selects the subtype; the tag is fixed from
    /// this point on. Returns the newly assigned id.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for a missing layer, [`Error::UnknownStyleType`]
    /// for an unregistered tag, [`Error::UnsupportedForLayer`] when the
    /// subtype refuses the layer, [`Error::Validation`] for a bad payload.
    /// None of these leave a persisted row behind.
    pub fn create(&self, layer_id: u64, payload: &Value) -> Result<StyleId, Error> {
        let layer = self.layers.layer(layer_id)?;

        let type_tag = payload
            .get("cls")
            .and_then(Value::as_str)
            .ok_or_else(|| ValidationError::single("cls", "required to select the style type"))?;

        let descriptor = self.registry.resolve(type_tag)?;
        if !descriptor.supports(&layer) {
            return Err(Error::UnsupportedForLayer {
                type_tag: type_tag.to_string(),
                layer_id,
            });
        }

        let mut style = descriptor.construct(layer.id);
        style.populate(payload)?;

        let mut txn = self.store.begin();
        let id = txn.insert(record_of(style.as_ref()))?;
        txn.commit()?;

        info!(style_id = id, layer_id, type_tag, "style created");
        Ok(id)
    }

    /// Replaces a style's editable fields from a payload.
    ///
    /// The stored `type_tag` stays fixed; payloads trying to change it fail
    /// validation. A concurrent update between load and commit surfaces as
    /// [`Error::Conflict`] and the caller may retry the whole edit.
    pub fn replace(&self, style_id: StyleId, payload: &Value) -> Result<(), Error> {
        let loaded = load_concrete(self.store.as_ref(), &self.registry, style_id)?;
        let mut style = loaded.style;
        style.populate(payload)?;

        let mut txn = self.store.begin();
        txn.update(record_of(style.as_ref()), loaded.version)?;
        txn.commit()?;

        info!(style_id, type_tag = style.type_tag(), "style replaced");
        Ok(())
    }

    /// Serialized payload of a style, as served by the retrieval endpoint.
    pub fn retrieve(&self, style_id: StyleId) -> Result<Value, Error> {
        let loaded = load_concrete(self.store.as_ref(), &self.registry, style_id)?;
        Ok(loaded.style.to_payload())
    }

    /// Deletes a style.
    pub fn delete(&self, style_id: StyleId) -> Result<(), Error> {
        // Resolve first so a missing id reports NotFound before any write
        self.store.get(style_id)?;

        let mut txn = self.store.begin();
        txn.delete(style_id)?;
        txn.commit()?;

        info!(style_id, "style deleted");
        Ok(())
    }

    /// Form description for creating a `type_tag` style on a layer.
    pub fn creation_form(
        &self,
        layer_id: u64,
        type_tag: &str,
    ) -> Result<Vec<FieldDescriptor>, Error> {
        let layer = self.layers.layer(layer_id)?;
        let descriptor = self.registry.resolve(type_tag)?;
        if !descriptor.supports(&layer) {
            return Err(Error::UnsupportedForLayer {
                type_tag: type_tag.to_string(),
                layer_id,
            });
        }
        Ok(descriptor.construct(layer.id).describe_fields())
    }

    /// Form description for editing an existing style.
    pub fn edit_form(&self, style_id: StyleId) -> Result<Vec<FieldDescriptor>, Error> {
        let loaded = load_concrete(self.store.as_ref(), &self.registry, style_id)?;
        Ok(loaded.style.describe_fields())
    }
}
