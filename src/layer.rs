//! Layer collaborator surface.
//!
//! Layers live in an external subsystem; this module defines the minimal
//! view the style core needs: a lookup by id and the hook that lets a
//! layer's UI enumerate which style subtypes can be created for it.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::registry::StyleRegistry;

/// Kind of data a layer carries, used by subtype support predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Raster,
    Vector,
}

/// Read-only view of a layer owned by the external layer subsystem.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: u64,
    pub display_name: String,
    pub kind: LayerKind,
}

impl Layer {
    pub fn new(id: u64, display_name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            kind,
        }
    }
}

/// Lookup interface into the layer subsystem.
pub trait LayerStore: Send + Sync {
    /// Fetch a layer by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no such layer exists.
    fn layer(&self, id: u64) -> Result<Layer, Error>;
}

/// One creation choice offered for a layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleChoice {
    pub type_tag: &'static str,
    pub label: &'static str,
}

/// Enumerates the style subtypes that can be created for `layer`.
///
/// This is the hook the layer's UI surface uses to build its "add style"
/// menu; choices appear in registry registration order.
pub fn style_choices_for(registry: &StyleRegistry, layer: &Layer) -> Vec<StyleChoice> {
    registry
        .list_supporting(layer)
        .map(|desc| StyleChoice {
            type_tag: desc.type_tag(),
            label: desc.label(),
        })
        .collect()
}

/// In-memory layer store used by tests and examples.
#[derive(Default)]
pub struct MemoryLayerStore {
    layers: RwLock<HashMap<u64, Layer>>,
}

impl MemoryLayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, layer: Layer) {
        self.layers
            .write()
            .expect("layer store lock poisoned")
            .insert(layer.id, layer);
    }
}

impl LayerStore for MemoryLayerStore {
    fn layer(&self, id: u64) -> Result<Layer, Error> {
        self.layers
            .read()
            .expect("layer store lock poisoned")
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound { what: "layer", id })
    }
}
