//! Tilestyle - tile rendering core for layer-bound polymorphic map styles
//!
//! A "style" is a rendering rule bound to a geographic layer whose concrete
//! behavior depends on a string type tag resolved through a process-wide
//! registry. This crate provides the tile-coordinate transform, the subtype
//! registry, the render pipeline producing PNG tiles, and the generic
//! create/edit controller — everything between an HTTP layer and the
//! persistence engine, both of which stay external.
//!
//! # High-Level API
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use tilestyle::controller::EditController;
//! use tilestyle::layer::{Layer, LayerKind, MemoryLayerStore};
//! use tilestyle::registry::StyleRegistry;
//! use tilestyle::render::RenderEnv;
//! use tilestyle::service::TileService;
//! use tilestyle::store::{MemoryStyleStore, StyleStore};
//!
//! let registry = Arc::new(StyleRegistry::with_builtins());
//! let store: Arc<MemoryStyleStore> = Arc::new(MemoryStyleStore::new());
//! let layers = MemoryLayerStore::new();
//! layers.insert(Layer::new(7, "Elevation", LayerKind::Raster));
//!
//! let controller = EditController::new(
//!     registry.clone(),
//!     store.clone() as Arc<dyn StyleStore>,
//!     Arc::new(layers),
//! );
//! let style_id = controller
//!     .create(7, &json!({ "cls": "raster", "display_name": "Hillshade" }))
//!     .unwrap();
//!
//! let tiles = TileService::new(registry, store, RenderEnv::default());
//! let png = tiles.tile(style_id, 1, 0, 0).unwrap();
//! assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
//! ```

pub mod controller;
pub mod coord;
pub mod error;
pub mod layer;
pub mod logging;
pub mod registry;
pub mod render;
pub mod service;
pub mod store;
pub mod style;

pub use error::{Error, ErrorClass};

/// Version of the tilestyle library.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
