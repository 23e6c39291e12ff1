//! High-level facade for the tile endpoint.
//!
//! Wires the data flow end to end: style id plus z/x/y in, PNG bytes out.
//! The HTTP layer on top only maps [`Error::classify`] to a status code.
//!
//! [`Error::classify`]: crate::error::Error::classify

use std::sync::Arc;

use crate::coord::TileAddress;
use crate::error::Error;
use crate::registry::StyleRegistry;
use crate::render::{render_tile, RenderEnv};
use crate::store::StyleStore;
use crate::style::{load_concrete, StyleId};

/// Serves rendered tiles for persisted styles.
pub struct TileService {
    registry: Arc<StyleRegistry>,
    store: Arc<dyn StyleStore>,
    env: RenderEnv,
}

impl TileService {
    pub fn new(registry: Arc<StyleRegistry>, store: Arc<dyn StyleStore>, env: RenderEnv) -> Self {
        Self {
            registry,
            store,
            env,
        }
    }

    /// Renders the tile at `z/x/y` for the given style as PNG bytes.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidTileAddress`] for out-of-range addresses,
    /// [`Error::NotFound`] for a missing style, [`Error::Render`] when the
    /// concrete renderer fails.
    pub fn tile(&self, style_id: StyleId, z: u8, x: u32, y: u32) -> Result<Vec<u8>, Error> {
        let loaded = load_concrete(self.store.as_ref(), &self.registry, style_id)?;
        render_tile(loaded.style.as_ref(), TileAddress::new(z, x, y), &self.env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::EditController;
    use crate::layer::{Layer, LayerKind, MemoryLayerStore};
    use crate::store::MemoryStyleStore;
    use serde_json::json;

    fn service_with_style() -> (TileService, StyleId) {
        let registry = Arc::new(StyleRegistry::with_builtins());
        let store: Arc<MemoryStyleStore> = Arc::new(MemoryStyleStore::new());
        let layers = MemoryLayerStore::new();
        layers.insert(Layer::new(7, "DEM", LayerKind::Raster));

        let controller = EditController::new(
            registry.clone(),
            store.clone() as Arc<dyn StyleStore>,
            Arc::new(layers),
        );
        let id = controller.create(7, &json!({ "cls": "raster" })).unwrap();

        let service = TileService::new(registry, store, RenderEnv::default());
        (service, id)
    }

    #[test]
    fn test_tile_returns_png() {
        let (service, id) = service_with_style();
        let bytes = service.tile(id, 1, 0, 0).unwrap();
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 256);
        assert_eq!(decoded.height(), 256);
    }

    #[test]
    fn test_tile_missing_style() {
        let (service, _) = service_with_style();
        let err = service.tile(999, 0, 0, 0).unwrap_err();
        assert!(matches!(err, Error::NotFound { what: "style", id: 999 }));
    }

    #[test]
    fn test_tile_stale_type_tag_is_server_error() {
        use crate::error::ErrorClass;
        use crate::store::StoreTransaction;
        use crate::style::StyleRecord;

        let registry = Arc::new(StyleRegistry::with_builtins());
        let store: Arc<MemoryStyleStore> = Arc::new(MemoryStyleStore::new());

        // A record persisted under a tag the registry no longer carries
        let mut txn = store.begin();
        let id = txn
            .insert(StyleRecord {
                id: 0,
                layer_id: 7,
                display_name: "Orphaned".into(),
                type_tag: "retired".into(),
                data: json!({}),
            })
            .unwrap();
        txn.commit().unwrap();

        let service = TileService::new(registry, store, RenderEnv::default());
        let err = service.tile(id, 0, 0, 0).unwrap_err();
        assert!(matches!(err, Error::UnknownStyleType { stale: true, .. }));
        assert_eq!(err.classify(), ErrorClass::Server);
    }

    #[test]
    fn test_tile_invalid_address() {
        let (service, id) = service_with_style();
        let err = service.tile(id, 2, 0, 4).unwrap_err();
        assert!(matches!(err, Error::InvalidTileAddress(_)));
    }
}
