//! Style subtype registry
//!
//! Maps a string type tag to a subtype descriptor: constructor, layer
//! support predicate, and display label. The registry is populated once at
//! process initialization and read-only afterwards, so request handlers can
//! share it (`Arc<StyleRegistry>`) and resolve tags concurrently without
//! locking.
//!
//! # Example
//!
//! ```
//! use tilestyle::registry::StyleRegistry;
//!
//! let registry = StyleRegistry::with_builtins();
//! let desc = registry.resolve("raster").unwrap();
//! assert_eq!(desc.label(), "Raster style");
//! ```

use std::collections::HashMap;

use crate::error::Error;
use crate::layer::Layer;
use crate::style::Style;

/// Constructs an empty concrete style instance bound to a layer.
pub type StyleConstructor = fn(layer_id: u64) -> Box<dyn Style>;

/// Decides whether a subtype may be created for the given layer.
pub type SupportPredicate = fn(&Layer) -> bool;

/// Descriptor of one registered style subtype.
pub struct StyleDescriptor {
    type_tag: &'static str,
    label: &'static str,
    constructor: StyleConstructor,
    supports: SupportPredicate,
}

impl StyleDescriptor {
    /// The string discriminator persisted on style records.
    pub fn type_tag(&self) -> &'static str {
        self.type_tag
    }

    /// Human-readable name shown in creation menus.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// True if this subtype may be created for `layer`.
    pub fn supports(&self, layer: &Layer) -> bool {
        (self.supports)(layer)
    }

    /// Builds an empty concrete instance bound to `layer_id`.
    pub fn construct(&self, layer_id: u64) -> Box<dyn Style> {
        (self.constructor)(layer_id)
    }
}

impl std::fmt::Debug for StyleDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleDescriptor")
            .field("type_tag", &self.type_tag)
            .field("label", &self.label)
            .finish()
    }
}

/// Process-wide table of style subtypes, fixed after initialization.
#[derive(Debug, Default)]
pub struct StyleRegistry {
    // Vec keeps registration order for deterministic listing; the map is a
    // tag index into it.
    entries: Vec<StyleDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl StyleRegistry {
    /// Start building a registry. Registration is init-time only.
    pub fn builder() -> StyleRegistryBuilder {
        StyleRegistryBuilder {
            registry: StyleRegistry::default(),
        }
    }

    /// Registry pre-populated with the built-in subtypes.
    pub fn with_builtins() -> Self {
        Self::builder()
            .register(
                "raster",
                "Raster style",
                crate::style::raster::RasterStyle::create,
                crate::style::raster::RasterStyle::is_layer_supported,
            )
            .register(
                "vector",
                "Vector style",
                crate::style::vector::VectorStyle::create,
                crate::style::vector::VectorStyle::is_layer_supported,
            )
            .build()
    }

    /// Resolves a type tag to its descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownStyleType`] if the tag was never registered.
    pub fn resolve(&self, type_tag: &str) -> Result<&StyleDescriptor, Error> {
        self.index
            .get(type_tag)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| Error::UnknownStyleType {
                type_tag: type_tag.to_string(),
                stale: false,
            })
    }

    /// Descriptors whose support predicate accepts `layer`, in registration
    /// order. The iterator borrows the registry and can be restarted by
    /// calling this again.
    pub fn list_supporting<'a>(
        &'a self,
        layer: &'a Layer,
    ) -> impl Iterator<Item = &'a StyleDescriptor> + 'a {
        self.entries.iter().filter(move |desc| desc.supports(layer))
    }

    /// All registered tags in registration order.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|desc| desc.type_tag)
    }
}

/// Builder consumed at process startup to produce the fixed registry.
pub struct StyleRegistryBuilder {
    registry: StyleRegistry,
}

impl StyleRegistryBuilder {
    /// Registers a subtype.
    ///
    /// # Panics
    ///
    /// Panics on a duplicate tag; registration happens once at startup and
    /// a duplicate is a wiring bug, not a runtime condition.
    pub fn register(
        mut self,
        type_tag: &'static str,
        label: &'static str,
        constructor: StyleConstructor,
        supports: SupportPredicate,
    ) -> Self {
        assert!(
            !self.registry.index.contains_key(type_tag),
            "style type '{}' registered twice",
            type_tag
        );
        self.registry.index.insert(type_tag, self.registry.entries.len());
        self.registry.entries.push(StyleDescriptor {
            type_tag,
            label,
            constructor,
            supports,
        });
        self
    }

    pub fn build(self) -> StyleRegistry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{Layer, LayerKind};

    #[test]
    fn test_resolve_registered_tag() {
        let registry = StyleRegistry::with_builtins();
        let desc = registry.resolve("raster").unwrap();
        assert_eq!(desc.type_tag(), "raster");
        assert_eq!(desc.label(), "Raster style");
    }

    #[test]
    fn test_resolve_unknown_tag() {
        let registry = StyleRegistry::with_builtins();
        let err = registry.resolve("heatmap").unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownStyleType { type_tag, stale: false } if type_tag == "heatmap"
        ));
    }

    #[test]
    fn test_list_supporting_is_restartable_and_ordered() {
        let registry = StyleRegistry::with_builtins();
        let layer = Layer::new(1, "DEM", LayerKind::Raster);

        let first: Vec<_> = registry.list_supporting(&layer).map(|d| d.type_tag()).collect();
        let second: Vec<_> = registry.list_supporting(&layer).map(|d| d.type_tag()).collect();

        assert_eq!(first, vec!["raster"]);
        assert_eq!(first, second, "listing must be stable across calls");
    }

    #[test]
    fn test_registration_order_preserved() {
        let registry = StyleRegistry::with_builtins();
        let tags: Vec<_> = registry.tags().collect();
        assert_eq!(tags, vec!["raster", "vector"]);
    }

    #[test]
    fn test_construct_binds_layer() {
        let registry = StyleRegistry::with_builtins();
        let style = registry.resolve("vector").unwrap().construct(42);
        assert_eq!(style.layer_id(), 42);
        assert_eq!(style.type_tag(), "vector");
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_duplicate_registration_panics() {
        let _ = StyleRegistry::builder()
            .register(
                "raster",
                "Raster style",
                crate::style::raster::RasterStyle::create,
                crate::style::raster::RasterStyle::is_layer_supported,
            )
            .register(
                "raster",
                "Raster again",
                crate::style::raster::RasterStyle::create,
                crate::style::raster::RasterStyle::is_layer_supported,
            );
    }
}
