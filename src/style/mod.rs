//! Polymorphic style entities
//!
//! A style is a rendering rule bound to one layer. Its concrete behavior is
//! selected by a string type tag resolved through the
//! [`StyleRegistry`](crate::registry::StyleRegistry); everything downstream
//! (rendering, editing, persistence) works through the [`Style`] capability
//! trait without knowing the concrete subtype.
//!
//! The persisted form is [`StyleRecord`]: the base fields every subtype
//! shares plus an opaque subtype `data` payload. [`load_concrete`]
//! re-materializes a full concrete instance from a record.

pub mod raster;
pub mod vector;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::error;

use crate::coord::BBox;
use crate::error::{Error, ValidationError};
use crate::registry::StyleRegistry;
use crate::render::RenderEnv;
use crate::store::StyleStore;

/// Unique style identifier, assigned by the entity store and never reused.
pub type StyleId = u64;

/// Persisted base record of a style.
///
/// `type_tag` is the polymorphism key; it is set at creation and immutable.
/// `data` holds the concrete subtype's own fields, opaque to the base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRecord {
    pub id: StyleId,
    pub layer_id: u64,
    pub display_name: String,
    pub type_tag: String,
    pub data: Value,
}

/// Form-description contract: what a field of a subtype's edit form is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Color,
}

/// Failure inside a concrete subtype's renderer.
///
/// The render pipeline wraps this with style id, bbox and zoom context.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DrawError {
    /// Backing data source missing or unreachable
    #[error("data source unavailable: {0}")]
    SourceUnavailable(String),
    /// Persisted parameter that validation would have rejected
    #[error("bad symbolizer parameter: {0}")]
    BadParameter(String),
}

/// Capability set every concrete style subtype implements.
///
/// Mirrors the uniform interface the rest of the core dispatches through:
/// render, serialize, populate-from-payload, and form description.
pub trait Style: Send + Sync {
    /// The registry tag of this subtype.
    fn type_tag(&self) -> &'static str;

    /// Store-assigned id, `None` until first persisted.
    fn id(&self) -> Option<StyleId>;

    fn assign_id(&mut self, id: StyleId);

    fn layer_id(&self) -> u64;

    fn display_name(&self) -> &str;

    fn set_display_name(&mut self, name: String);

    /// Field list for building the subtype-specific edit form.
    fn describe_fields(&self) -> Vec<FieldDescriptor>;

    /// Validates `payload` and writes its fields onto the instance.
    ///
    /// All-or-nothing: on any validation failure nothing is modified and
    /// every offending field is reported.
    fn populate(&mut self, payload: &Value) -> Result<(), ValidationError>;

    /// Full serialized payload: base fields plus subtype fields.
    fn to_payload(&self) -> Value;

    /// Only the subtype-owned fields, as persisted in `StyleRecord::data`.
    fn subtype_data(&self) -> Value;

    /// Restores subtype fields from a persisted `StyleRecord::data` value.
    ///
    /// Rejects unknown or malformed fields rather than silently ignoring
    /// them.
    fn load_data(&mut self, data: &Value) -> Result<(), ValidationError>;

    /// Produces the pixel content for the given bounding box.
    fn draw(
        &self,
        bbox: &BBox,
        width: u32,
        height: u32,
        env: &RenderEnv,
    ) -> Result<RgbaImage, DrawError>;
}

/// Base fields shared by every concrete subtype.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleBase {
    pub id: Option<StyleId>,
    pub layer_id: u64,
    pub display_name: String,
}

impl StyleBase {
    pub fn new(layer_id: u64) -> Self {
        Self {
            id: None,
            layer_id,
            display_name: String::new(),
        }
    }

    /// Payload keys owned by the base, not the subtype.
    pub fn is_base_field(key: &str) -> bool {
        matches!(key, "cls" | "id" | "layer_id" | "display_name")
    }

    pub fn describe_fields() -> Vec<FieldDescriptor> {
        vec![FieldDescriptor {
            name: "display_name",
            label: "Display name",
            kind: FieldKind::Text,
            required: false,
        }]
    }

    /// Validates the base part of a payload.
    ///
    /// `cls`, `id` and `layer_id` are immutable and may only echo the
    /// current values. Returns the staged display name, to be applied only
    /// after the whole payload validated.
    pub fn validate(
        &self,
        obj: &Map<String, Value>,
        type_tag: &str,
        errors: &mut ValidationError,
    ) -> Option<String> {
        if let Some(cls) = obj.get("cls") {
            match cls.as_str() {
                Some(tag) if tag == type_tag => {}
                _ => errors.push("cls", "type tag is immutable"),
            }
        }
        if let Some(id) = obj.get("id") {
            match (id.as_u64(), self.id) {
                (Some(given), Some(own)) if given == own => {}
                (Some(_), None) => {} // not yet persisted; ignore echoes
                _ => errors.push("id", "read-only field"),
            }
        }
        if let Some(layer_id) = obj.get("layer_id") {
            if layer_id.as_u64() != Some(self.layer_id) {
                errors.push("layer_id", "immutable after creation");
            }
        }
        match obj.get("display_name") {
            None => None,
            Some(name) => match name.as_str() {
                Some(s) if !s.trim().is_empty() => Some(s.to_string()),
                _ => {
                    errors.push("display_name", "must be a non-empty string");
                    None
                }
            },
        }
    }

    /// Base portion of the serialized payload.
    pub fn payload_map(&self, type_tag: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("cls".into(), Value::from(type_tag));
        if let Some(id) = self.id {
            map.insert("id".into(), Value::from(id));
        }
        map.insert("layer_id".into(), Value::from(self.layer_id));
        // Omitted while unset so the payload round-trips through the
        // non-empty validation rule
        if !self.display_name.is_empty() {
            map.insert("display_name".into(), Value::from(self.display_name.as_str()));
        }
        map
    }
}

/// Builds the persistable record for a concrete instance.
///
/// For not-yet-persisted instances the id is 0; the store assigns the real
/// id on insert.
pub fn record_of(style: &dyn Style) -> StyleRecord {
    StyleRecord {
        id: style.id().unwrap_or(0),
        layer_id: style.layer_id(),
        display_name: style.display_name().to_string(),
        type_tag: style.type_tag().to_string(),
        data: style.subtype_data(),
    }
}

/// A concrete style loaded from the store together with its record version.
pub struct LoadedStyle {
    pub style: Box<dyn Style>,
    /// Store version at load time, used for conflict detection on commit.
    pub version: u64,
}

impl std::fmt::Debug for LoadedStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedStyle")
            .field("type_tag", &self.style.type_tag())
            .field("id", &self.style.id())
            .field("version", &self.version)
            .finish()
    }
}

/// Loads a style record and re-materializes its concrete subtype.
///
/// # Errors
///
/// - [`Error::NotFound`] if `id` does not exist.
/// - [`Error::UnknownStyleType`] if the persisted tag is stale relative to
///   the current registry. This violates the data-model invariant, so it is
///   reported (and logged as an integrity error), never silently coerced.
/// - [`Error::Validation`] if the persisted subtype data is malformed.
pub fn load_concrete(
    store: &dyn StyleStore,
    registry: &StyleRegistry,
    id: StyleId,
) -> Result<LoadedStyle, Error> {
    let versioned = store.get(id)?;
    let record = versioned.record;

    let descriptor = match registry.resolve(&record.type_tag) {
        Ok(descriptor) => descriptor,
        Err(_) => {
            error!(
                style_id = id,
                type_tag = %record.type_tag,
                "persisted style references a type tag absent from the registry"
            );
            // Stale persisted data, not caller input: classifies as a
            // server integrity error
            return Err(Error::UnknownStyleType {
                type_tag: record.type_tag,
                stale: true,
            });
        }
    };

    let mut style = descriptor.construct(record.layer_id);
    style.assign_id(record.id);
    style.set_display_name(record.display_name);
    style.load_data(&record.data)?;

    Ok(LoadedStyle {
        style,
        version: versioned.version,
    })
}

/// Parses a `#rrggbb` or `#rrggbbaa` color string.
pub(crate) fn parse_color(s: &str) -> Option<Rgba<u8>> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 && hex.len() != 8 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let r = channel(0)?;
    let g = channel(2)?;
    let b = channel(4)?;
    let a = if hex.len() == 8 { channel(6)? } else { 255 };
    Some(Rgba([r, g, b, a]))
}
