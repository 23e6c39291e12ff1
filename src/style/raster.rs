//! Raster style subtype.
//!
//! Renders one band of the layer's raster source through a two-color ramp.
//! Only offered for raster layers.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::coord::BBox;
use crate::error::ValidationError;
use crate::layer::{Layer, LayerKind};
use crate::render::RenderEnv;
use crate::style::{
    parse_color, DrawError, FieldDescriptor, FieldKind, Style, StyleBase, StyleId,
};

/// Bands present in the backing raster source.
///
/// Fixed until per-layer source metadata is wired through `RenderEnv`.
const SOURCE_BAND_COUNT: u32 = 4;

/// Subtype-owned fields, persisted as `StyleRecord::data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RasterParams {
    /// 1-based band index into the source
    pub band: u32,
    /// Ramp color at the band minimum
    pub color_min: String,
    /// Ramp color at the band maximum
    pub color_max: String,
}

impl Default for RasterParams {
    fn default() -> Self {
        Self {
            band: 1,
            color_min: "#000000".to_string(),
            color_max: "#ffffff".to_string(),
        }
    }
}

/// Single-band color-ramp style for raster layers.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterStyle {
    base: StyleBase,
    params: RasterParams,
}

impl RasterStyle {
    /// Registry constructor: empty instance bound to a layer.
    pub fn create(layer_id: u64) -> Box<dyn Style> {
        Box::new(Self {
            base: StyleBase::new(layer_id),
            params: RasterParams::default(),
        })
    }

    /// Registry support predicate.
    pub fn is_layer_supported(layer: &Layer) -> bool {
        layer.kind == LayerKind::Raster
    }
}

impl Style for RasterStyle {
    fn type_tag(&self) -> &'static str {
        "raster"
    }

    fn id(&self) -> Option<StyleId> {
        self.base.id
    }

    fn assign_id(&mut self, id: StyleId) {
        self.base.id = Some(id);
    }

    fn layer_id(&self) -> u64 {
        self.base.layer_id
    }

    fn display_name(&self) -> &str {
        &self.base.display_name
    }

    fn set_display_name(&mut self, name: String) {
        self.base.display_name = name;
    }

    fn describe_fields(&self) -> Vec<FieldDescriptor> {
        let mut fields = StyleBase::describe_fields();
        fields.extend([
            FieldDescriptor {
                name: "band",
                label: "Source band",
                kind: FieldKind::Integer,
                required: true,
            },
            FieldDescriptor {
                name: "color_min",
                label: "Ramp start color",
                kind: FieldKind::Color,
                required: false,
            },
            FieldDescriptor {
                name: "color_max",
                label: "Ramp end color",
                kind: FieldKind::Color,
                required: false,
            },
        ]);
        fields
    }

    fn populate(&mut self, payload: &Value) -> Result<(), ValidationError> {
        let obj = match payload.as_object() {
            Some(obj) => obj,
            None => return Err(ValidationError::single("payload", "expected a JSON object")),
        };

        let mut errors = ValidationError::new();
        let staged_name = self.base.validate(obj, self.type_tag(), &mut errors);
        let mut staged = self.params.clone();

        for (key, value) in obj {
            if StyleBase::is_base_field(key) {
                continue;
            }
            match key.as_str() {
                "band" => match value.as_u64() {
                    Some(band) if band >= 1 => staged.band = band as u32,
                    _ => errors.push("band", "must be a positive integer"),
                },
                "color_min" => match value.as_str().and_then(parse_color) {
                    Some(_) => staged.color_min = value.as_str().unwrap_or_default().to_string(),
                    None => errors.push("color_min", "expected a #rrggbb color"),
                },
                "color_max" => match value.as_str().and_then(parse_color) {
                    Some(_) => staged.color_max = value.as_str().unwrap_or_default().to_string(),
                    None => errors.push("color_max", "expected a #rrggbb color"),
                },
                _ => errors.push(key, "unrecognized field"),
            }
        }

        errors.into_result()?;
        if let Some(name) = staged_name {
            self.base.display_name = name;
        }
        self.params = staged;
        Ok(())
    }

    fn to_payload(&self) -> Value {
        let mut map = self.base.payload_map(self.type_tag());
        map.insert("band".into(), Value::from(self.params.band));
        map.insert("color_min".into(), Value::from(self.params.color_min.as_str()));
        map.insert("color_max".into(), Value::from(self.params.color_max.as_str()));
        Value::Object(map)
    }

    fn subtype_data(&self) -> Value {
        json!({
            "band": self.params.band,
            "color_min": self.params.color_min,
            "color_max": self.params.color_max,
        })
    }

    fn load_data(&mut self, data: &Value) -> Result<(), ValidationError> {
        self.params = serde_json::from_value(data.clone())
            .map_err(|e| ValidationError::single("data", e.to_string()))?;
        Ok(())
    }

    fn draw(
        &self,
        bbox: &BBox,
        width: u32,
        height: u32,
        env: &RenderEnv,
    ) -> Result<RgbaImage, DrawError> {
        if self.params.band > SOURCE_BAND_COUNT || self.params.band == 0 {
            return Err(DrawError::SourceUnavailable(format!(
                "band {} not present in source ({} bands)",
                self.params.band, SOURCE_BAND_COUNT
            )));
        }
        let lo = parse_color(&self.params.color_min)
            .ok_or_else(|| DrawError::BadParameter(format!("color_min '{}'", self.params.color_min)))?;
        let hi = parse_color(&self.params.color_max)
            .ok_or_else(|| DrawError::BadParameter(format!("color_max '{}'", self.params.color_max)))?;

        let extent = &env.world_extent;
        let image = RgbaImage::from_fn(width, height, |px, py| {
            // Pixel center in projected coordinates; tile row 0 is north
            let wx = bbox.min_x + (px as f64 + 0.5) / width as f64 * bbox.width();
            let wy = bbox.max_y - (py as f64 + 0.5) / height as f64 * bbox.height();
            let tx = ((wx - extent.min_x) / extent.width()).clamp(0.0, 1.0);
            let ty = ((wy - extent.min_y) / extent.height()).clamp(0.0, 1.0);
            let t = (tx + ty) / 2.0;
            lerp_color(lo, hi, t)
        });
        Ok(image)
    }
}

fn lerp_color(lo: Rgba<u8>, hi: Rgba<u8>, t: f64) -> Rgba<u8> {
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    Rgba([
        mix(lo[0], hi[0]),
        mix(lo[1], hi[1]),
        mix(lo[2], hi[2]),
        mix(lo[3], hi[3]),
    ])
}
