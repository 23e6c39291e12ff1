//! Vector style subtype.
//!
//! A flat symbolizer: fill color plus a stroke ring drawn along the tile
//! border. Only offered for vector layers.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::coord::BBox;
use crate::error::ValidationError;
use crate::layer::{Layer, LayerKind};
use crate::render::RenderEnv;
use crate::style::{
    parse_color, DrawError, FieldDescriptor, FieldKind, Style, StyleBase, StyleId,
};

/// Subtype-owned fields, persisted as `StyleRecord::data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct VectorParams {
    pub fill_color: String,
    pub stroke_color: String,
    /// Stroke width in pixels
    pub stroke_width: u32,
}

impl Default for VectorParams {
    fn default() -> Self {
        Self {
            fill_color: "#aec7e8".to_string(),
            stroke_color: "#1f77b4".to_string(),
            stroke_width: 1,
        }
    }
}

/// Stroke/fill symbolizer style for vector layers.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorStyle {
    base: StyleBase,
    params: VectorParams,
}

impl VectorStyle {
    /// Registry constructor: empty instance bound to a layer.
    pub fn create(layer_id: u64) -> Box<dyn Style> {
        Box::new(Self {
            base: StyleBase::new(layer_id),
            params: VectorParams::default(),
        })
    }

    /// Registry support predicate.
    pub fn is_layer_supported(layer: &Layer) -> bool {
        layer.kind == LayerKind::Vector
    }
}

impl Style for VectorStyle {
    fn type_tag(&self) -> &'static str {
        "vector"
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
                name: "fill_color",
                label: "Fill color",
                kind: FieldKind::Color,
                required: false,
            },
            FieldDescriptor {
                name: "stroke_color",
                label: "Stroke color",
                kind: FieldKind::Color,
                required: false,
            },
            FieldDescriptor {
                name: "stroke_width",
                label: "Stroke width (px)",
                kind: FieldKind::Integer,
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
                "fill_color" => match value.as_str().and_then(parse_color) {
                    Some(_) => staged.fill_color = value.as_str().unwrap_or_default().to_string(),
                    None => errors.push("fill_color", "expected a #rrggbb color"),
                },
                "stroke_color" => match value.as_str().and_then(parse_color) {
                    Some(_) => staged.stroke_color = value.as_str().unwrap_or_default().to_string(),
                    None => errors.push("stroke_color", "expected a #rrggbb color"),
                },
                "stroke_width" => match value.as_u64() {
                    Some(w) if w >= 1 => staged.stroke_width = w as u32,
                    _ => errors.push("stroke_width", "must be a positive integer"),
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
        map.insert("fill_color".into(), Value::from(self.params.fill_color.as_str()));
        map.insert(
            "stroke_color".into(),
            Value::from(self.params.stroke_color.as_str()),
        );
        map.insert("stroke_width".into(), Value::from(self.params.stroke_width));
        Value::Object(map)
    }

    fn subtype_data(&self) -> Value {
        json!({
            "fill_color": self.params.fill_color,
            "stroke_color": self.params.stroke_color,
            "stroke_width": self.params.stroke_width,
        })
    }

    fn load_data(&mut self, data: &Value) -> Result<(), ValidationError> {
        self.params = serde_json::from_value(data.clone())
            .map_err(|e| ValidationError::single("data", e.to_string()))?;
        Ok(())
    }

    fn draw(
        &self,
        _bbox: &BBox,
        width: u32,
        height: u32,
        _env: &RenderEnv,
    ) -> Result<RgbaImage, DrawError> {
        let fill = parse_color(&self.params.fill_color)
            .ok_or_else(|| DrawError::BadParameter(format!("fill_color '{}'", self.params.fill_color)))?;
        let stroke = parse_color(&self.params.stroke_color).ok_or_else(|| {
            DrawError::BadParameter(format!("stroke_color '{}'", self.params.stroke_color))
        })?;

        let sw = self.params.stroke_width;
        let image = RgbaImage::from_fn(width, height, |px, py| {
            let on_border =
                px < sw || py < sw || px >= width.saturating_sub(sw) || py >= height.saturating_sub(sw);
            if on_border {
                stroke
            } else {
                fill
            }
        });
        Ok(image)
    }
}
