//! Tile render pipeline
//!
//! Delegates pixel production to the concrete style's rendering capability,
//! then encodes the result to PNG at the requested dimensions. Output
//! dimensions always match the request exactly and encoding is
//! deterministic, so identical inputs yield identical bytes.
//!
//! Failures never degrade into a silent blank tile: every renderer error is
//! wrapped into [`RenderError`] with the style id, bounding box and zoom,
//! and logged before it propagates.

use std::collections::HashMap;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use tracing::{debug, error};

use crate::coord::{tile_to_bbox, BBox, TileAddress, WorldExtent, DEFAULT_TILE_SIZE, EPSG_3857_EXTENT};
use crate::error::{Error, RenderError};
use crate::style::Style;

/// Process-wide rendering configuration passed through to subtypes.
#[derive(Debug, Clone)]
pub struct RenderEnv {
    /// Projected extent the tile pyramid subdivides
    pub world_extent: WorldExtent,
    /// Square tile edge length in pixels for the tile endpoint
    pub tile_size: u32,
    /// Opaque map-engine settings forwarded from the host process
    pub settings: HashMap<String, String>,
}

impl Default for RenderEnv {
    fn default() -> Self {
        Self {
            world_extent: EPSG_3857_EXTENT,
            tile_size: DEFAULT_TILE_SIZE,
            settings: HashMap::new(),
        }
    }
}

/// Renders a style over a bounding box into PNG bytes.
///
/// # Errors
///
/// Returns [`RenderError`] if the concrete renderer fails, produces the
/// wrong dimensions, or the PNG encoder fails.
pub fn render(
    style: &dyn Style,
    bbox: &BBox,
    width: u32,
    height: u32,
    env: &RenderEnv,
) -> Result<Vec<u8>, RenderError> {
    render_with_zoom(style, bbox, width, height, env, None)
}

/// Renders one tile of the pyramid for a style, at `env.tile_size` pixels.
///
/// This is the tile-endpoint entry point: it resolves the address to a
/// bounding box and keeps the zoom level in any error context.
pub fn render_tile(style: &dyn Style, tile: TileAddress, env: &RenderEnv) -> Result<Vec<u8>, Error> {
    let bbox = tile_to_bbox(tile, &env.world_extent)?;
    let bytes = render_with_zoom(style, &bbox, env.tile_size, env.tile_size, env, Some(tile.z))?;
    Ok(bytes)
}

fn render_with_zoom(
    style: &dyn Style,
    bbox: &BBox,
    width: u32,
    height: u32,
    env: &RenderEnv,
    zoom: Option<u8>,
) -> Result<Vec<u8>, RenderError> {
    let fail = |message: String| {
        let err = RenderError {
            style_id: style.id(),
            type_tag: style.type_tag().to_string(),
            bbox: *bbox,
            zoom,
            message,
        };
        error!(style_id = ?style.id(), ?zoom, "{}", err);
        err
    };

    if width == 0 || height == 0 {
        return Err(fail(format!("output dimensions {}x{} are empty", width, height)));
    }

    let image = style
        .draw(bbox, width, height, env)
        .map_err(|e| fail(e.to_string()))?;

    if image.width() != width || image.height() != height {
        return Err(fail(format!(
            "renderer produced {}x{}, expected {}x{}",
            image.width(),
            image.height(),
            width,
            height
        )));
    }

    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
        .map_err(|e| fail(format!("PNG encoding failed: {}", e)))?;

    debug!(
        style_id = ?style.id(),
        ?zoom,
        bytes = bytes.len(),
        "rendered tile"
    );
    Ok(bytes)
}
