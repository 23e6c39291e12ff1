//! Tile coordinate transform
//!
//! Converts a z/x/y tile address into the geographic bounding box it covers,
//! given a fixed projected world extent. The subdivision is exact: adjacent
//! tiles share edges with no gap or overlap, and every valid tile lies fully
//! inside the world extent.

mod types;

pub use types::{
    BBox, CoordError, TileAddress, WorldExtent, DEFAULT_TILE_SIZE, EPSG_3857_EXTENT, MAX_ZOOM,
};

/// Computes the bounding box covered by a tile address.
///
/// The world extent is divided into `2^z × 2^z` equal squares. Tile row 0 is
/// the top row, so the Y axis is inverted relative to projected coordinates:
/// `max_y = extent.max_y - y * step`.
///
/// # Errors
///
/// Returns [`CoordError::InvalidTileAddress`] when `z` exceeds [`MAX_ZOOM`]
/// or when `x` or `y` fall outside `[0, 2^z)`.
#[inline]
pub fn tile_to_bbox(tile: TileAddress, extent: &WorldExtent) -> Result<BBox, CoordError> {
    if tile.z > MAX_ZOOM {
        return Err(CoordError::out_of_range(
            tile,
            format!("zoom must be at most {}", MAX_ZOOM),
        ));
    }

    let side = tile.tiles_per_side();
    if u64::from(tile.x) >= side || u64::from(tile.y) >= side {
        return Err(CoordError::out_of_range(
            tile,
            format!("x and y must be in [0, {})", side),
        ));
    }

    let step = extent.width() / side as f64;

    Ok(BBox {
        min_x: extent.min_x + tile.x as f64 * step,
        min_y: extent.max_y - (tile.y as f64 + 1.0) * step,
        max_x: extent.min_x + (tile.x as f64 + 1.0) * step,
        max_y: extent.max_y - tile.y as f64 * step,
    })
}
