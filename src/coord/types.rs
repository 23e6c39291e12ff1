//! Tile addressing and bounding box type definitions

use thiserror::Error;

/// Full EPSG:3857 (Web Mercator) world extent in projected metres.
pub const EPSG_3857_EXTENT: WorldExtent = WorldExtent {
    min_x: -20037508.34,
    min_y: -20037508.34,
    max_x: 20037508.34,
    max_y: 20037508.34,
};

/// Conventional render dimensions for one square tile.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Maximum zoom level accepted by the transform.
///
/// Caps `2^z` well inside `u32` range; no real tile pyramid goes deeper.
pub const MAX_ZOOM: u8 = 30;

/// Address of one square tile in a power-of-two pyramid.
///
/// Row 0 is the top (northernmost) row; column 0 is the westernmost column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileAddress {
    /// Zoom level (0 = single world tile)
    pub z: u8,
    /// Column, in `[0, 2^z)`
    pub x: u32,
    /// Row, in `[0, 2^z)`, 0 at north
    pub y: u32,
}

impl TileAddress {
    /// Create a new tile address. Range checks happen in `tile_to_bbox`.
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Number of tiles along one axis at this zoom level.
    #[inline]
    pub fn tiles_per_side(&self) -> u64 {
        1u64 << self.z
    }

    /// The address of the tile one zoom level up that contains this tile.
    ///
    /// Returns `None` at zoom 0.
    pub fn parent(&self) -> Option<TileAddress> {
        if self.z == 0 {
            return None;
        }
        Some(TileAddress {
            z: self.z - 1,
            x: self.x / 2,
            y: self.y / 2,
        })
    }
}

/// An axis-aligned rectangle in projected coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// The fixed projected extent that tile pyramids subdivide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldExtent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl WorldExtent {
    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Errors that can occur while resolving a tile address.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Tile address is malformed or outside the pyramid at its zoom level
    #[error("invalid tile address z={z} x={x} y={y}: {reason}")]
    InvalidTileAddress { z: u8, x: u32, y: u32, reason: String },
}

impl CoordError {
    pub(crate) fn out_of_range(tile: TileAddress, reason: impl Into<String>) -> Self {
        CoordError::InvalidTileAddress {
            z: tile.z,
            x: tile.x,
            y: tile.y,
            reason: reason.into(),
        }
    }
}
