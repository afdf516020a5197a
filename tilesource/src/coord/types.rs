//! Coordinate types for tile addressing.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum zoom level accepted by [`TileCoordinate::checked`].
pub const MAX_ZOOM: u8 = 30;

/// Web Mercator latitude limit (degrees).
pub const MAX_LAT: f64 = 85.05112878;

/// Web Mercator latitude limit (degrees).
pub const MIN_LAT: f64 = -85.05112878;

/// Minimum longitude (degrees).
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude (degrees).
pub const MAX_LON: f64 = 180.0;

/// Errors from coordinate validation and conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Zoom level above [`MAX_ZOOM`].
    #[error("Invalid zoom level: {0} (max: {MAX_ZOOM})")]
    InvalidZoom(u8),

    /// Tile column or row outside the `0..2^zoom` grid.
    #[error("Tile {x}/{y} is outside the grid at zoom {zoom}")]
    OutOfGrid { zoom: u8, x: u32, y: u32 },

    /// Latitude outside the Web Mercator range.
    #[error("Invalid latitude: {0}")]
    InvalidLatitude(f64),

    /// Longitude outside -180..=180.
    #[error("Invalid longitude: {0}")]
    InvalidLongitude(f64),
}

/// Identity of one tile request: zoom level plus column (`x`) and row (`y`).
///
/// Equality and hashing are structural, so the value can be used directly as
/// a map key. It is `Copy` and never mutated after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoordinate {
    /// Zoom level.
    pub zoom: u8,
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl TileCoordinate {
    /// Creates a coordinate without validation.
    #[inline]
    pub const fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Creates a coordinate, rejecting zoom levels above [`MAX_ZOOM`] and
    /// indices outside the tile grid.
    pub fn checked(zoom: u8, x: u32, y: u32) -> Result<Self, CoordError> {
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }
        let tiles = Self::tiles_per_axis(zoom);
        if u64::from(x) >= tiles || u64::from(y) >= tiles {
            return Err(CoordError::OutOfGrid { zoom, x, y });
        }
        Ok(Self { zoom, x, y })
    }

    /// Number of tiles along one axis at `zoom`.
    #[inline]
    pub fn tiles_per_axis(zoom: u8) -> u64 {
        1u64 << zoom.min(63)
    }
}

impl fmt::Display for TileCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl LatLngBounds {
    /// Creates bounds from explicit edges.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Bounds covered by a tile: northwest corner of `(x, y)` to northwest
    /// corner of `(x + 1, y + 1)`.
    pub fn from_tile(tile: &TileCoordinate) -> Self {
        let (north, west) = super::tile_corner_to_lat_lon(tile.x as f64, tile.y as f64, tile.zoom);
        let (south, east) =
            super::tile_corner_to_lat_lon(tile.x as f64 + 1.0, tile.y as f64 + 1.0, tile.zoom);
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Returns the center point as `(lat, lon)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }

    /// Returns true if the point lies inside or on the edge of these bounds.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat <= self.north && lat >= self.south && lon >= self.west && lon <= self.east
    }

    /// Returns true if the two boxes overlap or touch.
    pub fn intersects(&self, other: &LatLngBounds) -> bool {
        self.south <= other.north
            && other.south <= self.north
            && self.west <= other.east
            && other.west <= self.east
    }
}

impl fmt::Display for LatLngBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[N {:.6}, S {:.6}, E {:.6}, W {:.6}]",
            self.north, self.south, self.east, self.west
        )
    }
}
