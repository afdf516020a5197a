//! Tile coordinates and bounds
//!
//! Provides the [`TileCoordinate`] identity used as the key for every fetch,
//! and conversion between Web Mercator tile indices and geographic bounds.
//! Tile providers receive the [`LatLngBounds`] of the tile they are asked for.

mod types;

pub use types::{
    CoordError, LatLngBounds, TileCoordinate, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON,
};

use std::f64::consts::PI;

/// Converts geographic coordinates to the tile containing them.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to [`MAX_ZOOM`])
#[inline]
pub fn to_tile_coordinate(lat: f64, lon: f64, zoom: u8) -> Result<TileCoordinate, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);
    let max_index = n - 1.0;

    let x = ((lon + 180.0) / 360.0 * n).min(max_index) as u32;

    let lat_rad = lat * PI / 180.0;
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).min(max_index) as u32;

    Ok(TileCoordinate::new(zoom, x, y))
}

/// Converts a tile corner (fractional indices allowed) to `(lat, lon)`.
#[inline]
pub(crate) fn tile_corner_to_lat_lon(x: f64, y: f64, zoom: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(zoom as i32);

    let lon = x / n * 360.0 - 180.0;

    // Inverse Web Mercator
    let lat_rad = (PI * (1.0 - 2.0 * y / n)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}

/// Returns the latitude/longitude of a tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoordinate) -> (f64, f64) {
    tile_corner_to_lat_lon(tile.x as f64, tile.y as f64, tile.zoom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_york_city_at_zoom_16() {
        let tile = to_tile_coordinate(40.7128, -74.0060, 16).unwrap();
        assert_eq!(tile, TileCoordinate::new(16, 19295, 24640));
    }

    #[test]
    fn test_invalid_latitude() {
        assert!(matches!(
            to_tile_coordinate(90.0, 0.0, 10),
            Err(CoordError::InvalidLatitude(_))
        ));
    }

    #[test]
    fn test_east_edge_stays_on_grid() {
        let tile = to_tile_coordinate(0.0, 180.0, 3).unwrap();
        assert_eq!(tile.x, 7);
    }

    #[test]
    fn test_tile_to_lat_lon_at_equator() {
        let (lat, lon) = tile_to_lat_lon(&TileCoordinate::new(10, 512, 512));
        assert!(lat.abs() < 1e-9, "Should be on the equator, got {}", lat);
        assert!(lon.abs() < 1e-9, "Should be on the prime meridian, got {}", lon);
    }

    #[test]
    fn test_world_tile_bounds() {
        let bounds = LatLngBounds::from_tile(&TileCoordinate::new(0, 0, 0));
        assert!((bounds.north - MAX_LAT).abs() < 1e-6);
        assert!((bounds.south - MIN_LAT).abs() < 1e-6);
        assert_eq!(bounds.west, -180.0);
        assert_eq!(bounds.east, 180.0);
    }

    #[test]
    fn test_tile_bounds_contain_source_point() {
        let tile = to_tile_coordinate(40.7128, -74.0060, 16).unwrap();
        let bounds = LatLngBounds::from_tile(&tile);
        assert!(bounds.contains(40.7128, -74.0060));
    }

    #[test]
    fn test_neighbouring_tiles_touch() {
        let a = LatLngBounds::from_tile(&TileCoordinate::new(5, 3, 7));
        let b = LatLngBounds::from_tile(&TileCoordinate::new(5, 4, 7));
        let far = LatLngBounds::from_tile(&TileCoordinate::new(5, 20, 7));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&far));
        assert_eq!(a.east, b.west);
    }

    #[test]
    fn test_checked_rejects_out_of_grid() {
        assert!(TileCoordinate::checked(2, 3, 3).is_ok());
        assert_eq!(
            TileCoordinate::checked(2, 4, 0),
            Err(CoordError::OutOfGrid { zoom: 2, x: 4, y: 0 })
        );
        assert_eq!(
            TileCoordinate::checked(31, 0, 0),
            Err(CoordError::InvalidZoom(31))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(TileCoordinate::new(5, 3, 7).to_string(), "5/3/7");
    }

    #[test]
    fn test_structural_identity() {
        let mut set = HashSet::new();
        set.insert(TileCoordinate::new(5, 3, 7));
        assert!(set.contains(&TileCoordinate::new(5, 3, 7)));
        assert!(!set.contains(&TileCoordinate::new(5, 7, 3)));
    }

    proptest! {
        #[test]
        fn prop_bounds_are_well_formed(zoom in 0u8..=20, fx in 0.0f64..1.0, fy in 0.0f64..1.0) {
            let n = TileCoordinate::tiles_per_axis(zoom) as f64;
            let tile = TileCoordinate::new(zoom, (fx * n) as u32, (fy * n) as u32);
            let bounds = LatLngBounds::from_tile(&tile);

            prop_assert!(bounds.north > bounds.south);
            prop_assert!(bounds.east > bounds.west);
            prop_assert!(bounds.west >= MIN_LON && bounds.east <= MAX_LON);
            prop_assert!(bounds.north <= MAX_LAT + 1e-6 && bounds.south >= MIN_LAT - 1e-6);
        }

        #[test]
        fn prop_center_maps_back_to_tile(zoom in 0u8..=18, fx in 0.0f64..1.0, fy in 0.0f64..1.0) {
            let n = TileCoordinate::tiles_per_axis(zoom) as f64;
            let tile = TileCoordinate::new(zoom, (fx * n) as u32, (fy * n) as u32);
            let (lat, lon) = LatLngBounds::from_tile(&tile).center();
            prop_assert_eq!(to_tile_coordinate(lat, lon, zoom).unwrap(), tile);
        }
    }
}
