//! Source construction options.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_ZOOM: u8 = 0;
pub const DEFAULT_MAX_ZOOM: u8 = 18;
pub const DEFAULT_BUFFER: u32 = 128;
pub const DEFAULT_TOLERANCE: f64 = 0.375;

/// Options handed to the renderer when a source is attached.
///
/// The fetch engine does not interpret them. Zoom limits, tile buffer and
/// simplification tolerance all take effect on the renderer side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometrySourceOptions {
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Tile buffer in screen pixels.
    pub buffer: u32,
    /// Douglas-Peucker simplification tolerance.
    pub tolerance: f64,
}

impl GeometrySourceOptions {
    pub fn with_min_zoom(mut self, zoom: u8) -> Self {
        self.min_zoom = zoom;
        self
    }

    pub fn with_max_zoom(mut self, zoom: u8) -> Self {
        self.max_zoom = zoom;
        self
    }

    pub fn with_buffer(mut self, buffer: u32) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl Default for GeometrySourceOptions {
    fn default() -> Self {
        Self {
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            buffer: DEFAULT_BUFFER,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = GeometrySourceOptions::default();
        assert_eq!(options.min_zoom, 0);
        assert_eq!(options.max_zoom, 18);
        assert_eq!(options.buffer, 128);
        assert_eq!(options.tolerance, 0.375);
    }

    #[test]
    fn test_setters() {
        let options = GeometrySourceOptions::default()
            .with_min_zoom(4)
            .with_max_zoom(14)
            .with_buffer(64)
            .with_tolerance(1.0);
        assert_eq!(
            options,
            GeometrySourceOptions {
                min_zoom: 4,
                max_zoom: 14,
                buffer: 64,
                tolerance: 1.0,
            }
        );
    }

    #[test]
    fn test_partial_json() {
        let options: GeometrySourceOptions =
            serde_json::from_str(r#"{"max_zoom": 16, "buffer": 32}"#).unwrap();
        assert_eq!(options.min_zoom, DEFAULT_MIN_ZOOM);
        assert_eq!(options.max_zoom, 16);
        assert_eq!(options.buffer, 32);
        assert_eq!(options.tolerance, DEFAULT_TOLERANCE);
    }
}
