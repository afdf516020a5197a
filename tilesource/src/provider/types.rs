//! Provider types and traits

use thiserror::Error;

use crate::coord::LatLngBounds;
use crate::geometry::FeatureCollection;

/// Errors a provider can report for a single tile.
///
/// These never escape the fetch engine: a failed tile is logged and dropped,
/// and the renderer may ask for it again later.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// The backing data source could not be reached.
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// The backing data source returned data that could not be decoded.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Zoom level not served by this provider.
    #[error("Zoom level {0} not supported by provider")]
    UnsupportedZoom(u8),

    /// Provider-specific error.
    #[error("Provider error: {0}")]
    Other(String),
}

/// Supplies geometry for a tile.
pub trait TileProvider: Send + Sync {
    /// Produces the features inside `bounds` at `zoom`.
    ///
    /// Called on a worker thread; may block for as long as the data source
    /// needs. Return an empty collection, not an error, when the tile simply
    /// has no features.
    fn features_for_bounds(
        &self,
        bounds: &LatLngBounds,
        zoom: u8,
    ) -> Result<FeatureCollection, ProviderError>;
}

impl<F> TileProvider for F
where
    F: Fn(&LatLngBounds, u8) -> Result<FeatureCollection, ProviderError> + Send + Sync,
{
    fn features_for_bounds(
        &self,
        bounds: &LatLngBounds,
        zoom: u8,
    ) -> Result<FeatureCollection, ProviderError> {
        self(bounds, zoom)
    }
}
