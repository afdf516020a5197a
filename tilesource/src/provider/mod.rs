//! Tile geometry provider abstraction
//!
//! A [`TileProvider`] computes the geometry for one tile's bounds at a zoom
//! level. Providers are called from worker threads and may block (network,
//! disk, heavy computation); they must not assume affinity to any thread.
//!
//! Closures with the right signature are providers too:
//!
//! ```
//! use std::sync::Arc;
//! use tilesource::coord::LatLngBounds;
//! use tilesource::geometry::FeatureCollection;
//! use tilesource::provider::{ProviderError, TileProvider};
//!
//! let provider: Arc<dyn TileProvider> = Arc::new(
//!     |_bounds: &LatLngBounds, _zoom: u8| -> Result<FeatureCollection, ProviderError> {
//!         Ok(FeatureCollection::new())
//!     },
//! );
//! # let _ = provider;
//! ```

mod types;

pub use types::{ProviderError, TileProvider};
