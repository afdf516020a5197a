//! tilesource - background geometry fetching for map tile renderers
//!
//! A renderer asks a [`GeometrySource`] for tiles. The source runs a
//! [`TileProvider`] for each tile on a small worker pool and hands non-empty
//! results back to the renderer, unless the request was cancelled or the
//! source was released in the meantime.
//!
//! ```text
//! renderer ──fetch_tile / cancel_tile──► GeometrySource
//!    ▲                                        │
//!    │                              registry + worker pool
//!    │                                        │
//!    └────────── set_tile_data ◄── FetchTask ─┴─► TileProvider
//! ```
//!
//! # Modules
//!
//! - [`coord`]: tile coordinates and geographic bounds
//! - [`geometry`]: features, collections and query filters
//! - [`provider`]: the geometry provider trait
//! - [`renderer`]: the renderer collaborator trait and a recording renderer
//! - [`executor`]: cancellation registry, fetch tasks and the worker pool
//! - [`source`]: the [`GeometrySource`] façade
//! - [`telemetry`]: per-source counters
//! - [`logging`]: subscriber setup

pub mod coord;
pub mod executor;
pub mod geometry;
pub mod logging;
pub mod provider;
pub mod renderer;
pub mod source;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use coord::{LatLngBounds, TileCoordinate};
pub use geometry::{Feature, FeatureCollection, Filter};
pub use provider::{ProviderError, TileProvider};
pub use renderer::{NativeRenderer, RecordingRenderer, RenderEvent};
pub use source::{GeometrySource, GeometrySourceBuilder, GeometrySourceOptions, SourceError};
pub use telemetry::MetricsSnapshot;
