//! Geometry source façade.
//!
//! A [`GeometrySource`] sits between a renderer and a [`TileProvider`]. The
//! renderer asks for tiles with [`fetch_tile`](GeometrySource::fetch_tile) and
//! withdraws requests with [`cancel_tile`](GeometrySource::cancel_tile). Fetches
//! run on the source's own worker pool and deliver back to the renderer.
//!
//! # Per-tile lifecycle
//!
//! ```text
//!          fetch_tile
//!   Idle ────────────► Dispatched ──► Delivered
//!                         │  ▲
//!                         │  └── fetch_tile again (older task keeps running)
//!                         ▼
//!                      Aborted (cancelled | owner gone | empty)
//! ```
//!
//! Sources are handed out as `Arc<GeometrySource>`. Tasks only hold a weak
//! reference, so dropping the last `Arc` releases the source even while
//! fetches are running; their results are then discarded.

mod builder;
mod config;
mod error;

pub use builder::GeometrySourceBuilder;
pub use config::{
    GeometrySourceOptions, DEFAULT_BUFFER, DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, DEFAULT_TOLERANCE,
};
pub use error::SourceError;

use std::fmt;
use std::sync::{Arc, Weak};

use tracing::{debug, info, warn};

use crate::coord::{LatLngBounds, TileCoordinate};
use crate::executor::{
    CancellationFlag, CancellationRegistry, FetchTask, Rejection, TileSink, WorkerPool,
    WorkerPoolConfig,
};
use crate::geometry::{Feature, FeatureCollection, Filter};
use crate::provider::TileProvider;
use crate::renderer::NativeRenderer;
use crate::telemetry::{MetricsSnapshot, SourceMetrics};

/// A tile source whose geometry comes from a [`TileProvider`].
pub struct GeometrySource {
    id: String,
    options: GeometrySourceOptions,
    provider: Arc<dyn TileProvider>,
    renderer: Arc<dyn NativeRenderer>,
    registry: CancellationRegistry,
    pool: WorkerPool,
    metrics: Arc<SourceMetrics>,
    this: Weak<GeometrySource>,
}

impl GeometrySource {
    /// Creates a source with default options and pool sizing.
    pub fn new(
        id: impl Into<String>,
        provider: Arc<dyn TileProvider>,
        renderer: Arc<dyn NativeRenderer>,
    ) -> Result<Arc<Self>, SourceError> {
        Self::builder(id, provider, renderer).build()
    }

    pub fn builder(
        id: impl Into<String>,
        provider: Arc<dyn TileProvider>,
        renderer: Arc<dyn NativeRenderer>,
    ) -> GeometrySourceBuilder {
        GeometrySourceBuilder::new(id, provider, renderer)
    }

    fn start(
        id: String,
        options: GeometrySourceOptions,
        pool_config: WorkerPoolConfig,
        provider: Arc<dyn TileProvider>,
        renderer: Arc<dyn NativeRenderer>,
    ) -> Result<Arc<Self>, SourceError> {
        let metrics = Arc::new(SourceMetrics::new());
        let pool = WorkerPool::start(&id, pool_config, Arc::clone(&metrics))?;

        renderer.attach(&id, &options);
        info!(
            source = %id,
            workers = pool.workers(),
            queue_capacity = pool.capacity(),
            min_zoom = options.min_zoom,
            max_zoom = options.max_zoom,
            "Geometry source attached"
        );

        Ok(Arc::new_cyclic(|this| Self {
            id,
            options,
            provider,
            renderer,
            registry: CancellationRegistry::new(),
            pool,
            metrics,
            this: this.clone(),
        }))
    }

    // =========================================================================
    // Renderer-facing operations
    // =========================================================================

    /// Schedules a background fetch for a tile.
    ///
    /// Any earlier dispatch for the same tile keeps running but can no longer
    /// be cancelled. If the queue is full the request is dropped and the tile
    /// is left unregistered.
    pub fn fetch_tile(&self, zoom: u8, x: u32, y: u32) -> Result<(), SourceError> {
        let tile = TileCoordinate::new(zoom, x, y);
        let flag = CancellationFlag::new();
        self.registry.put(tile, flag.clone());

        let owner: Weak<dyn TileSink> = self.this.clone();
        let task = FetchTask::new(tile, Arc::clone(&self.provider), owner, flag.clone());

        match self.pool.submit(task) {
            Ok(()) => {
                self.metrics.fetch_dispatched();
                debug!(source = %self.id, tile = %tile, "Fetch dispatched");
                Ok(())
            }
            Err(rejection) => {
                self.registry.remove_if_current(&tile, &flag);
                self.metrics.fetch_rejected();
                match rejection {
                    Rejection::QueueFull => {
                        warn!(
                            source = %self.id,
                            tile = %tile,
                            capacity = self.pool.capacity(),
                            "Fetch queue full, request dropped"
                        );
                        Err(SourceError::Backpressure {
                            tile,
                            capacity: self.pool.capacity(),
                        })
                    }
                    Rejection::Closed => {
                        warn!(source = %self.id, tile = %tile, "Worker pool closed, request dropped");
                        Err(SourceError::PoolClosed { tile })
                    }
                }
            }
        }
    }

    /// Asks the current fetch for a tile to stop. No-op if none is in flight.
    pub fn cancel_tile(&self, zoom: u8, x: u32, y: u32) {
        let tile = TileCoordinate::new(zoom, x, y);
        self.metrics.cancel_requested();
        if self.registry.cancel(&tile) {
            debug!(source = %self.id, tile = %tile, "Fetch cancellation requested");
        }
    }

    /// Pushes data for a tile straight to the renderer.
    ///
    /// Bypasses the provider and does not touch in-flight state.
    pub fn set_tile_data(&self, zoom: u8, x: u32, y: u32, data: FeatureCollection) {
        self.metrics.direct_update();
        self.renderer
            .set_tile_data(TileCoordinate::new(zoom, x, y), data);
    }

    pub fn invalidate_tile(&self, zoom: u8, x: u32, y: u32) {
        let tile = TileCoordinate::new(zoom, x, y);
        debug!(source = %self.id, tile = %tile, "Invalidating tile");
        self.renderer.invalidate_tile(tile);
    }

    /// Marks everything intersecting `bounds` as stale at all zoom levels.
    pub fn invalidate_region(&self, bounds: LatLngBounds) {
        debug!(source = %self.id, bounds = %bounds, "Invalidating region");
        self.renderer.invalidate_region(bounds);
    }

    /// Features the renderer currently holds for this source.
    pub fn query_source_features(&self, filter: Option<&Filter>) -> Vec<Feature> {
        self.renderer
            .query_source_features(filter)
            .unwrap_or_default()
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn options(&self) -> &GeometrySourceOptions {
        &self.options
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Shared handle to the live counters.
    pub fn telemetry(&self) -> Arc<SourceMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Tiles with a registered dispatch that has not delivered yet.
    ///
    /// Cancelled tiles stay counted until fetched again.
    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }

    /// Tasks waiting for a worker.
    pub fn queued(&self) -> usize {
        self.pool.queued()
    }
}

impl TileSink for GeometrySource {
    fn deliver(&self, tile: TileCoordinate, data: FeatureCollection, flag: &CancellationFlag) {
        self.registry.remove_if_current(&tile, flag);
        self.renderer.set_tile_data(tile, data);
    }
}

impl Drop for GeometrySource {
    fn drop(&mut self) {
        self.renderer.detach(&self.id);
        info!(
            source = %self.id,
            pending = self.pool.queued(),
            "Geometry source released"
        );
    }
}

impl fmt::Debug for GeometrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeometrySource")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("registry", &self.registry)
            .field("pool", &self.pool)
            .finish()
    }
}
