//! Synthetic fetch workload.
//!
//! Builds a source around a provider that sleeps for a fixed latency and
//! returns generated points, dispatches a square grid of tiles around a
//! location, cancels every Nth request, waits for the pool to drain and
//! prints the metrics.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Args;
use serde_json::json;
use tilesource::coord::{to_tile_coordinate, LatLngBounds, TileCoordinate};
use tilesource::executor::{WorkerPoolConfig, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKER_COUNT};
use tilesource::geometry::{Feature, FeatureCollection, Filter};
use tilesource::renderer::{NativeRenderer, RecordingRenderer};
use tilesource::{GeometrySource, GeometrySourceOptions, ProviderError, SourceError, TileProvider};
use tracing::{debug, info, warn};

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Latitude of the grid center
    #[arg(long, default_value = "47.3769", allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude of the grid center
    #[arg(long, default_value = "8.5417", allow_negative_numbers = true)]
    pub lon: f64,

    /// Zoom level of the dispatched tiles
    #[arg(long, default_value = "12")]
    pub zoom: u8,

    /// Tiles per side of the dispatched grid
    #[arg(long, default_value = "8")]
    pub grid: u32,

    /// Simulated provider latency in milliseconds
    #[arg(long, default_value = "20")]
    pub latency_ms: u64,

    /// Features generated per tile
    #[arg(long, default_value = "5")]
    pub features: usize,

    /// Every Nth tile yields no features (0 disables)
    #[arg(long, default_value = "0")]
    pub empty_every: u32,

    /// Cancel every Nth dispatched tile right after dispatch (0 disables)
    #[arg(long, default_value = "4")]
    pub cancel_every: u32,

    /// Worker threads
    #[arg(long, default_value_t = DEFAULT_WORKER_COUNT)]
    pub workers: usize,

    /// Bounded queue capacity
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// JSON file with source options (min_zoom, max_zoom, buffer, tolerance)
    #[arg(long)]
    pub options: Option<PathBuf>,

    /// Maximum time to wait for pending fetches
    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,
}

// =============================================================================
// Synthetic collaborators
// =============================================================================

/// Provider that sleeps, then emits points spread across the tile.
pub struct SyntheticProvider {
    latency: Duration,
    features: usize,
    empty_every: u32,
}

impl SyntheticProvider {
    pub fn new(latency: Duration, features: usize, empty_every: u32) -> Self {
        Self {
            latency,
            features,
            empty_every,
        }
    }

    fn is_empty_tile(&self, bounds: &LatLngBounds, zoom: u8) -> bool {
        if self.empty_every == 0 {
            return false;
        }
        let (lat, lon) = bounds.center();
        match to_tile_coordinate(lat, lon, zoom) {
            Ok(tile) => (tile.x + tile.y) % self.empty_every == 0,
            Err(_) => true,
        }
    }
}

impl TileProvider for SyntheticProvider {
    fn features_for_bounds(
        &self,
        bounds: &LatLngBounds,
        zoom: u8,
    ) -> Result<FeatureCollection, ProviderError> {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        if self.is_empty_tile(bounds, zoom) {
            return Ok(FeatureCollection::new());
        }

        let step = (bounds.east - bounds.west) / (self.features.max(1) as f64);
        let (lat, _) = bounds.center();
        Ok((0..self.features)
            .map(|i| {
                let lon = bounds.west + step * (i as f64 + 0.5);
                Feature::new(json!({"type": "Point", "coordinates": [lon, lat]}))
                    .with_id(format!("z{}-{}", zoom, i))
                    .with_property("zoom", zoom)
            })
            .collect())
    }
}

/// Records everything and traces each delivery.
#[derive(Default)]
pub struct TracingRenderer {
    inner: RecordingRenderer,
}

impl TracingRenderer {
    pub fn deliveries(&self) -> usize {
        self.inner.deliveries()
    }
}

impl NativeRenderer for TracingRenderer {
    fn attach(&self, source_id: &str, options: &GeometrySourceOptions) {
        debug!(source = source_id, ?options, "Renderer attached");
        self.inner.attach(source_id, options);
    }

    fn detach(&self, source_id: &str) {
        debug!(source = source_id, "Renderer detached");
        self.inner.detach(source_id);
    }

    fn set_tile_data(&self, tile: TileCoordinate, data: FeatureCollection) {
        debug!(tile = %tile, features = data.len(), "Renderer received tile");
        self.inner.set_tile_data(tile, data);
    }

    fn invalidate_tile(&self, tile: TileCoordinate) {
        self.inner.invalidate_tile(tile);
    }

    fn invalidate_region(&self, bounds: LatLngBounds) {
        self.inner.invalidate_region(bounds);
    }

    fn query_source_features(&self, filter: Option<&Filter>) -> Option<Vec<Feature>> {
        self.inner.query_source_features(filter)
    }
}

// =============================================================================
// Command
// =============================================================================

/// Reads source options from a JSON file.
pub fn load_options(path: &Path) -> Result<GeometrySourceOptions, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&text).map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))
}

/// Tiles of a `size` x `size` grid starting at `origin`, clipped to the zoom's grid.
pub fn grid_tiles(origin: TileCoordinate, size: u32) -> Vec<TileCoordinate> {
    let limit = TileCoordinate::tiles_per_axis(origin.zoom);
    let half = size / 2;
    let x0 = origin.x.saturating_sub(half);
    let y0 = origin.y.saturating_sub(half);

    (0..size)
        .flat_map(|dy| (0..size).map(move |dx| (x0 + dx, y0 + dy)))
        .filter(|&(x, y)| u64::from(x) < limit && u64::from(y) < limit)
        .map(|(x, y)| TileCoordinate::new(origin.zoom, x, y))
        .collect()
}

pub fn run(args: SimulateArgs) -> Result<(), CliError> {
    let options = match &args.options {
        Some(path) => load_options(path)?,
        None => GeometrySourceOptions::default(),
    };
    let center = to_tile_coordinate(args.lat, args.lon, args.zoom)?;
    let tiles = grid_tiles(center, args.grid);

    let provider: Arc<dyn TileProvider> = Arc::new(SyntheticProvider::new(
        Duration::from_millis(args.latency_ms),
        args.features,
        args.empty_every,
    ));
    let renderer = Arc::new(TracingRenderer::default());
    let source = GeometrySource::builder("simulate", provider, renderer.clone())
        .options(options)
        .pool_config(WorkerPoolConfig::new(args.workers, args.queue_capacity))
        .build()?;

    info!(
        tiles = tiles.len(),
        zoom = args.zoom,
        center = %center,
        "Dispatching simulated fetches"
    );

    let mut rejected = 0usize;
    for (index, tile) in tiles.iter().enumerate() {
        match source.fetch_tile(tile.zoom, tile.x, tile.y) {
            Ok(()) => {}
            Err(SourceError::Backpressure { .. }) => {
                rejected += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        }
        if args.cancel_every > 0 && (index as u32 + 1) % args.cancel_every == 0 {
            source.cancel_tile(tile.zoom, tile.x, tile.y);
        }
    }
    if rejected > 0 {
        warn!(rejected, "Some fetches were rejected by backpressure");
    }

    let deadline = Instant::now() + Duration::from_secs(args.timeout_secs);
    loop {
        let pending = source.metrics().fetches_pending();
        if pending == 0 {
            break;
        }
        if Instant::now() >= deadline {
            return Err(CliError::Timeout { pending });
        }
        thread::sleep(Duration::from_millis(10));
    }

    let snapshot = source.metrics();
    println!("Source:             {}", source.id());
    println!("Tiles requested:    {}", tiles.len());
    println!("{}", snapshot);
    println!("Renderer tiles:     {}", renderer.deliveries());
    println!("Queryable features: {}", source.query_source_features(None).len());
    println!("Still registered:   {}", source.in_flight());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_grid_is_centered_and_clipped() {
        let tiles = grid_tiles(TileCoordinate::new(10, 100, 200), 4);
        assert_eq!(tiles.len(), 16);
        assert_eq!(tiles[0], TileCoordinate::new(10, 98, 198));

        let corner = grid_tiles(TileCoordinate::new(1, 1, 1), 4);
        assert_eq!(corner.len(), 4);
    }

    #[test]
    fn test_synthetic_provider_emits_features() {
        let provider = SyntheticProvider::new(Duration::ZERO, 3, 0);
        let bounds = LatLngBounds::from_tile(&TileCoordinate::new(8, 10, 10));
        let data = provider.features_for_bounds(&bounds, 8).unwrap();

        assert_eq!(data.len(), 3);
        assert!(data
            .iter()
            .all(|f| f.properties.get("zoom") == Some(&json!(8))));
    }

    #[test]
    fn test_synthetic_provider_empty_tiles() {
        let provider = SyntheticProvider::new(Duration::ZERO, 3, 2);
        let even = LatLngBounds::from_tile(&TileCoordinate::new(8, 10, 10));
        let odd = LatLngBounds::from_tile(&TileCoordinate::new(8, 10, 11));

        assert!(provider.features_for_bounds(&even, 8).unwrap().is_empty());
        assert_eq!(provider.features_for_bounds(&odd, 8).unwrap().len(), 3);
    }

    #[test]
    fn test_load_options_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_zoom": 14, "tolerance": 0.5}}"#).unwrap();

        let options = load_options(file.path()).unwrap();
        assert_eq!(options.max_zoom, 14);
        assert_eq!(options.tolerance, 0.5);
        assert_eq!(options.buffer, GeometrySourceOptions::default().buffer);
    }

    #[test]
    fn test_load_options_reports_bad_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(load_options(file.path()), Err(CliError::Config(_))));
    }

    #[test]
    fn test_simulation_drains() {
        let args = SimulateArgs {
            lat: 47.3769,
            lon: 8.5417,
            zoom: 12,
            grid: 3,
            latency_ms: 0,
            features: 2,
            empty_every: 0,
            cancel_every: 0,
            workers: 2,
            queue_capacity: 80,
            options: None,
            timeout_secs: 10,
        };
        assert!(run(args).is_ok());
    }
}
