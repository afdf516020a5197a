//! Renderer collaborator interface.
//!
//! The renderer decides which tiles are needed, drives
//! [`GeometrySource::fetch_tile`](crate::source::GeometrySource::fetch_tile) and
//! [`cancel_tile`](crate::source::GeometrySource::cancel_tile), and receives
//! the delivered geometry. It also owns invalidation policy and answers
//! feature queries against the data it holds.
//!
//! [`RecordingRenderer`] is an in-memory implementation that keeps every
//! delivered tile and logs each call. It is used by the CLI simulator and the
//! test suites.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::coord::{LatLngBounds, TileCoordinate};
use crate::geometry::{Feature, FeatureCollection, Filter};
use crate::source::GeometrySourceOptions;

/// Receiving side of a geometry source.
///
/// All methods may be called from any thread, including fetch workers.
pub trait NativeRenderer: Send + Sync {
    /// A source with this id has been created.
    fn attach(&self, _source_id: &str, _options: &GeometrySourceOptions) {}

    /// The source with this id has been released.
    fn detach(&self, _source_id: &str) {}

    /// Geometry for a tile is available.
    fn set_tile_data(&self, tile: TileCoordinate, data: FeatureCollection);

    /// The contents of one tile are stale.
    fn invalidate_tile(&self, tile: TileCoordinate);

    /// Everything intersecting `bounds`, at all zoom levels, is stale.
    fn invalidate_region(&self, bounds: LatLngBounds);

    /// Returns the features matching `filter`, or `None` if the renderer has
    /// no answer.
    fn query_source_features(&self, filter: Option<&Filter>) -> Option<Vec<Feature>>;
}

/// A call received by [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Attached { source_id: String },
    Detached { source_id: String },
    TileData { tile: TileCoordinate, features: usize },
    InvalidatedTile(TileCoordinate),
    InvalidatedRegion(LatLngBounds),
}

#[derive(Default)]
struct RecorderState {
    events: Vec<RenderEvent>,
    tiles: HashMap<TileCoordinate, FeatureCollection>,
    deliveries: usize,
}

/// In-memory renderer that records every call.
///
/// Queries return the features of every stored tile; filters are not
/// evaluated.
pub struct RecordingRenderer {
    state: Mutex<RecorderState>,
    delivered: Condvar,
    answers_queries: bool,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RecorderState::default()),
            delivered: Condvar::new(),
            answers_queries: true,
        }
    }

    /// A renderer that answers every query with `None`.
    pub fn without_query_answers() -> Self {
        Self {
            answers_queries: false,
            ..Self::new()
        }
    }

    /// All calls received so far, in order.
    pub fn events(&self) -> Vec<RenderEvent> {
        self.state.lock().events.clone()
    }

    /// Total number of `set_tile_data` calls.
    pub fn deliveries(&self) -> usize {
        self.state.lock().deliveries
    }

    /// Number of `set_tile_data` calls for one tile.
    pub fn deliveries_for(&self, tile: &TileCoordinate) -> usize {
        self.state
            .lock()
            .events
            .iter()
            .filter(|event| matches!(event, RenderEvent::TileData { tile: t, .. } if t == tile))
            .count()
    }

    /// Latest data stored for a tile.
    pub fn tile(&self, tile: &TileCoordinate) -> Option<FeatureCollection> {
        self.state.lock().tiles.get(tile).cloned()
    }

    /// Blocks until at least `count` deliveries have been received or the
    /// timeout expires. Returns whether the count was reached.
    pub fn wait_for_deliveries(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.deliveries < count {
            if self.delivered.wait_until(&mut state, deadline).timed_out() {
                return state.deliveries >= count;
            }
        }
        true
    }
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeRenderer for RecordingRenderer {
    fn attach(&self, source_id: &str, _options: &GeometrySourceOptions) {
        self.state.lock().events.push(RenderEvent::Attached {
            source_id: source_id.to_string(),
        });
    }

    fn detach(&self, source_id: &str) {
        self.state.lock().events.push(RenderEvent::Detached {
            source_id: source_id.to_string(),
        });
    }

    fn set_tile_data(&self, tile: TileCoordinate, data: FeatureCollection) {
        let mut state = self.state.lock();
        state.events.push(RenderEvent::TileData {
            tile,
            features: data.len(),
        });
        state.tiles.insert(tile, data);
        state.deliveries += 1;
        drop(state);
        self.delivered.notify_all();
    }

    fn invalidate_tile(&self, tile: TileCoordinate) {
        self.state
            .lock()
            .events
            .push(RenderEvent::InvalidatedTile(tile));
    }

    fn invalidate_region(&self, bounds: LatLngBounds) {
        self.state
            .lock()
            .events
            .push(RenderEvent::InvalidatedRegion(bounds));
    }

    fn query_source_features(&self, _filter: Option<&Filter>) -> Option<Vec<Feature>> {
        if !self.answers_queries {
            return None;
        }
        let state = self.state.lock();
        Some(
            state
                .tiles
                .values()
                .flat_map(|collection| collection.iter().cloned())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_records_tile_data() {
        let renderer = RecordingRenderer::new();
        let tile = TileCoordinate::new(5, 3, 7);
        renderer.set_tile_data(tile, vec![Feature::new(json!(null))].into());

        assert_eq!(renderer.deliveries(), 1);
        assert_eq!(renderer.deliveries_for(&tile), 1);
        assert_eq!(renderer.tile(&tile).map(|c| c.len()), Some(1));
        assert_eq!(
            renderer.events(),
            vec![RenderEvent::TileData { tile, features: 1 }]
        );
    }

    #[test]
    fn test_query_without_answers() {
        let renderer = RecordingRenderer::without_query_answers();
        renderer.set_tile_data(
            TileCoordinate::new(1, 0, 0),
            vec![Feature::new(json!(null))].into(),
        );
        assert_eq!(renderer.query_source_features(None), None);
    }

    #[test]
    fn test_wait_for_deliveries_from_other_thread() {
        let renderer = Arc::new(RecordingRenderer::new());
        let remote = Arc::clone(&renderer);

        let handle = thread::spawn(move || {
            for x in 0..3 {
                remote.set_tile_data(TileCoordinate::new(2, x, 0), FeatureCollection::new());
            }
        });

        assert!(renderer.wait_for_deliveries(3, Duration::from_secs(5)));
        handle.join().unwrap();
    }

    #[test]
    fn test_wait_for_deliveries_times_out() {
        let renderer = RecordingRenderer::new();
        assert!(!renderer.wait_for_deliveries(1, Duration::from_millis(20)));
    }
}
