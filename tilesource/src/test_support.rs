//! Shared helpers for unit tests.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde_json::json;

use crate::coord::{LatLngBounds, TileCoordinate};
use crate::geometry::{Feature, FeatureCollection};
use crate::provider::{ProviderError, TileProvider};

pub const WAIT: Duration = Duration::from_secs(5);

/// Holds provider calls until opened, and counts how many arrived.
#[derive(Default)]
pub struct Gate {
    state: Mutex<GateState>,
    changed: Condvar,
}

#[derive(Default)]
struct GateState {
    open: bool,
    arrived: usize,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers an arrival and blocks until the gate opens.
    pub fn pass(&self) {
        let mut state = self.state.lock();
        state.arrived += 1;
        self.changed.notify_all();
        while !state.open {
            self.changed.wait(&mut state);
        }
    }

    pub fn open(&self) {
        self.state.lock().open = true;
        self.changed.notify_all();
    }

    /// Waits until `count` callers are blocked in (or went through) the gate.
    pub fn wait_for_arrivals(&self, count: usize) -> bool {
        let deadline = Instant::now() + WAIT;
        let mut state = self.state.lock();
        while state.arrived < count {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                return state.arrived >= count;
            }
        }
        true
    }
}

pub fn features(count: usize) -> FeatureCollection {
    (0..count)
        .map(|i| Feature::new(json!({"type": "Point", "coordinates": [i, i]})))
        .collect()
}

/// Provider that waits at `gate` and then returns `count` features.
pub fn gated_provider(gate: Arc<Gate>, count: usize) -> Arc<dyn TileProvider> {
    Arc::new(
        move |_: &LatLngBounds, _: u8| -> Result<FeatureCollection, ProviderError> {
            gate.pass();
            Ok(features(count))
        },
    )
}

/// Provider that returns `count` features immediately.
pub fn fixed_provider(count: usize) -> Arc<dyn TileProvider> {
    Arc::new(
        move |_: &LatLngBounds, _: u8| -> Result<FeatureCollection, ProviderError> {
            Ok(features(count))
        },
    )
}

pub fn tile(x: u32) -> TileCoordinate {
    TileCoordinate::new(12, x, 0)
}

/// Polls `condition` until it holds or [`WAIT`] elapses.
pub fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}
