//! Lock-free atomic metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::MetricsSnapshot;
use crate::executor::FetchOutcome;

/// Counters for one geometry source.
///
/// All operations use `Relaxed` ordering; the counters are independent
/// measurements and are only ever read through snapshots.
pub struct SourceMetrics {
    start_time: Instant,

    // Dispatch side
    fetches_dispatched: AtomicU64,
    fetches_rejected: AtomicU64,
    cancel_requests: AtomicU64,
    direct_updates: AtomicU64,

    // Worker side
    tiles_delivered: AtomicU64,
    features_delivered: AtomicU64,
    fetches_cancelled: AtomicU64,
    empty_results: AtomicU64,
    owner_gone: AtomicU64,
    provider_failures: AtomicU64,
    task_panics: AtomicU64,
}

impl SourceMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            fetches_dispatched: AtomicU64::new(0),
            fetches_rejected: AtomicU64::new(0),
            cancel_requests: AtomicU64::new(0),
            direct_updates: AtomicU64::new(0),
            tiles_delivered: AtomicU64::new(0),
            features_delivered: AtomicU64::new(0),
            fetches_cancelled: AtomicU64::new(0),
            empty_results: AtomicU64::new(0),
            owner_gone: AtomicU64::new(0),
            provider_failures: AtomicU64::new(0),
            task_panics: AtomicU64::new(0),
        }
    }

    /// A fetch was accepted by the worker pool.
    pub fn fetch_dispatched(&self) {
        self.fetches_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// A fetch was rejected because the queue was full.
    pub fn fetch_rejected(&self) {
        self.fetches_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// `cancel_tile` was called (whether or not the tile was in flight).
    pub fn cancel_requested(&self) {
        self.cancel_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Data was pushed through the public `set_tile_data` entry point.
    pub fn direct_update(&self) {
        self.direct_updates.fetch_add(1, Ordering::Relaxed);
    }

    /// A task panicked; the worker survived and dropped the tile.
    pub fn task_panicked(&self) {
        self.task_panics.fetch_add(1, Ordering::Relaxed);
    }

    /// Records how a task ended.
    pub fn record_outcome(&self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Delivered { features } => {
                self.tiles_delivered.fetch_add(1, Ordering::Relaxed);
                self.features_delivered
                    .fetch_add(*features as u64, Ordering::Relaxed);
            }
            FetchOutcome::Cancelled => {
                self.fetches_cancelled.fetch_add(1, Ordering::Relaxed);
            }
            FetchOutcome::Empty => {
                self.empty_results.fetch_add(1, Ordering::Relaxed);
            }
            FetchOutcome::OwnerGone => {
                self.owner_gone.fetch_add(1, Ordering::Relaxed);
            }
            FetchOutcome::ProviderFailed(_) => {
                self.provider_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Takes a point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime: self.start_time.elapsed(),
            fetches_dispatched: self.fetches_dispatched.load(Ordering::Relaxed),
            fetches_rejected: self.fetches_rejected.load(Ordering::Relaxed),
            cancel_requests: self.cancel_requests.load(Ordering::Relaxed),
            direct_updates: self.direct_updates.load(Ordering::Relaxed),
            tiles_delivered: self.tiles_delivered.load(Ordering::Relaxed),
            features_delivered: self.features_delivered.load(Ordering::Relaxed),
            fetches_cancelled: self.fetches_cancelled.load(Ordering::Relaxed),
            empty_results: self.empty_results.load(Ordering::Relaxed),
            owner_gone: self.owner_gone.load(Ordering::Relaxed),
            provider_failures: self.provider_failures.load(Ordering::Relaxed),
            task_panics: self.task_panics.load(Ordering::Relaxed),
        }
    }
}

impl Default for SourceMetrics {
    fn default() -> Self {
        Self::new()
    }
}
