//! Point-in-time metrics snapshot.

use std::fmt;
use std::time::Duration;

/// An immutable copy of [`SourceMetrics`](super::SourceMetrics).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Time since the source was created
    pub uptime: Duration,

    /// Fetches accepted by the worker pool
    pub fetches_dispatched: u64,
    /// Fetches rejected with backpressure
    pub fetches_rejected: u64,
    /// Calls to `cancel_tile`
    pub cancel_requests: u64,
    /// Calls to the public `set_tile_data`
    pub direct_updates: u64,

    /// Tiles handed to the renderer by workers
    pub tiles_delivered: u64,
    /// Features contained in delivered tiles
    pub features_delivered: u64,
    /// Tasks that observed their cancellation flag
    pub fetches_cancelled: u64,
    /// Tasks whose provider returned no features
    pub empty_results: u64,
    /// Tasks that found their source released
    pub owner_gone: u64,
    /// Tasks whose provider returned an error
    pub provider_failures: u64,
    /// Tasks that panicked
    pub task_panics: u64,
}

impl MetricsSnapshot {
    /// Tasks that have finished, whatever the outcome.
    pub fn fetches_completed(&self) -> u64 {
        self.tiles_delivered
            + self.fetches_cancelled
            + self.empty_results
            + self.owner_gone
            + self.provider_failures
            + self.task_panics
    }

    /// Accepted fetches that have not finished yet (queued or running).
    pub fn fetches_pending(&self) -> u64 {
        self.fetches_dispatched
            .saturating_sub(self.fetches_completed())
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Uptime:             {:.2}s", self.uptime.as_secs_f64())?;
        writeln!(f, "Fetches dispatched: {}", self.fetches_dispatched)?;
        writeln!(f, "Fetches rejected:   {}", self.fetches_rejected)?;
        writeln!(f, "Cancel requests:    {}", self.cancel_requests)?;
        writeln!(
            f,
            "Tiles delivered:    {} ({} features)",
            self.tiles_delivered, self.features_delivered
        )?;
        writeln!(f, "Cancelled:          {}", self.fetches_cancelled)?;
        writeln!(f, "Empty results:      {}", self.empty_results)?;
        writeln!(f, "Owner released:     {}", self.owner_gone)?;
        writeln!(
            f,
            "Provider failures:  {} ({} panics)",
            self.provider_failures, self.task_panics
        )?;
        write!(f, "Direct updates:     {}", self.direct_updates)
    }
}
