//! Fetch engine telemetry.
//!
//! Lock-free atomic counters updated from the dispatch path and the worker
//! threads, with point-in-time snapshots for display.
//!
//! ```text
//! fetch_tile / cancel_tile ──┐
//!                            ├──► SourceMetrics ──► MetricsSnapshot ──► CLI, logs
//! worker outcomes ───────────┘    (atomic counters)  (plain copy)
//! ```

mod metrics;
mod snapshot;

pub use metrics::SourceMetrics;
pub use snapshot::MetricsSnapshot;
