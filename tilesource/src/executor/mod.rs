//! Background fetch engine.
//!
//! ```text
//! fetch_tile ──► CancellationRegistry.put(tile, flag)
//!      │
//!      ▼
//! WorkerPool.submit(FetchTask) ──full──► Rejection::QueueFull
//!      │
//!      ▼  (worker thread)
//! FetchTask.run ──► TileProvider ──► TileSink.deliver
//! ```
//!
//! The registry holds the flag of the latest dispatch per tile, the pool
//! bounds concurrency and queue depth, and each task carries its own flag so
//! that cancellation stays per-dispatch.

mod pool;
mod registry;
mod task;

pub use pool::{
    Rejection, WorkerPool, WorkerPoolConfig, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKER_COUNT,
};
pub use registry::{CancellationFlag, CancellationRegistry};
pub use task::{FetchOutcome, FetchTask, TileSink};
