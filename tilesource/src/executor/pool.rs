//! Fixed-size worker pool with a bounded submission queue.
//!
//! Workers are plain OS threads sharing one receiver. Submission never
//! blocks: when the queue is full the task is handed back to the caller as a
//! [`Rejection`]. Dropping the pool closes the queue; workers finish whatever
//! is already queued and then exit on their own.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use tracing::{debug, error, trace, warn};

use super::task::{FetchOutcome, FetchTask};
use crate::telemetry::SourceMetrics;

/// Number of worker threads per source.
pub const DEFAULT_WORKER_COUNT: usize = 2;

/// Number of tasks that may wait for a worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 80;

// =============================================================================
// Configuration
// =============================================================================

/// Sizing of a [`WorkerPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl WorkerPoolConfig {
    pub fn new(workers: usize, queue_capacity: usize) -> Self {
        Self {
            workers,
            queue_capacity,
        }
    }

    /// Returns a copy with both sizes raised to at least one.
    pub fn normalized(self) -> Self {
        Self {
            workers: self.workers.max(1),
            queue_capacity: self.queue_capacity.max(1),
        }
    }
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_COUNT, DEFAULT_QUEUE_CAPACITY)
    }
}

// =============================================================================
// Pool
// =============================================================================

/// Why a task was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Every worker is busy and the queue is at capacity.
    QueueFull,
    /// All workers have exited.
    Closed,
}

/// Runs [`FetchTask`]s on a fixed set of threads.
pub struct WorkerPool {
    sender: Sender<FetchTask>,
    config: WorkerPoolConfig,
}

impl WorkerPool {
    /// Spawns the workers. Threads are named `{name}-fetch-{index}`.
    pub fn start(
        name: &str,
        config: WorkerPoolConfig,
        metrics: Arc<SourceMetrics>,
    ) -> io::Result<Self> {
        let config = config.normalized();
        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        for index in 0..config.workers {
            let receiver = Arc::clone(&receiver);
            let metrics = Arc::clone(&metrics);
            thread::Builder::new()
                .name(format!("{}-fetch-{}", name, index))
                .spawn(move || worker_loop(receiver, metrics))?;
        }

        debug!(
            pool = name,
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            "Worker pool started"
        );

        Ok(Self { sender, config })
    }

    /// Queues a task without blocking.
    pub fn submit(&self, task: FetchTask) -> Result<(), Rejection> {
        self.sender.try_send(task).map_err(|e| match e {
            TrySendError::Full(_) => Rejection::QueueFull,
            TrySendError::Closed(_) => Rejection::Closed,
        })
    }

    /// Tasks waiting for a worker.
    pub fn queued(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.config.queue_capacity
    }

    pub fn workers(&self) -> usize {
        self.config.workers
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.config.workers)
            .field("queue_capacity", &self.config.queue_capacity)
            .field("queued", &self.queued())
            .finish()
    }
}

// =============================================================================
// Worker
// =============================================================================

fn worker_loop(receiver: Arc<Mutex<Receiver<FetchTask>>>, metrics: Arc<SourceMetrics>) {
    loop {
        // The guard is released before the task runs.
        let next = receiver.lock().blocking_recv();
        let Some(task) = next else {
            break;
        };
        let tile = task.tile();

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| task.run())) {
            Ok(outcome) => outcome,
            Err(payload) => {
                metrics.task_panicked();
                error!(
                    tile = %tile,
                    panic = panic_message(payload.as_ref()),
                    "Fetch task panicked, tile dropped"
                );
                continue;
            }
        };

        metrics.record_outcome(&outcome);
        match &outcome {
            FetchOutcome::Delivered { features } => {
                debug!(tile = %tile, features, "Tile delivered")
            }
            FetchOutcome::Cancelled => debug!(tile = %tile, "Fetch cancelled"),
            FetchOutcome::OwnerGone => debug!(tile = %tile, "Source released, result dropped"),
            FetchOutcome::Empty => trace!(tile = %tile, "Provider returned no features"),
            FetchOutcome::ProviderFailed(e) => {
                warn!(tile = %tile, error = %e, "Provider failed, tile dropped")
            }
        }
    }

    trace!("Fetch worker exiting");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
