//! Errors returned by [`GeometrySource`](super::GeometrySource).

use thiserror::Error;

use crate::coord::TileCoordinate;

/// Errors from source construction and dispatch.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The fetch queue is full; the request was dropped and not registered.
    #[error("Fetch queue full ({capacity} pending), dropped request for tile {tile}")]
    Backpressure {
        tile: TileCoordinate,
        capacity: usize,
    },

    /// The worker pool has shut down.
    #[error("Worker pool closed, dropped request for tile {tile}")]
    PoolClosed { tile: TileCoordinate },

    /// Worker threads could not be started.
    #[error("Failed to spawn fetch worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

impl SourceError {
    /// True if the request may succeed once the queue drains.
    pub fn is_backpressure(&self) -> bool {
        matches!(self, Self::Backpressure { .. })
    }
}
