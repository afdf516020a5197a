//! Fetch task: one provider call and at most one delivery.
//!
//! A task runs exactly once on a worker thread:
//!
//! ```text
//! flag set? ──yes──► Cancelled
//!    │ no
//!    ▼
//! provider ──Err──► ProviderFailed
//!    │ Ok
//!    ▼
//! empty? ──yes──► Empty
//!    │ no
//!    ▼
//! owner alive? ──no──► OwnerGone
//!    │ yes
//!    ▼
//! flag set? ──yes──► Cancelled
//!    │ no
//!    ▼
//! deliver ──► Delivered
//! ```
//!
//! The flag is checked twice because cancellation can arrive before the
//! provider call starts or while it is blocked inside it. The owner is held
//! weakly; a released owner turns delivery into a no-op.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::coord::{LatLngBounds, TileCoordinate};
use crate::geometry::FeatureCollection;
use crate::provider::{ProviderError, TileProvider};

use super::registry::CancellationFlag;

/// Receives geometry from completed tasks.
///
/// Implemented by [`GeometrySource`](crate::source::GeometrySource); the
/// delivery clears the tile's in-flight entry if `flag` is still the current
/// one, then forwards the data.
pub trait TileSink: Send + Sync {
    fn deliver(&self, tile: TileCoordinate, data: FeatureCollection, flag: &CancellationFlag);
}

/// How a task ended.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Geometry was handed to the owner.
    Delivered { features: usize },
    /// The flag was set at one of the checkpoints.
    Cancelled,
    /// The provider had nothing for this tile.
    Empty,
    /// The owner was released before delivery.
    OwnerGone,
    /// The provider returned an error.
    ProviderFailed(ProviderError),
}

impl FetchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    /// Short label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered { .. } => "delivered",
            Self::Cancelled => "cancelled",
            Self::Empty => "empty",
            Self::OwnerGone => "owner_gone",
            Self::ProviderFailed(_) => "provider_failed",
        }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivered { features } => write!(f, "delivered ({} features)", features),
            Self::ProviderFailed(e) => write!(f, "provider failed: {}", e),
            other => f.write_str(other.as_str()),
        }
    }
}

/// One unit of fetch work.
pub struct FetchTask {
    tile: TileCoordinate,
    provider: Arc<dyn TileProvider>,
    owner: Weak<dyn TileSink>,
    flag: CancellationFlag,
}

impl FetchTask {
    pub fn new(
        tile: TileCoordinate,
        provider: Arc<dyn TileProvider>,
        owner: Weak<dyn TileSink>,
        flag: CancellationFlag,
    ) -> Self {
        Self {
            tile,
            provider,
            owner,
            flag,
        }
    }

    pub fn tile(&self) -> TileCoordinate {
        self.tile
    }

    /// Runs the task to completion on the calling thread.
    pub fn run(self) -> FetchOutcome {
        if self.flag.is_cancelled() {
            return FetchOutcome::Cancelled;
        }

        let bounds = LatLngBounds::from_tile(&self.tile);
        let data = match self.provider.features_for_bounds(&bounds, self.tile.zoom) {
            Ok(data) => data,
            Err(e) => return FetchOutcome::ProviderFailed(e),
        };

        if data.is_empty() {
            return FetchOutcome::Empty;
        }

        let Some(owner) = self.owner.upgrade() else {
            return FetchOutcome::OwnerGone;
        };

        if self.flag.is_cancelled() {
            return FetchOutcome::Cancelled;
        }

        let features = data.len();
        owner.deliver(self.tile, data, &self.flag);
        FetchOutcome::Delivered { features }
    }
}

impl fmt::Debug for FetchTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchTask")
            .field("tile", &self.tile)
            .field("flag", &self.flag)
            .finish()
    }
}
