//! In-flight tile tracking and cooperative cancellation.
//!
//! Every dispatched fetch gets a fresh [`CancellationFlag`]. The flag is
//! shared by exactly two parties: the registry entry for the tile and the one
//! task created for that dispatch. Cancelling a tile sets the flag currently
//! installed for it; the task notices at its next checkpoint and skips
//! delivery.
//!
//! A new fetch for a tile that is already in flight replaces the registry
//! entry. The previous flag is orphaned: it can no longer be reached through
//! the registry, and the task holding it keeps running to completion.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::coord::TileCoordinate;

/// A one-way cancellation marker.
///
/// Clones share the same underlying flag. Once set it stays set.
#[derive(Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag. Returns `true` only for the call that performed the
    /// transition; later calls are no-ops returning `false`.
    pub fn cancel(&self) -> bool {
        self.cancelled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Returns true if both handles refer to the same flag.
    pub fn same_as(&self, other: &CancellationFlag) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

impl fmt::Debug for CancellationFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationFlag")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Concurrent map from tile to the flag of its current dispatch.
///
/// Backed by a sharded map, so point operations on different tiles do not
/// contend on a single lock.
#[derive(Default)]
pub struct CancellationRegistry {
    entries: DashMap<TileCoordinate, CancellationFlag>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `flag` as the current flag for `tile`, returning the flag it
    /// replaced, if any.
    pub fn put(&self, tile: TileCoordinate, flag: CancellationFlag) -> Option<CancellationFlag> {
        self.entries.insert(tile, flag)
    }

    /// Sets the current flag for `tile`.
    ///
    /// Returns `false` if the tile has no entry (never fetched, or already
    /// delivered).
    pub fn cancel(&self, tile: &TileCoordinate) -> bool {
        match self.entries.get(tile) {
            Some(flag) => {
                flag.cancel();
                true
            }
            None => false,
        }
    }

    /// Clears the entry for `tile`, whatever flag it holds.
    pub fn remove(&self, tile: &TileCoordinate) -> Option<CancellationFlag> {
        self.entries.remove(tile).map(|(_, flag)| flag)
    }

    /// Clears the entry for `tile` only if it still holds `flag`.
    ///
    /// A task that was superseded by a newer fetch must not erase the newer
    /// dispatch's entry.
    pub fn remove_if_current(&self, tile: &TileCoordinate, flag: &CancellationFlag) -> bool {
        self.entries
            .remove_if(tile, |_, current| current.same_as(flag))
            .is_some()
    }

    pub fn contains(&self, tile: &TileCoordinate) -> bool {
        self.entries.contains_key(tile)
    }

    /// Number of tiles with an entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for CancellationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationRegistry")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::thread;

    fn tile() -> TileCoordinate {
        TileCoordinate::new(5, 3, 7)
    }

    #[test]
    fn test_flag_cancel_is_idempotent() {
        let flag = CancellationFlag::new();
        assert!(!flag.is_cancelled());
        assert!(flag.cancel());
        assert!(!flag.cancel());
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_flag_clones_share_state() {
        let flag = CancellationFlag::new();
        let clone = flag.clone();
        clone.cancel();
        assert!(flag.is_cancelled());
        assert!(flag.same_as(&clone));
        assert!(!flag.same_as(&CancellationFlag::new()));
    }

    #[test]
    fn test_cancel_sets_current_flag() {
        let registry = CancellationRegistry::new();
        let flag = CancellationFlag::new();
        registry.put(tile(), flag.clone());

        assert!(registry.cancel(&tile()));
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_cancel_unknown_tile_is_noop() {
        let registry = CancellationRegistry::new();
        assert!(!registry.cancel(&tile()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_put_orphans_previous_flag() {
        let registry = CancellationRegistry::new();
        let first = CancellationFlag::new();
        let second = CancellationFlag::new();

        assert!(registry.put(tile(), first.clone()).is_none());
        let replaced = registry.put(tile(), second.clone()).unwrap();
        assert!(replaced.same_as(&first));
        assert_eq!(registry.len(), 1);

        registry.cancel(&tile());
        assert!(second.is_cancelled());
        assert!(!first.is_cancelled(), "orphaned flag is unreachable");
    }

    #[test]
    fn test_remove_if_current_ignores_superseded_flag() {
        let registry = CancellationRegistry::new();
        let first = CancellationFlag::new();
        let second = CancellationFlag::new();
        registry.put(tile(), first.clone());
        registry.put(tile(), second.clone());

        assert!(!registry.remove_if_current(&tile(), &first));
        assert!(registry.contains(&tile()));

        assert!(registry.remove_if_current(&tile(), &second));
        assert!(!registry.contains(&tile()));
    }

    #[test]
    fn test_remove_clears_any_flag() {
        let registry = CancellationRegistry::new();
        registry.put(tile(), CancellationFlag::new());
        assert!(registry.remove(&tile()).is_some());
        assert!(registry.remove(&tile()).is_none());
    }

    #[test]
    fn test_concurrent_put_and_cancel() {
        let registry = Arc::new(CancellationRegistry::new());
        let mut handles = Vec::new();

        for worker in 0..4u32 {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for i in 0..250u32 {
                    let tile = TileCoordinate::new(10, worker, i);
                    let flag = CancellationFlag::new();
                    registry.put(tile, flag.clone());
                    assert!(registry.cancel(&tile));
                    assert!(flag.is_cancelled());
                    assert!(registry.remove_if_current(&tile, &flag));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(registry.is_empty());
    }

    proptest! {
        #[test]
        fn prop_cancel_reaches_only_latest_flag(
            zoom in 0u8..=22,
            x in 0u32..1024,
            y in 0u32..1024,
            dispatches in 1usize..8,
        ) {
            let registry = CancellationRegistry::new();
            let tile = TileCoordinate::new(zoom, x, y);
            let flags: Vec<_> = (0..dispatches).map(|_| CancellationFlag::new()).collect();
            for flag in &flags {
                registry.put(tile, flag.clone());
            }

            prop_assert!(registry.cancel(&tile));
            let (latest, older) = flags.split_last().unwrap();
            prop_assert!(latest.is_cancelled());
            prop_assert!(older.iter().all(|flag| !flag.is_cancelled()));
            prop_assert_eq!(registry.len(), 1);
        }
    }
}
