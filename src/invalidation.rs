//! Debug-only cursor invalidation tracking.
//!
//! Cursors are plain `(bucket, offset)` positions, so the borrow checker
//! cannot see when a mutation moves the bytes they point at. In debug
//! builds each table carries an epoch (table id, generation) and each
//! cursor is stamped with the epoch it was minted under. Operations that
//! invalidate cursors bump the generation; checking a stale or foreign
//! stamp panics. In release builds both types are zero-sized no-ops.

#[cfg(debug_assertions)]
use core::sync::atomic::{AtomicU64, Ordering};

#[cfg(debug_assertions)]
static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Per-table epoch. Embed in a table and stamp every cursor it hands out.
#[derive(Debug)]
pub(crate) struct DebugEpoch {
    #[cfg(debug_assertions)]
    table: u64,
    #[cfg(debug_assertions)]
    generation: u64,
}

/// Epoch a cursor was minted under.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Stamp {
    #[cfg(debug_assertions)]
    table: u64,
    #[cfg(debug_assertions)]
    generation: u64,
}

impl DebugEpoch {
    pub(crate) fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            table: NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed),
            #[cfg(debug_assertions)]
            generation: 0,
        }
    }

    #[inline]
    pub(crate) fn stamp(&self) -> Stamp {
        Stamp {
            #[cfg(debug_assertions)]
            table: self.table,
            #[cfg(debug_assertions)]
            generation: self.generation,
        }
    }

    /// Marks every previously stamped cursor as stale.
    #[inline]
    pub(crate) fn invalidate(&mut self) {
        #[cfg(debug_assertions)]
        {
            self.generation = self.generation.wrapping_add(1);
        }
    }

    /// Panics in debug builds if `stamp` is stale or from another table.
    #[inline]
    pub(crate) fn check(&self, stamp: Stamp) {
        #[cfg(debug_assertions)]
        {
            assert!(
                stamp.table == self.table,
                "cursor used with a table it was not obtained from"
            );
            assert!(
                stamp.generation == self.generation,
                "cursor used after an operation invalidated it"
            );
        }
        #[cfg(not(debug_assertions))]
        let _ = stamp;
    }
}

impl Default for DebugEpoch {
    fn default() -> Self {
        Self::new()
    }
}

// A clone is a different table: cursors from the source must not pass.
impl Clone for DebugEpoch {
    fn clone(&self) -> Self {
        Self::new()
    }
}
