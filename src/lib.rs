//! array-hash: a cache-conscious hash set and map for string keys.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep every key of a bucket in one contiguous byte buffer so a
//!   lookup touches one allocation and scans it linearly, instead of
//!   chasing a pointer per entry.
//! - Layers:
//!   - ArrayHash<S, E, L, G>: the engine. Owns the bucket array, hashes
//!     `&[u8]` keys, enforces the load factor and hands out `Cursor`s.
//!   - ArraySet: keys only, accepts anything `AsRef<[u8]>`.
//!   - ArrayMap<V>: an 8-byte value region per entry holding a `slotmap`
//!     key; the `V`s live in a `SlotMap` and never move on rehash.
//!
//! Entry layout
//! - `[key length, L::WIDTH bytes LE][key bytes][0x00 if terminators are
//!   stored][value_size bytes]`, entries back to back, no padding.
//! - `L` is the key-length width (`u8`, `u16`, `u32`); the longest key is
//!   `L::MAX - 1` bytes.
//!
//! Strategies
//! - Hasher: any `BuildHasher`, default hashbrown's.
//! - Key equality: `KeyEq` over byte slices, default `BytewiseEq`.
//! - Growth: `PowerOfTwoGrowth` (mask indexing) or `PrimeGrowth` (modulo
//!   over a fixed prime table).
//!
//! Cursors
//! - A `Cursor` is a `(bucket, offset)` position and does not borrow the
//!   table. Mutations that move bytes invalidate outstanding cursors; in
//!   debug builds an epoch check panics on stale or foreign cursors.
//! - Borrowed views (`EntryRef`, `EntryMut`, iterators) are ordinary
//!   lifetime-bound slices.
//!
//! Failure model
//! - Fallible operations return `TableError`. Allocation failure is
//!   reported, not aborted on; a failed rehash leaves the table as it was
//!   and a failed insert leaves no partial entry behind.

mod array_hash;
mod array_hash_proptest;
mod bucket;
mod codec;
mod config;
mod error;
mod growth;
mod hash;
mod invalidation;
mod iter;
mod map;
mod set;

// Public surface
pub use array_hash::ArrayHash;
pub use codec::KeyLen;
pub use config::{
    TableConfig, DEFAULT_BUCKET_COUNT, DEFAULT_MAX_LOAD_FACTOR, MAX_SIZE, MIN_MAX_LOAD_FACTOR,
};
pub use error::TableError;
pub use growth::{GrowthPolicy, PowerOfTwoGrowth, PrimeGrowth};
pub use hash::{BytewiseEq, DefaultHashBuilder, KeyEq};
pub use iter::{Cursor, EntryMut, EntryRef, Iter, IterMut};
pub use map::{ArrayMap, MapIter};
pub use set::{ArraySet, Keys};
