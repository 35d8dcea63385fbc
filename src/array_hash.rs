//! ArrayHash: the packed-bucket engine behind the set and map adapters.
//!
//! Keys arrive as `&[u8]`. The engine hashes them, picks a bucket through
//! the growth policy and scans that bucket's packed bytes. Positions are
//! handed out as [`Cursor`]s.
//!
//! Cursor invalidation:
//! - `insert`: only when it triggers a rehash.
//! - `erase`, `erase_at`, `erase_range`: always.
//! - `rehash`, `reserve`, `shrink_to_fit`, `clear`: always.
//! - `swap`: cursors follow the contents they were obtained from.

use crate::bucket::Bucket;
use crate::codec::{EntryLayout, KeyLen};
use crate::config::{clamp_load_factor, TableConfig, DEFAULT_BUCKET_COUNT};
use crate::error::TableError;
use crate::growth::{GrowthPolicy, PowerOfTwoGrowth};
use crate::hash::{hash_key, BytewiseEq, DefaultHashBuilder, KeyEq};
use crate::invalidation::DebugEpoch;
use crate::iter::{self, Cursor, EntryMut, EntryRef, Iter, IterMut};
use core::fmt;
use core::hash::BuildHasher;

/// Packed string-key hash table.
///
/// - `S`: hasher family for key bytes.
/// - `E`: key equality.
/// - `L`: width of the per-entry key-length prefix; bounds
///   [`max_key_size`](Self::max_key_size).
/// - `G`: growth policy.
#[derive(Clone)]
pub struct ArrayHash<S = DefaultHashBuilder, E = BytewiseEq, L = u16, G = PowerOfTwoGrowth> {
    hasher: S,
    key_eq: E,
    policy: G,
    layout: EntryLayout<L>,
    buckets: Vec<Bucket>,
    len: usize,
    max_load_factor: f32,
    max_size: usize,
    epoch: DebugEpoch,
}

impl ArrayHash {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_bucket_count(bucket_count: usize) -> Result<Self, TableError> {
        Self::with_config(
            TableConfig::default().bucket_count(bucket_count),
            Default::default(),
            BytewiseEq,
        )
    }
}

impl Default for ArrayHash {
    fn default() -> Self {
        Self::new()
    }
}

fn alloc_buckets(count: usize) -> Result<Vec<Bucket>, TableError> {
    let mut buckets = Vec::new();
    buckets.try_reserve_exact(count)?;
    buckets.resize_with(count, Bucket::default);
    Ok(buckets)
}

impl<S, E, L, G> ArrayHash<S, E, L, G>
where
    S: BuildHasher,
    E: KeyEq,
    L: KeyLen,
    G: GrowthPolicy,
{
    /// Default settings with the given hasher.
    pub fn with_hasher(hasher: S) -> Self
    where
        E: Default,
    {
        Self::with_layout(TableConfig::default(), hasher, E::default())
    }

    /// Infallible sibling of [`with_config`](Self::with_config) that uses
    /// the default bucket count, falling back to the policy minimum.
    pub(crate) fn with_layout(config: TableConfig, hasher: S, key_eq: E) -> Self {
        let policy = G::default();
        let count = policy
            .bucket_count_for(DEFAULT_BUCKET_COUNT)
            .unwrap_or_else(|_| policy.min_bucket_count());
        Self {
            hasher,
            key_eq,
            policy,
            layout: EntryLayout::new(config.store_terminator, config.value_size),
            buckets: (0..count).map(|_| Bucket::default()).collect(),
            len: 0,
            max_load_factor: config.clamped_load_factor(),
            max_size: config.clamped_max_size(),
            epoch: DebugEpoch::new(),
        }
    }

    pub fn with_config(config: TableConfig, hasher: S, key_eq: E) -> Result<Self, TableError> {
        let policy = G::default();
        let count = policy.bucket_count_for(config.bucket_count)?;
        Ok(Self {
            hasher,
            key_eq,
            policy,
            layout: EntryLayout::new(config.store_terminator, config.value_size),
            buckets: alloc_buckets(count)?,
            len: 0,
            max_load_factor: config.clamped_load_factor(),
            max_size: config.clamped_max_size(),
            epoch: DebugEpoch::new(),
        })
    }

    #[inline]
    fn cursor(&self, bucket: usize, offset: usize) -> Cursor {
        Cursor::new(bucket, offset, self.epoch.stamp())
    }

    #[inline]
    fn normalized(&self, bucket: usize, offset: usize) -> Cursor {
        let (bucket, offset) = iter::skip_empty(&self.buckets, bucket, offset);
        self.cursor(bucket, offset)
    }

    #[inline]
    fn bucket_index(&self, hash: u64) -> usize {
        self.policy.index_for(hash, self.buckets.len())
    }

    /// Byte range of the entry at a live cursor. Panics on the end cursor.
    fn entry_span(&self, c: Cursor) -> core::ops::Range<usize> {
        assert!(c.bucket < self.buckets.len(), "end cursor does not name an entry");
        let bytes = self.buckets[c.bucket].bytes();
        let key_len = self.layout.key_len_at(bytes, c.offset);
        c.offset..c.offset + self.layout.entry_len(key_len)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Longest key, in bytes, the table accepts.
    pub fn max_key_size(&self) -> usize {
        EntryLayout::<L>::max_key_size()
    }

    /// Size of the fixed value region of every entry.
    pub fn value_size(&self) -> usize {
        self.layout.value_size()
    }

    pub fn stores_terminator(&self) -> bool {
        self.layout.store_terminator()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn max_bucket_count(&self) -> usize {
        let addressable = isize::MAX as usize / core::mem::size_of::<Bucket>();
        self.policy.max_bucket_count().min(addressable)
    }

    pub fn load_factor(&self) -> f32 {
        self.len as f32 / self.buckets.len() as f32
    }

    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    /// Takes effect on the next insert; values below 0.1 are clamped.
    pub fn set_max_load_factor(&mut self, ml: f32) {
        self.max_load_factor = clamp_load_factor(ml);
    }

    pub fn hash_function(&self) -> &S {
        &self.hasher
    }

    pub fn key_eq(&self) -> &E {
        &self.key_eq
    }

    pub fn find(&self, key: &[u8]) -> Option<Cursor> {
        if key.len() > self.max_key_size() {
            return None;
        }
        let b = self.bucket_index(hash_key(&self.hasher, key));
        self.buckets[b]
            .find(&self.layout, key, &self.key_eq)
            .map(|off| self.cursor(b, off))
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.find(key).is_some()
    }

    /// 0 or 1; keys are unique.
    pub fn count(&self, key: &[u8]) -> usize {
        self.contains(key) as usize
    }

    /// `[found, next)` when present, `[end, end)` otherwise.
    pub fn equal_range(&self, key: &[u8]) -> (Cursor, Cursor) {
        match self.find(key) {
            Some(c) => (c, self.advance(c)),
            None => (self.end(), self.end()),
        }
    }

    pub fn find_mut(&mut self, key: &[u8]) -> Option<EntryMut<'_>> {
        let c = self.find(key)?;
        self.entry_mut(c)
    }

    pub fn begin(&self) -> Cursor {
        self.normalized(0, 0)
    }

    pub fn end(&self) -> Cursor {
        self.cursor(self.buckets.len(), 0)
    }

    /// Cursor of the entry after `c`. Panics on the end cursor.
    pub fn advance(&self, c: Cursor) -> Cursor {
        self.epoch.check(c.stamp);
        assert!(c.bucket < self.buckets.len(), "cannot advance the end cursor");
        let (bucket, offset) = iter::step(&self.buckets, &self.layout, c.bucket, c.offset);
        self.cursor(bucket, offset)
    }

    pub fn entry_at(&self, c: Cursor) -> Option<EntryRef<'_>> {
        self.epoch.check(c.stamp);
        let bucket = self.buckets.get(c.bucket)?;
        Some(EntryRef::decode(bucket.bytes(), &self.layout, c))
    }

    pub fn key_at(&self, c: Cursor) -> Option<&[u8]> {
        self.entry_at(c).map(|e| e.key())
    }

    pub fn value_at(&self, c: Cursor) -> Option<&[u8]> {
        self.entry_at(c).map(|e| e.value())
    }

    /// Mutable view of the entry at `c`. The same cursor works for shared
    /// and mutable access since both name the same bytes.
    pub fn entry_mut(&mut self, c: Cursor) -> Option<EntryMut<'_>> {
        self.epoch.check(c.stamp);
        if c.bucket >= self.buckets.len() {
            return None;
        }
        let span = self.entry_span(c);
        let layout = self.layout;
        let bytes = &mut self.buckets[c.bucket].bytes_mut()[span];
        Some(EntryMut::from_entry(bytes, &layout, c))
    }

    pub fn value_at_mut(&mut self, c: Cursor) -> Option<&mut [u8]> {
        self.entry_mut(c).map(EntryMut::into_value_mut)
    }

    pub fn iter(&self) -> Iter<'_, L> {
        Iter::new(&self.buckets, self.layout, self.len, self.epoch.stamp())
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, L> {
        let stamp = self.epoch.stamp();
        IterMut::new(&mut self.buckets, self.layout, self.len, stamp)
    }

    /// Inserts `key` into a table without a value region.
    ///
    /// Returns the cursor of the stored key and whether it was newly
    /// inserted. An existing key is left untouched.
    pub fn insert(&mut self, key: &[u8]) -> Result<(Cursor, bool), TableError> {
        self.insert_with_value(key, &[])
    }

    /// Inserts `key` with `value` bytes, which must be exactly
    /// [`value_size`](Self::value_size) long. An existing key keeps its
    /// value.
    pub fn insert_with_value(&mut self, key: &[u8], value: &[u8]) -> Result<(Cursor, bool), TableError> {
        let max = self.max_key_size();
        if key.len() > max {
            return Err(TableError::KeyTooLong { len: key.len(), max });
        }
        if value.len() != self.layout.value_size() {
            return Err(TableError::ValueSizeMismatch {
                len: value.len(),
                expected: self.layout.value_size(),
            });
        }
        if self.len >= self.max_size {
            return Err(TableError::CapacityExceeded { max: self.max_size });
        }

        let hash = hash_key(&self.hasher, key);
        let b = self.bucket_index(hash);
        if let Some(off) = self.buckets[b].find(&self.layout, key, &self.key_eq) {
            return Ok((self.cursor(b, off), false));
        }

        let start = self.buckets[b].append_entry(&self.layout, key, value)?;
        self.len += 1;
        if self.load_factor() <= self.max_load_factor {
            return Ok((self.cursor(b, start), true));
        }

        let grown = self
            .policy
            .next_count(self.buckets.len())
            .and_then(|count| self.rehash(count));
        if let Err(e) = grown {
            log::warn!("rehash after insert failed, rolling back insert: {e}");
            self.buckets[b].truncate(start);
            self.len -= 1;
            return Err(e);
        }
        let b = self.bucket_index(hash);
        let off = self.buckets[b]
            .find(&self.layout, key, &self.key_eq)
            .expect("entry must exist immediately after successful insert");
        Ok((self.cursor(b, off), true))
    }

    /// Removes `key`; returns how many entries were removed (0 or 1).
    pub fn erase(&mut self, key: &[u8]) -> usize {
        let removed = match self.find(key) {
            Some(c) => {
                let span = self.entry_span(c);
                self.buckets[c.bucket].remove_range(span);
                self.len -= 1;
                1
            }
            None => 0,
        };
        self.epoch.invalidate();
        removed
    }

    /// Removes the entry at `c` and returns the cursor of the entry that
    /// followed it. Panics on the end cursor.
    pub fn erase_at(&mut self, c: Cursor) -> Cursor {
        self.epoch.check(c.stamp);
        let span = self.entry_span(c);
        self.buckets[c.bucket].remove_range(span);
        self.len -= 1;
        self.epoch.invalidate();
        // The next entry of the same bucket has shifted into `c.offset`.
        self.normalized(c.bucket, c.offset)
    }

    /// Removes every entry in `[first, last)` and returns the cursor of the
    /// entry `last` named.
    pub fn erase_range(&mut self, first: Cursor, last: Cursor) -> Cursor {
        self.epoch.check(first.stamp);
        self.epoch.check(last.stamp);
        debug_assert!(
            (first.bucket, first.offset) <= (last.bucket, last.offset),
            "erase_range bounds out of order"
        );
        if first == last {
            self.epoch.invalidate();
            return self.normalized(first.bucket, first.offset);
        }

        let layout = self.layout;
        let mut removed = 0;
        let next = if first.bucket == last.bucket {
            let bucket = &mut self.buckets[first.bucket];
            removed += bucket.count_entries(&layout, first.offset..last.offset);
            bucket.remove_range(first.offset..last.offset);
            (first.bucket, first.offset)
        } else {
            let head = &mut self.buckets[first.bucket];
            let used = head.used();
            removed += head.count_entries(&layout, first.offset..used);
            head.remove_range(first.offset..used);

            let middle_end = last.bucket.min(self.buckets.len());
            for bucket in &mut self.buckets[first.bucket + 1..middle_end] {
                removed += bucket.count_entries(&layout, 0..bucket.used());
                bucket.truncate(0);
            }

            if let Some(tail) = self.buckets.get_mut(last.bucket) {
                removed += tail.count_entries(&layout, 0..last.offset);
                tail.remove_range(0..last.offset);
            }
            (last.bucket, 0)
        };

        self.len -= removed;
        self.epoch.invalidate();
        self.normalized(next.0, next.1)
    }

    /// Releases every bucket buffer. The bucket count is kept.
    pub fn clear(&mut self) {
        log::trace!("clearing {} entries over {} buckets", self.len, self.buckets.len());
        self.buckets.iter_mut().for_each(Bucket::release);
        self.len = 0;
        self.epoch.invalidate();
    }

    /// Rebuilds the bucket store with at least `requested` buckets, and
    /// never fewer than keep the load factor within bounds.
    ///
    /// The new store is fully built before the old one is dropped; on
    /// failure the table is unchanged.
    pub fn rehash(&mut self, requested: usize) -> Result<(), TableError> {
        let min = (self.len as f64 / self.max_load_factor as f64).ceil() as usize;
        let count = self.policy.bucket_count_for(requested.max(min))?;
        let mut fresh = alloc_buckets(count)?;
        for old in &self.buckets {
            let bytes = old.bytes();
            for (start, key_len) in old.entries(&self.layout) {
                let key = &bytes[self.layout.key_span(start, key_len)];
                let b = self.policy.index_for(hash_key(&self.hasher, key), count);
                fresh[b].append_raw(&bytes[start..start + self.layout.entry_len(key_len)])?;
            }
        }
        log::debug!(
            "rehashed {} entries from {} to {} buckets",
            self.len,
            self.buckets.len(),
            count
        );
        self.buckets = fresh;
        self.epoch.invalidate();
        Ok(())
    }

    /// Sizes the bucket array for `count` entries in total without
    /// exceeding the maximum load factor.
    pub fn reserve(&mut self, count: usize) -> Result<(), TableError> {
        let buckets = (count as f64 / self.max_load_factor as f64).ceil() as usize;
        self.rehash(buckets)
    }

    /// Trims every bucket buffer to its used length. Bucket count and
    /// contents are unchanged.
    pub fn shrink_to_fit(&mut self) {
        log::trace!("shrinking {} buckets", self.buckets.len());
        self.buckets.iter_mut().for_each(Bucket::shrink_to_fit);
        self.epoch.invalidate();
    }

    /// Exchanges the whole state of two tables without copying entries.
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }
}

impl<'a, S, E, L, G> IntoIterator for &'a ArrayHash<S, E, L, G>
where
    S: BuildHasher,
    E: KeyEq,
    L: KeyLen,
    G: GrowthPolicy,
{
    type Item = EntryRef<'a>;
    type IntoIter = Iter<'a, L>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, S, E, L, G> IntoIterator for &'a mut ArrayHash<S, E, L, G>
where
    S: BuildHasher,
    E: KeyEq,
    L: KeyLen,
    G: GrowthPolicy,
{
    type Item = EntryMut<'a>;
    type IntoIter = IterMut<'a, L>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<S, E, L, G> fmt::Debug for ArrayHash<S, E, L, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayHash")
            .field("len", &self.len)
            .field("bucket_count", &self.buckets.len())
            .field("max_load_factor", &self.max_load_factor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::growth::PrimeGrowth;
    use std::collections::BTreeSet;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl core::hash::Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // every key lands in bucket 0
    }

    fn keys_of<S, E, L, G>(t: &ArrayHash<S, E, L, G>) -> BTreeSet<Vec<u8>>
    where
        S: BuildHasher,
        E: KeyEq,
        L: KeyLen,
        G: GrowthPolicy,
    {
        t.iter().map(|e| e.key().to_vec()).collect()
    }

    // Two buckets, never grows.
    #[derive(Clone, Copy, Debug, Default)]
    struct CappedGrowth;
    impl GrowthPolicy for CappedGrowth {
        fn bucket_count_for(&self, requested: usize) -> Result<usize, TableError> {
            if requested > 2 {
                return Err(TableError::BucketCountOverflow { requested });
            }
            Ok(2)
        }
        fn index_for(&self, hash: u64, bucket_count: usize) -> usize {
            (hash % bucket_count as u64) as usize
        }
        fn next_count(&self, current: usize) -> Result<usize, TableError> {
            Err(TableError::BucketCountOverflow { requested: current * 2 })
        }
        fn min_bucket_count(&self) -> usize {
            2
        }
        fn max_bucket_count(&self) -> usize {
            2
        }
    }

    /// Scenario: 16 buckets, load factor 1; insert, find, erase.
    #[test]
    fn insert_find_erase_scenario() {
        let config = TableConfig::default().bucket_count(16).max_load_factor(1.0);
        let mut t: ArrayHash = ArrayHash::with_config(config, Default::default(), BytewiseEq).unwrap();
        for k in ["a", "b", "c"] {
            assert!(t.insert(k.as_bytes()).unwrap().1);
        }
        assert_eq!(t.len(), 3);
        assert!(t.find(b"b").is_some());
        assert_eq!(t.erase(b"b"), 1);
        assert_eq!(t.len(), 2);
        assert!(t.find(b"b").is_none());
        assert_eq!(t.erase(b"b"), 0);
    }

    /// Invariant: re-inserting returns the existing cursor and `false`.
    #[test]
    fn duplicate_insert_returns_existing() {
        let mut t = ArrayHash::new();
        let (c1, new1) = t.insert(b"hello").unwrap();
        let (c2, new2) = t.insert(b"hello").unwrap();
        assert!(new1);
        assert!(!new2);
        assert_eq!(c1, c2);
        assert_eq!(t.len(), 1);
        // A non-rehashing insert leaves earlier cursors usable.
        assert_eq!(c1.key(&t), Some(&b"hello"[..]));
    }

    #[test]
    fn key_too_long_is_rejected_without_mutation() {
        let mut t: ArrayHash<DefaultHashBuilder, BytewiseEq, u8> = ArrayHash::with_hasher(Default::default());
        assert_eq!(t.max_key_size(), 254);
        let long = vec![b'x'; t.max_key_size() + 1];
        assert_eq!(
            t.insert(&long),
            Err(TableError::KeyTooLong { len: 255, max: 254 })
        );
        assert!(t.is_empty());
        assert!(t.find(&long).is_none());

        let longest = vec![b'x'; t.max_key_size()];
        assert!(t.insert(&longest).unwrap().1);
        assert_eq!(t.key_at(t.find(&longest).unwrap()), Some(&longest[..]));
    }

    #[test]
    fn capacity_exceeded_when_full() {
        let config = TableConfig::default().max_size(2);
        let mut t: ArrayHash = ArrayHash::with_config(config, Default::default(), BytewiseEq).unwrap();
        t.insert(b"a").unwrap();
        t.insert(b"b").unwrap();
        assert_eq!(t.insert(b"c"), Err(TableError::CapacityExceeded { max: 2 }));
        assert_eq!(t.len(), 2);
        assert!(!t.contains(b"c"));
    }

    #[test]
    fn value_size_is_enforced() {
        let config = TableConfig::default().value_size(4);
        let mut t: ArrayHash = ArrayHash::with_config(config, Default::default(), BytewiseEq).unwrap();
        assert_eq!(
            t.insert(b"k"),
            Err(TableError::ValueSizeMismatch { len: 0, expected: 4 })
        );
        let (c, _) = t.insert_with_value(b"k", &[1, 2, 3, 4]).unwrap();
        assert_eq!(t.value_at(c), Some(&[1, 2, 3, 4][..]));
        t.value_at_mut(c).unwrap().copy_from_slice(&[5, 6, 7, 8]);
        assert_eq!(c.value(&t), Some(&[5, 6, 7, 8][..]));

        // Existing keys keep their value.
        let (_, inserted) = t.insert_with_value(b"k", &[0, 0, 0, 0]).unwrap();
        assert!(!inserted);
        assert_eq!(t.find_mut(b"k").unwrap().value(), &[5, 6, 7, 8]);
    }

    #[test]
    fn embedded_zero_and_empty_keys_round_trip() {
        let mut t = ArrayHash::new();
        let keys: [&[u8]; 4] = [b"", b"\0", b"a\0b", b"a\0c"];
        for k in keys {
            assert!(t.insert(k).unwrap().1);
        }
        for k in keys {
            let c = t.find(k).unwrap();
            let e = t.entry_at(c).unwrap();
            assert_eq!(e.key(), k);
            assert_eq!(e.key_size(), k.len());
            let mut with_nul = k.to_vec();
            with_nul.push(0);
            assert_eq!(e.key_with_nul(), Some(&with_nul[..]));
        }
        assert!(t.entry_at(t.find(b"a\0b").unwrap()).unwrap().c_str().is_none());
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn no_terminator_when_disabled() {
        let config = TableConfig::default().store_terminator(false);
        let mut t: ArrayHash = ArrayHash::with_config(config, Default::default(), BytewiseEq).unwrap();
        let (c, _) = t.insert(b"abc").unwrap();
        let e = t.entry_at(c).unwrap();
        assert_eq!(e.key(), b"abc");
        assert!(e.key_with_nul().is_none());
        assert!(!t.stores_terminator());
    }

    /// Invariant: load factor stays bounded and growth rehashes.
    #[test]
    fn load_factor_bounded_through_growth() {
        let config = TableConfig::default().bucket_count(1).max_load_factor(1.0);
        let mut t: ArrayHash = ArrayHash::with_config(config, Default::default(), BytewiseEq).unwrap();
        for i in 0..1000 {
            t.insert(format!("key-{i}").as_bytes()).unwrap();
            assert!(t.load_factor() <= t.max_load_factor());
        }
        assert!(t.bucket_count() >= 1000);
        for i in 0..1000 {
            assert!(t.contains(format!("key-{i}").as_bytes()));
        }
    }

    #[test]
    fn rehash_preserves_content_and_respects_minimum() {
        let mut t = ArrayHash::new();
        for i in 0..200 {
            t.insert(format!("{i}").as_bytes()).unwrap();
        }
        let before = keys_of(&t);

        t.rehash(1024).unwrap();
        assert_eq!(t.bucket_count(), 1024);
        assert_eq!(keys_of(&t), before);

        // Asking for too few buckets still honours the load factor.
        t.rehash(0).unwrap();
        assert!(t.load_factor() <= t.max_load_factor());
        for i in 0..200 {
            assert!(t.contains(format!("{i}").as_bytes()));
        }
    }

    #[test]
    fn reserve_sizes_for_count() {
        let mut t = ArrayHash::new();
        t.set_max_load_factor(1.0);
        t.reserve(100).unwrap();
        assert!(t.bucket_count() >= 100);
        let before = t.bucket_count();
        for i in 0..100 {
            t.insert(format!("{i}").as_bytes()).unwrap();
        }
        assert_eq!(t.bucket_count(), before);
    }

    #[test]
    fn max_load_factor_is_clamped() {
        let mut t = ArrayHash::new();
        assert_eq!(t.max_load_factor(), 2.0);
        t.set_max_load_factor(0.0);
        assert_eq!(t.max_load_factor(), 0.1);
    }

    /// Invariant: an insert whose follow-up grow fails is rolled back and
    /// leaves the table as it was.
    #[test]
    fn failed_grow_rolls_back_insert() {
        let config = TableConfig::default().bucket_count(2).max_load_factor(1.0);
        let mut t: ArrayHash<DefaultHashBuilder, BytewiseEq, u16, CappedGrowth> =
            ArrayHash::with_config(config, Default::default(), BytewiseEq).unwrap();
        t.insert(b"a").unwrap();
        t.insert(b"b").unwrap();
        let before = keys_of(&t);
        let used: usize = t.buckets.iter().map(Bucket::used).sum();

        assert_eq!(
            t.insert(b"c"),
            Err(TableError::BucketCountOverflow { requested: 4 })
        );
        assert_eq!(t.len(), 2);
        assert!(!t.contains(b"c"));
        assert_eq!(t.iter().count(), t.len());
        assert_eq!(keys_of(&t), before);
        assert_eq!(t.buckets.iter().map(Bucket::used).sum::<usize>(), used);
        assert_eq!(t.bucket_count(), 2);

        // Existing keys still report as present without growing.
        assert_eq!(t.insert(b"a").map(|(_, new)| new), Ok(false));
    }

    #[test]
    fn collisions_resolve_by_key_bytes() {
        let mut t: ArrayHash<ConstBuildHasher> = ArrayHash::with_hasher(ConstBuildHasher);
        for k in ["a", "b", "ab", "ba", ""] {
            t.insert(k.as_bytes()).unwrap();
        }
        for k in ["a", "b", "ab", "ba", ""] {
            let c = t.find(k.as_bytes()).unwrap();
            assert_eq!(c.bucket(), 0);
            assert_eq!(c.key(&t), Some(k.as_bytes()));
        }
        assert!(t.find(b"c").is_none());
    }

    #[test]
    fn erase_at_returns_next_entry() {
        let mut t: ArrayHash<ConstBuildHasher> = ArrayHash::with_hasher(ConstBuildHasher);
        for k in ["one", "two", "three"] {
            t.insert(k.as_bytes()).unwrap();
        }
        let c = t.find(b"two").unwrap();
        let next = t.erase_at(c);
        assert_eq!(next.key(&t), Some(&b"three"[..]));
        let end = t.erase_at(next);
        assert_eq!(end, t.end());
        assert_eq!(keys_of(&t), BTreeSet::from([b"one".to_vec()]));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn erase_range_spans_buckets() {
        let mut t = ArrayHash::new();
        for i in 0..100 {
            t.insert(format!("k{i}").as_bytes()).unwrap();
        }
        // Erase everything but the first five and the last five entries.
        let order: Vec<Vec<u8>> = t.iter().map(|e| e.key().to_vec()).collect();
        let first = t.find(&order[5]).unwrap();
        let last = t.find(&order[95]).unwrap();
        let next = t.erase_range(first, last);
        assert_eq!(next.key(&t), Some(&order[95][..]));
        assert_eq!(t.len(), 10);
        let kept: Vec<Vec<u8>> = t.iter().map(|e| e.key().to_vec()).collect();
        let expected: Vec<Vec<u8>> = order[..5].iter().chain(&order[95..]).cloned().collect();
        assert_eq!(kept, expected);

        let (b, e) = (t.begin(), t.end());
        assert_eq!(t.erase_range(b, e), t.end());
        assert!(t.is_empty());
        assert_eq!(t.begin(), t.end());
    }

    #[test]
    fn erase_range_within_one_bucket() {
        let mut t: ArrayHash<ConstBuildHasher> = ArrayHash::with_hasher(ConstBuildHasher);
        for k in ["a", "bb", "ccc", "dddd", "e"] {
            t.insert(k.as_bytes()).unwrap();
        }
        let first = t.find(b"bb").unwrap();
        let last = t.find(b"dddd").unwrap();
        assert_eq!(first.bucket(), last.bucket());
        let next = t.erase_range(first, last);
        assert_eq!(next.key(&t), Some(&b"dddd"[..]));
        assert_eq!(next.offset(), first.offset());
        assert_eq!(t.len(), 3);
        let kept: Vec<Vec<u8>> = t.iter().map(|e| e.key().to_vec()).collect();
        assert_eq!(kept, [b"a".to_vec(), b"dddd".to_vec(), b"e".to_vec()]);
    }

    #[test]
    fn equal_range_and_count() {
        let mut t = ArrayHash::new();
        t.insert(b"x").unwrap();
        let (lo, hi) = t.equal_range(b"x");
        assert_eq!(lo.key(&t), Some(&b"x"[..]));
        assert_eq!(hi, t.advance(lo));
        assert_eq!(t.count(b"x"), 1);
        assert_eq!(t.equal_range(b"y"), (t.end(), t.end()));
        assert_eq!(t.count(b"y"), 0);
    }

    #[test]
    fn cursor_walk_matches_iter() {
        let mut t = ArrayHash::new();
        for i in 0..50 {
            t.insert(format!("w{i}").as_bytes()).unwrap();
        }
        let mut walked = Vec::new();
        let mut c = t.begin();
        while c != t.end() {
            walked.push(c.key(&t).unwrap().to_vec());
            c = t.advance(c);
        }
        let iterated: Vec<_> = t.iter().map(|e| e.key().to_vec()).collect();
        assert_eq!(walked, iterated);
        assert_eq!(t.iter().len(), 50);
        assert_eq!(t.end().key(&t), None);
    }

    #[test]
    fn clear_keeps_bucket_count() {
        let mut t = ArrayHash::new();
        for i in 0..100 {
            t.insert(format!("{i}").as_bytes()).unwrap();
        }
        let buckets = t.bucket_count();
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.bucket_count(), buckets);
        assert_eq!(t.iter().count(), 0);
        t.insert(b"again").unwrap();
        assert!(t.contains(b"again"));
    }

    #[test]
    fn shrink_to_fit_keeps_content() {
        let mut t = ArrayHash::new();
        for i in 0..64 {
            t.insert(format!("{i}").as_bytes()).unwrap();
        }
        for i in 0..32 {
            t.erase(format!("{i}").as_bytes());
        }
        let buckets = t.bucket_count();
        t.shrink_to_fit();
        assert_eq!(t.bucket_count(), buckets);
        assert!(t.buckets.iter().all(|b| b.capacity() == b.used()));
        for i in 32..64 {
            assert!(t.contains(format!("{i}").as_bytes()));
        }
    }

    #[test]
    fn swap_exchanges_contents() {
        let mut a = ArrayHash::new();
        let mut b = ArrayHash::new();
        a.insert(b"a1").unwrap();
        a.insert(b"a2").unwrap();
        b.insert(b"b1").unwrap();
        let (ka, kb) = (keys_of(&a), keys_of(&b));
        a.swap(&mut b);
        assert_eq!(keys_of(&a), kb);
        assert_eq!(keys_of(&b), ka);
    }

    #[test]
    fn iter_mut_updates_values() {
        let config = TableConfig::default().value_size(1);
        let mut t: ArrayHash = ArrayHash::with_config(config, Default::default(), BytewiseEq).unwrap();
        for (i, k) in ["p", "q", "r"].iter().enumerate() {
            t.insert_with_value(k.as_bytes(), &[i as u8]).unwrap();
        }
        for mut e in &mut t {
            e.value_mut()[0] += 10;
        }
        let mut values: Vec<u8> = t.iter().map(|e| e.value()[0]).collect();
        values.sort_unstable();
        assert_eq!(values, vec![10, 11, 12]);
    }

    #[test]
    fn prime_policy_table() {
        let config = TableConfig::default().bucket_count(10).max_load_factor(1.0);
        let mut t: ArrayHash<DefaultHashBuilder, BytewiseEq, u16, PrimeGrowth> =
            ArrayHash::with_config(config, Default::default(), BytewiseEq).unwrap();
        assert_eq!(t.bucket_count(), 17);
        for i in 0..100 {
            t.insert(format!("p{i}").as_bytes()).unwrap();
        }
        assert_eq!(t.bucket_count(), 131);
        for i in 0..100 {
            assert!(t.contains(format!("p{i}").as_bytes()));
        }
    }

    #[test]
    fn clone_is_independent() {
        let mut a = ArrayHash::new();
        a.insert(b"shared").unwrap();
        let mut b = a.clone();
        b.insert(b"only-b").unwrap();
        assert!(!a.contains(b"only-b"));
        assert!(b.contains(b"shared"));
    }

    /// Invariant (debug-only): cursors are rejected after an invalidating
    /// operation or when used with another table.
    #[cfg(debug_assertions)]
    #[test]
    fn stale_and_foreign_cursors_panic_in_debug() {
        let mut t = ArrayHash::new();
        let (c, _) = t.insert(b"k").unwrap();
        t.shrink_to_fit();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = t.key_at(c);
        }));
        assert!(res.is_err(), "expected stale cursor to panic in debug builds");

        let other = ArrayHash::new();
        let fresh = t.find(b"k").unwrap();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = other.key_at(fresh);
        }));
        assert!(res.is_err(), "expected foreign cursor to panic in debug builds");
    }
}
