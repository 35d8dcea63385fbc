//! Iterator protocol over packed buckets.
//!
//! A [`Cursor`] is a `(bucket, offset)` position that always names the
//! start of a live entry, or the end sentinel (`bucket == bucket_count`).
//! Advancing decodes the current entry header, steps over it, and skips
//! empty buckets. [`Iter`] and [`IterMut`] wrap the same walk behind the
//! standard `Iterator` trait and hand out views borrowed from the table.

use crate::array_hash::ArrayHash;
use crate::bucket::Bucket;
use crate::codec::{EntryLayout, KeyLen};
use crate::growth::GrowthPolicy;
use crate::hash::KeyEq;
use crate::invalidation::Stamp;
use core::ffi::CStr;
use core::hash::BuildHasher;

/// Position of an entry in an [`ArrayHash`], or its end sentinel.
///
/// Cursors do not borrow the table. Any operation documented as
/// invalidating cursors leaves previously obtained ones stale; debug builds
/// panic when a stale or foreign cursor is used.
#[derive(Clone, Copy, Debug)]
pub struct Cursor {
    pub(crate) bucket: usize,
    pub(crate) offset: usize,
    pub(crate) stamp: Stamp,
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        self.bucket == other.bucket && self.offset == other.offset
    }
}

impl Eq for Cursor {}

impl Cursor {
    pub(crate) fn new(bucket: usize, offset: usize, stamp: Stamp) -> Self {
        Self {
            bucket,
            offset,
            stamp,
        }
    }

    pub fn bucket(&self) -> usize {
        self.bucket
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Key bytes at this position; `None` for the end sentinel.
    pub fn key<'a, S, E, L, G>(&self, table: &'a ArrayHash<S, E, L, G>) -> Option<&'a [u8]>
    where
        S: BuildHasher,
        E: KeyEq,
        L: KeyLen,
        G: GrowthPolicy,
    {
        table.key_at(*self)
    }

    /// Value bytes at this position; `None` for the end sentinel.
    pub fn value<'a, S, E, L, G>(&self, table: &'a ArrayHash<S, E, L, G>) -> Option<&'a [u8]>
    where
        S: BuildHasher,
        E: KeyEq,
        L: KeyLen,
        G: GrowthPolicy,
    {
        table.value_at(*self)
    }
}

/// First position at or after `(bucket, offset)` that holds an entry.
pub(crate) fn skip_empty(buckets: &[Bucket], mut bucket: usize, mut offset: usize) -> (usize, usize) {
    while bucket < buckets.len() && offset >= buckets[bucket].used() {
        bucket += 1;
        offset = 0;
    }
    if bucket >= buckets.len() {
        return (buckets.len(), 0);
    }
    (bucket, offset)
}

/// Position of the entry following the one at `(bucket, offset)`.
pub(crate) fn step<L: KeyLen>(
    buckets: &[Bucket],
    layout: &EntryLayout<L>,
    bucket: usize,
    offset: usize,
) -> (usize, usize) {
    let bytes = buckets[bucket].bytes();
    let next = offset + layout.entry_len(layout.key_len_at(bytes, offset));
    skip_empty(buckets, bucket, next)
}

/// Borrowed view of one stored entry.
#[derive(Clone, Copy, Debug)]
pub struct EntryRef<'a> {
    key: &'a [u8],
    terminated: Option<&'a [u8]>,
    value: &'a [u8],
    cursor: Cursor,
}

impl<'a> EntryRef<'a> {
    pub(crate) fn decode<L: KeyLen>(bytes: &'a [u8], layout: &EntryLayout<L>, cursor: Cursor) -> Self {
        let start = cursor.offset;
        let key_len = layout.key_len_at(bytes, start);
        Self {
            key: &bytes[layout.key_span(start, key_len)],
            terminated: layout
                .terminated_key_span(start, key_len)
                .map(|r| &bytes[r]),
            value: &bytes[layout.value_span(start, key_len)],
            cursor,
        }
    }

    pub fn key(&self) -> &'a [u8] {
        self.key
    }

    pub fn key_size(&self) -> usize {
        self.key.len()
    }

    /// Key bytes followed by the stored `0x00` terminator, when the table
    /// stores terminators.
    pub fn key_with_nul(&self) -> Option<&'a [u8]> {
        self.terminated
    }

    /// The key as a C string, when a terminator is stored and the key has
    /// no interior zero byte.
    pub fn c_str(&self) -> Option<&'a CStr> {
        self.terminated
            .and_then(|t| CStr::from_bytes_with_nul(t).ok())
    }

    /// Fixed-size value bytes; empty for tables without a value region.
    pub fn value(&self) -> &'a [u8] {
        self.value
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }
}

/// View of one stored entry with mutable value bytes. Keys stay immutable.
#[derive(Debug)]
pub struct EntryMut<'a> {
    key: &'a [u8],
    terminated: Option<&'a [u8]>,
    value: &'a mut [u8],
    cursor: Cursor,
}

impl<'a> EntryMut<'a> {
    /// `entry` must span exactly one encoded entry.
    pub(crate) fn from_entry<L: KeyLen>(
        entry: &'a mut [u8],
        layout: &EntryLayout<L>,
        cursor: Cursor,
    ) -> Self {
        let key_len = layout.key_len_at(entry, 0);
        let value_start = layout.value_span(0, key_len).start;
        let (head, value) = entry.split_at_mut(value_start);
        let head: &'a [u8] = head;
        debug_assert_eq!(value.len(), layout.value_size());
        Self {
            key: &head[layout.key_span(0, key_len)],
            terminated: layout.terminated_key_span(0, key_len).map(|r| &head[r]),
            value,
            cursor,
        }
    }

    pub fn key(&self) -> &'a [u8] {
        self.key
    }

    pub fn key_size(&self) -> usize {
        self.key.len()
    }

    pub fn key_with_nul(&self) -> Option<&'a [u8]> {
        self.terminated
    }

    pub fn value(&self) -> &[u8] {
        &*self.value
    }

    pub fn value_mut(&mut self) -> &mut [u8] {
        &mut *self.value
    }

    pub fn into_value_mut(self) -> &'a mut [u8] {
        self.value
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }
}

/// Iterator over entries in bucket order, then insertion order.
pub struct Iter<'a, L> {
    buckets: &'a [Bucket],
    layout: EntryLayout<L>,
    bucket: usize,
    offset: usize,
    remaining: usize,
    stamp: Stamp,
}

impl<'a, L: KeyLen> Iter<'a, L> {
    pub(crate) fn new(buckets: &'a [Bucket], layout: EntryLayout<L>, len: usize, stamp: Stamp) -> Self {
        let (bucket, offset) = skip_empty(buckets, 0, 0);
        Self {
            buckets,
            layout,
            bucket,
            offset,
            remaining: len,
            stamp,
        }
    }
}

impl<'a, L: KeyLen> Iterator for Iter<'a, L> {
    type Item = EntryRef<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let bucket = self.buckets.get(self.bucket)?;
        let cursor = Cursor::new(self.bucket, self.offset, self.stamp);
        let entry = EntryRef::decode(bucket.bytes(), &self.layout, cursor);
        (self.bucket, self.offset) = step(self.buckets, &self.layout, self.bucket, self.offset);
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, L: KeyLen> ExactSizeIterator for Iter<'a, L> {}

impl<'a, L: KeyLen> core::iter::FusedIterator for Iter<'a, L> {}

/// Iterator yielding mutable value views.
pub struct IterMut<'a, L> {
    buckets: core::slice::IterMut<'a, Bucket>,
    rest: &'a mut [u8],
    layout: EntryLayout<L>,
    // Index of the bucket `rest` belongs to, plus one.
    next_bucket: usize,
    offset: usize,
    remaining: usize,
    stamp: Stamp,
}

impl<'a, L: KeyLen> IterMut<'a, L> {
    pub(crate) fn new(
        buckets: &'a mut [Bucket],
        layout: EntryLayout<L>,
        len: usize,
        stamp: Stamp,
    ) -> Self {
        Self {
            buckets: buckets.iter_mut(),
            rest: Default::default(),
            layout,
            next_bucket: 0,
            offset: 0,
            remaining: len,
            stamp,
        }
    }
}

impl<'a, L: KeyLen> Iterator for IterMut<'a, L> {
    type Item = EntryMut<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.rest.is_empty() {
            self.rest = self.buckets.next()?.bytes_mut();
            self.next_bucket += 1;
            self.offset = 0;
        }
        let total = self.layout.entry_len(self.layout.key_len_at(self.rest, 0));
        let (entry, tail) = core::mem::take(&mut self.rest).split_at_mut(total);
        self.rest = tail;
        let cursor = Cursor::new(self.next_bucket - 1, self.offset, self.stamp);
        self.offset += total;
        self.remaining -= 1;
        Some(EntryMut::from_entry(entry, &self.layout, cursor))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, L: KeyLen> ExactSizeIterator for IterMut<'a, L> {}

impl<'a, L: KeyLen> core::iter::FusedIterator for IterMut<'a, L> {}
