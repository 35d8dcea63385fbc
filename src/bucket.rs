//! Bucket store: one growable byte buffer per bucket.
//!
//! A bucket's `Vec` length is its used length and its capacity is the
//! allocated capacity. Entries are packed back to back in insertion order;
//! the buffer never holds a partial entry.

use crate::codec::{EntryLayout, KeyLen};
use crate::error::TableError;
use crate::hash::KeyEq;
use core::ops::Range;

#[derive(Clone, Debug, Default)]
pub(crate) struct Bucket {
    buf: Vec<u8>,
}

impl Bucket {
    #[inline]
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    #[inline]
    pub(crate) fn used(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Offset of the entry whose key equals `key`, scanning in insertion
    /// order. Lengths are compared before bytes.
    pub(crate) fn find<L, E>(&self, layout: &EntryLayout<L>, key: &[u8], eq: &E) -> Option<usize>
    where
        L: KeyLen,
        E: KeyEq,
    {
        let buf = &self.buf[..];
        let mut off = 0;
        while off < buf.len() {
            let key_len = layout.key_len_at(buf, off);
            if key_len == key.len() && eq.key_eq(&buf[layout.key_span(off, key_len)], key) {
                return Some(off);
            }
            off += layout.entry_len(key_len);
        }
        None
    }

    /// Makes room for `additional` bytes, at least doubling the capacity
    /// when it has to grow. On failure the bucket is untouched.
    fn reserve(&mut self, additional: usize) -> Result<(), TableError> {
        let used = self.buf.len();
        if self.buf.capacity() - used >= additional {
            return Ok(());
        }
        let target = used
            .saturating_add(additional)
            .max(self.buf.capacity().saturating_mul(2));
        self.buf.try_reserve_exact(target - used)?;
        Ok(())
    }

    /// Encodes a new entry at the end of the bucket.
    pub(crate) fn append_entry<L: KeyLen>(
        &mut self,
        layout: &EntryLayout<L>,
        key: &[u8],
        value: &[u8],
    ) -> Result<usize, TableError> {
        self.reserve(layout.entry_len(key.len()))?;
        let start = self.buf.len();
        layout.encode_into(&mut self.buf, key, value);
        Ok(start)
    }

    /// Appends an already-encoded entry verbatim.
    pub(crate) fn append_raw(&mut self, entry: &[u8]) -> Result<(), TableError> {
        self.reserve(entry.len())?;
        self.buf.extend_from_slice(entry);
        Ok(())
    }

    /// Drops every byte from `len` on; used to roll back an append.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }

    /// Removes `range` by shifting the tail left. Capacity is kept.
    pub(crate) fn remove_range(&mut self, range: Range<usize>) {
        self.buf.drain(range);
    }

    /// Releases the buffer entirely.
    pub(crate) fn release(&mut self) {
        self.buf = Vec::new();
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.buf.shrink_to_fit();
    }

    /// Start offsets and key lengths of every entry, in order.
    pub(crate) fn entries<'a, L: KeyLen>(
        &'a self,
        layout: &'a EntryLayout<L>,
    ) -> impl Iterator<Item = (usize, usize)> + 'a {
        let buf = &self.buf[..];
        let mut off = 0;
        core::iter::from_fn(move || {
            if off >= buf.len() {
                return None;
            }
            let start = off;
            let key_len = layout.key_len_at(buf, start);
            off += layout.entry_len(key_len);
            Some((start, key_len))
        })
    }

    /// Number of entries packed in `range`, which must cover whole entries.
    pub(crate) fn count_entries<L: KeyLen>(&self, layout: &EntryLayout<L>, range: Range<usize>) -> usize {
        let mut off = range.start;
        let mut n = 0;
        while off < range.end {
            off += layout.entry_len(layout.key_len_at(&self.buf, off));
            n += 1;
        }
        debug_assert_eq!(off, range.end, "range splits an entry");
        n
    }
}
