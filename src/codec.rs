//! Entry codec: the packed byte layout of one key (and optional value).
//!
//! Committed entry format, in order:
//!
//! ```text
//! [key length: L::WIDTH bytes, little-endian]
//! [key bytes: key length bytes]
//! [0x00 terminator: 1 byte, only when terminator storage is enabled]
//! [value bytes: value_size bytes, fixed for the whole table]
//! ```
//!
//! The terminator is never counted in the key length. Every span of an
//! entry is computed from its start offset and the decoded key length, so
//! decoding is O(1).

use core::ops::Range;

mod sealed {
    pub trait Sealed {}
}

/// Unsigned integer width used for the per-entry key-length prefix.
///
/// The largest representable value is reserved, so the longest storable
/// key is `MAX - 1` bytes.
pub trait KeyLen: sealed::Sealed + Copy + 'static {
    /// Prefix width in bytes.
    const WIDTH: usize;
    /// Largest value representable by the prefix.
    const MAX: usize;

    fn write(len: usize, out: &mut Vec<u8>);
    fn read(bytes: &[u8]) -> usize;
}

macro_rules! impl_key_len {
    ($($t:ty),*) => {$(
        impl sealed::Sealed for $t {}

        impl KeyLen for $t {
            const WIDTH: usize = core::mem::size_of::<$t>();
            const MAX: usize = <$t>::MAX as usize;

            #[inline]
            fn write(len: usize, out: &mut Vec<u8>) {
                debug_assert!(len < <Self as KeyLen>::MAX);
                out.extend_from_slice(&(len as $t).to_le_bytes());
            }

            #[inline]
            fn read(bytes: &[u8]) -> usize {
                let mut raw = [0u8; core::mem::size_of::<$t>()];
                raw.copy_from_slice(&bytes[..Self::WIDTH]);
                <$t>::from_le_bytes(raw) as usize
            }
        }
    )*};
}

impl_key_len!(u8, u16, u32);

/// Per-table entry shape: terminator storage and fixed value size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EntryLayout<L> {
    store_terminator: bool,
    value_size: usize,
    _len: core::marker::PhantomData<L>,
}

impl<L: KeyLen> EntryLayout<L> {
    pub(crate) fn new(store_terminator: bool, value_size: usize) -> Self {
        Self {
            store_terminator,
            value_size,
            _len: core::marker::PhantomData,
        }
    }

    #[inline]
    pub(crate) fn store_terminator(&self) -> bool {
        self.store_terminator
    }

    #[inline]
    pub(crate) fn value_size(&self) -> usize {
        self.value_size
    }

    #[inline]
    pub(crate) const fn max_key_size() -> usize {
        L::MAX - 1
    }

    #[inline]
    fn terminator_len(&self) -> usize {
        self.store_terminator as usize
    }

    /// Total encoded length of an entry whose key is `key_len` bytes.
    #[inline]
    pub(crate) fn entry_len(&self, key_len: usize) -> usize {
        L::WIDTH + key_len + self.terminator_len() + self.value_size
    }

    /// Key length decoded from the entry starting at `start`.
    #[inline]
    pub(crate) fn key_len_at(&self, buf: &[u8], start: usize) -> usize {
        L::read(&buf[start..])
    }

    #[inline]
    pub(crate) fn key_span(&self, start: usize, key_len: usize) -> Range<usize> {
        let from = start + L::WIDTH;
        from..from + key_len
    }

    /// Key bytes followed by the terminator; `None` without terminator
    /// storage.
    #[inline]
    pub(crate) fn terminated_key_span(&self, start: usize, key_len: usize) -> Option<Range<usize>> {
        self.store_terminator.then(|| {
            let from = start + L::WIDTH;
            from..from + key_len + 1
        })
    }

    #[inline]
    pub(crate) fn value_span(&self, start: usize, key_len: usize) -> Range<usize> {
        let from = start + L::WIDTH + key_len + self.terminator_len();
        from..from + self.value_size
    }

    /// Appends one encoded entry to `out`. The caller has already checked
    /// the key and value sizes and reserved `entry_len(key.len())` bytes.
    pub(crate) fn encode_into(&self, out: &mut Vec<u8>, key: &[u8], value: &[u8]) {
        debug_assert!(key.len() <= Self::max_key_size());
        debug_assert_eq!(value.len(), self.value_size);
        L::write(key.len(), out);
        out.extend_from_slice(key);
        if self.store_terminator {
            out.push(0);
        }
        out.extend_from_slice(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_len_widths_and_limits() {
        assert_eq!(<u8 as KeyLen>::WIDTH, 1);
        assert_eq!(<u16 as KeyLen>::WIDTH, 2);
        assert_eq!(<u32 as KeyLen>::WIDTH, 4);
        assert_eq!(EntryLayout::<u8>::max_key_size(), 254);
        assert_eq!(EntryLayout::<u16>::max_key_size(), 65_534);
    }

    #[test]
    fn prefix_is_little_endian() {
        let mut out = Vec::new();
        <u16 as KeyLen>::write(0x0102, &mut out);
        assert_eq!(out, [0x02, 0x01]);
        assert_eq!(<u16 as KeyLen>::read(&out), 0x0102);
    }

    #[test]
    fn longest_prefix_fits_every_width() {
        let mut out = Vec::new();
        <u8 as KeyLen>::write(EntryLayout::<u8>::max_key_size(), &mut out);
        assert_eq!(out, [0xfe]);
        assert_eq!(<u8 as KeyLen>::read(&out), 254);

        out.clear();
        <u32 as KeyLen>::write(0x0100_0000, &mut out);
        assert_eq!(out, [0, 0, 0, 1]);
        assert_eq!(<u32 as KeyLen>::read(&out), 0x0100_0000);
    }

    #[test]
    fn encode_with_terminator_and_value() {
        let layout = EntryLayout::<u16>::new(true, 3);
        let mut out = Vec::new();
        layout.encode_into(&mut out, b"abc", &[7, 8, 9]);
        assert_eq!(out, [3, 0, b'a', b'b', b'c', 0, 7, 8, 9]);
        assert_eq!(out.len(), layout.entry_len(3));

        let klen = layout.key_len_at(&out, 0);
        assert_eq!(klen, 3);
        assert_eq!(&out[layout.key_span(0, klen)], b"abc");
        assert_eq!(&out[layout.terminated_key_span(0, klen).unwrap()], b"abc\0");
        assert_eq!(&out[layout.value_span(0, klen)], &[7, 8, 9]);
    }

    #[test]
    fn encode_without_terminator() {
        let layout = EntryLayout::<u8>::new(false, 0);
        let mut out = Vec::new();
        layout.encode_into(&mut out, b"xy", &[]);
        layout.encode_into(&mut out, b"", &[]);
        assert_eq!(out, [2, b'x', b'y', 0]);
        assert!(layout.terminated_key_span(0, 2).is_none());

        // Second entry starts where the first ends.
        let second = layout.entry_len(2);
        assert_eq!(layout.key_len_at(&out, second), 0);
        assert!(layout.value_span(second, 0).is_empty());
    }
}
