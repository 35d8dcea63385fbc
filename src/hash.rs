//! Hash and equality strategies over borrowed key bytes.
//!
//! Hashing goes through the standard [`BuildHasher`] seam so any hasher
//! family can be plugged in; equality is a separate [`KeyEq`] strategy. The
//! two must agree: keys that compare equal have to hash equally.

use core::hash::BuildHasher;

/// Default hasher family for tables in this crate.
pub type DefaultHashBuilder = hashbrown::hash_map::DefaultHashBuilder;

/// Equality over stored and probed key bytes.
///
/// The engine only calls `key_eq` after checking that both keys have the
/// same length.
pub trait KeyEq {
    fn key_eq(&self, stored: &[u8], probe: &[u8]) -> bool;
}

/// Byte-for-byte key equality.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BytewiseEq;

impl KeyEq for BytewiseEq {
    #[inline]
    fn key_eq(&self, stored: &[u8], probe: &[u8]) -> bool {
        stored == probe
    }
}

#[inline]
pub(crate) fn hash_key<S: BuildHasher>(hasher: &S, key: &[u8]) -> u64 {
    hasher.hash_one(key)
}
