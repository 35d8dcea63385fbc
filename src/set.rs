//! ArraySet: string set front door over the packed engine.
//!
//! Accepts any `AsRef<[u8]>` key (`&str`, `String`, `&[u8]`, `Vec<u8>`),
//! reduces it to bytes and forwards to [`ArrayHash`].

use crate::array_hash::ArrayHash;
use crate::codec::KeyLen;
use crate::config::TableConfig;
use crate::error::TableError;
use crate::growth::{GrowthPolicy, PowerOfTwoGrowth};
use crate::hash::{BytewiseEq, DefaultHashBuilder, KeyEq};
use crate::iter::{Cursor, Iter};
use core::fmt;
use core::hash::BuildHasher;

/// Cache-conscious hash set of byte-string keys.
///
/// ```
/// use array_hash::ArraySet;
///
/// let mut set = ArraySet::new();
/// assert!(set.insert("apple")?);
/// assert!(!set.insert(String::from("apple"))?);
/// assert!(set.contains(b"apple"));
/// assert_eq!(set.len(), 1);
/// # Ok::<(), array_hash::TableError>(())
/// ```
#[derive(Clone)]
pub struct ArraySet<S = DefaultHashBuilder, E = BytewiseEq, L = u16, G = PowerOfTwoGrowth> {
    table: ArrayHash<S, E, L, G>,
}

impl ArraySet {
    pub fn new() -> Self {
        Self {
            table: ArrayHash::new(),
        }
    }

    pub fn with_bucket_count(bucket_count: usize) -> Result<Self, TableError> {
        Ok(Self {
            table: ArrayHash::with_bucket_count(bucket_count)?,
        })
    }

    /// Builds a set holding `keys`; duplicates collapse.
    ///
    /// ```
    /// use array_hash::ArraySet;
    ///
    /// let set = ArraySet::from_keys(["a", "b", "a"])?;
    /// assert_eq!(set.len(), 2);
    /// # Ok::<(), array_hash::TableError>(())
    /// ```
    pub fn from_keys<I>(keys: I) -> Result<Self, TableError>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let mut set = Self::new();
        set.insert_all(keys)?;
        Ok(set)
    }
}

impl Default for ArraySet {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, E, L, G> ArraySet<S, E, L, G>
where
    S: BuildHasher,
    E: KeyEq,
    L: KeyLen,
    G: GrowthPolicy,
{
    pub fn with_hasher(hasher: S) -> Self
    where
        E: Default,
    {
        Self {
            table: ArrayHash::with_hasher(hasher),
        }
    }

    /// `config.value_size` is ignored; sets carry no values.
    pub fn with_config(config: TableConfig, hasher: S, key_eq: E) -> Result<Self, TableError> {
        Ok(Self {
            table: ArrayHash::with_config(config.value_size(0), hasher, key_eq)?,
        })
    }

    /// The underlying engine, for cursor-level access.
    pub fn as_table(&self) -> &ArrayHash<S, E, L, G> {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.table.max_size()
    }

    pub fn max_key_size(&self) -> usize {
        self.table.max_key_size()
    }

    /// Returns `true` if the key was not present.
    pub fn insert<K: AsRef<[u8]>>(&mut self, key: K) -> Result<bool, TableError> {
        self.table.insert(key.as_ref()).map(|(_, inserted)| inserted)
    }

    /// Inserts every key, reserving up front when the iterator knows its
    /// exact length and the keys would overflow the current bucket count.
    /// Returns how many keys were new.
    ///
    /// Stops at the first error; keys inserted before it stay inserted.
    pub fn insert_all<I>(&mut self, keys: I) -> Result<usize, TableError>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let keys = keys.into_iter();
        if let (lower, Some(upper)) = keys.size_hint() {
            let wanted = self.len().saturating_add(lower);
            let fits = self.bucket_count() as f64 * self.max_load_factor() as f64;
            if lower == upper && wanted as f64 > fits {
                self.table.reserve(wanted)?;
            }
        }
        let mut added = 0;
        for key in keys {
            added += self.insert(key)? as usize;
        }
        Ok(added)
    }

    /// Replaces the contents with `keys`. Bucket count and settings are
    /// kept. On error the set holds the keys inserted before the failure.
    pub fn assign<I>(&mut self, keys: I) -> Result<(), TableError>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        self.clear();
        self.insert_all(keys).map(|_| ())
    }

    pub fn contains<K: AsRef<[u8]>>(&self, key: K) -> bool {
        self.table.contains(key.as_ref())
    }

    pub fn count<K: AsRef<[u8]>>(&self, key: K) -> usize {
        self.table.count(key.as_ref())
    }

    pub fn find<K: AsRef<[u8]>>(&self, key: K) -> Option<Cursor> {
        self.table.find(key.as_ref())
    }

    pub fn equal_range<K: AsRef<[u8]>>(&self, key: K) -> (Cursor, Cursor) {
        self.table.equal_range(key.as_ref())
    }

    /// Returns `true` if the key was present.
    pub fn remove<K: AsRef<[u8]>>(&mut self, key: K) -> bool {
        self.table.erase(key.as_ref()) == 1
    }

    pub fn erase_at(&mut self, cursor: Cursor) -> Cursor {
        self.table.erase_at(cursor)
    }

    pub fn erase_range(&mut self, first: Cursor, last: Cursor) -> Cursor {
        self.table.erase_range(first, last)
    }

    pub fn iter(&self) -> Keys<'_, L> {
        Keys {
            inner: self.table.iter(),
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    pub fn max_bucket_count(&self) -> usize {
        self.table.max_bucket_count()
    }

    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }

    pub fn max_load_factor(&self) -> f32 {
        self.table.max_load_factor()
    }

    pub fn set_max_load_factor(&mut self, ml: f32) {
        self.table.set_max_load_factor(ml)
    }

    pub fn rehash(&mut self, bucket_count: usize) -> Result<(), TableError> {
        self.table.rehash(bucket_count)
    }

    pub fn reserve(&mut self, count: usize) -> Result<(), TableError> {
        self.table.reserve(count)
    }

    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit()
    }

    pub fn clear(&mut self) {
        self.table.clear()
    }

    pub fn swap(&mut self, other: &mut Self) {
        self.table.swap(&mut other.table)
    }

    pub fn hash_function(&self) -> &S {
        self.table.hash_function()
    }

    pub fn key_eq(&self) -> &E {
        self.table.key_eq()
    }
}

/// Iterator over the keys of an [`ArraySet`].
pub struct Keys<'a, L> {
    inner: Iter<'a, L>,
}

impl<'a, L: KeyLen> Iterator for Keys<'a, L> {
    type Item = &'a [u8];

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| e.key())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, L: KeyLen> ExactSizeIterator for Keys<'a, L> {}

impl<'a, S, E, L, G> IntoIterator for &'a ArraySet<S, E, L, G>
where
    S: BuildHasher,
    E: KeyEq,
    L: KeyLen,
    G: GrowthPolicy,
{
    type Item = &'a [u8];
    type IntoIter = Keys<'a, L>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// Same size, and every key of one is found in the other.
impl<S, E, L, G> PartialEq for ArraySet<S, E, L, G>
where
    S: BuildHasher,
    E: KeyEq,
    L: KeyLen,
    G: GrowthPolicy,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|k| other.contains(k))
    }
}

impl<S, E, L, G> Eq for ArraySet<S, E, L, G>
where
    S: BuildHasher,
    E: KeyEq,
    L: KeyLen,
    G: GrowthPolicy,
{
}

impl<S, E, L, G> fmt::Debug for ArraySet<S, E, L, G>
where
    S: BuildHasher,
    E: KeyEq,
    L: KeyLen,
    G: GrowthPolicy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.iter().map(String::from_utf8_lossy))
            .finish()
    }
}
