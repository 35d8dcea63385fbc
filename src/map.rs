//! ArrayMap: byte-string keys mapped to arbitrary values.
//!
//! The packed table only stores fixed-size value bytes, so each entry's
//! value region holds an 8-byte `slotmap` key and the values themselves
//! live in a `SlotMap`. Rehashing moves entry bytes around; values stay
//! where they are and slot keys remain valid.

use crate::array_hash::ArrayHash;
use crate::codec::KeyLen;
use crate::config::TableConfig;
use crate::error::TableError;
use crate::growth::{GrowthPolicy, PowerOfTwoGrowth};
use crate::hash::{BytewiseEq, DefaultHashBuilder, KeyEq};
use crate::iter::Iter;
use core::fmt;
use core::hash::BuildHasher;
use slotmap::{DefaultKey, Key, KeyData, SlotMap};

const SLOT_BYTES: usize = core::mem::size_of::<u64>();

fn encode_slot(slot: DefaultKey) -> [u8; SLOT_BYTES] {
    slot.data().as_ffi().to_le_bytes()
}

fn decode_slot(bytes: &[u8]) -> DefaultKey {
    let mut raw = [0u8; SLOT_BYTES];
    raw.copy_from_slice(bytes);
    DefaultKey::from(KeyData::from_ffi(u64::from_le_bytes(raw)))
}

/// Hash map from byte-string keys to values of type `V`.
///
/// ```
/// use array_hash::ArrayMap;
///
/// let mut ages = ArrayMap::new();
/// ages.insert("ada", 36)?;
/// assert_eq!(ages.insert_or_assign("ada", 37)?, Some(36));
/// assert_eq!(ages.get("ada"), Some(&37));
/// # Ok::<(), array_hash::TableError>(())
/// ```
#[derive(Clone)]
pub struct ArrayMap<V, S = DefaultHashBuilder, E = BytewiseEq, L = u16, G = PowerOfTwoGrowth> {
    table: ArrayHash<S, E, L, G>,
    slots: SlotMap<DefaultKey, V>,
}

impl<V> ArrayMap<V> {
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<V> Default for ArrayMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, S, E, L, G> ArrayMap<V, S, E, L, G>
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
        let config = TableConfig::default().value_size(SLOT_BYTES);
        Self {
            table: ArrayHash::with_layout(config, hasher, E::default()),
            slots: SlotMap::new(),
        }
    }

    /// `config.value_size` is overridden with the slot key width.
    pub fn with_config(config: TableConfig, hasher: S, key_eq: E) -> Result<Self, TableError> {
        Ok(Self {
            table: ArrayHash::with_config(config.value_size(SLOT_BYTES), hasher, key_eq)?,
            slots: SlotMap::new(),
        })
    }

    fn slot_of(&self, key: &[u8]) -> Option<DefaultKey> {
        let c = self.table.find(key)?;
        self.table.value_at(c).map(decode_slot)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Inserts `value` under `key` unless the key is already present, in
    /// which case `value` is dropped and the stored one kept.
    ///
    /// Returns whether the key was new.
    pub fn insert<K: AsRef<[u8]>>(&mut self, key: K, value: V) -> Result<bool, TableError> {
        let key = key.as_ref();
        if self.table.contains(key) {
            return Ok(false);
        }
        self.insert_new(key, value)?;
        Ok(true)
    }

    /// Inserts or overwrites; returns the previous value if there was one.
    pub fn insert_or_assign<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        value: V,
    ) -> Result<Option<V>, TableError> {
        let key = key.as_ref();
        if let Some(slot) = self.slot_of(key) {
            return Ok(Some(core::mem::replace(&mut self.slots[slot], value)));
        }
        self.insert_new(key, value)?;
        Ok(None)
    }

    fn insert_new(&mut self, key: &[u8], value: V) -> Result<(), TableError> {
        let slot = self.slots.insert(value);
        if let Err(e) = self.table.insert_with_value(key, &encode_slot(slot)) {
            self.slots.remove(slot);
            return Err(e);
        }
        Ok(())
    }

    pub fn get<K: AsRef<[u8]>>(&self, key: K) -> Option<&V> {
        let slot = self.slot_of(key.as_ref())?;
        self.slots.get(slot)
    }

    pub fn get_mut<K: AsRef<[u8]>>(&mut self, key: K) -> Option<&mut V> {
        let slot = self.slot_of(key.as_ref())?;
        self.slots.get_mut(slot)
    }

    pub fn contains_key<K: AsRef<[u8]>>(&self, key: K) -> bool {
        self.table.contains(key.as_ref())
    }

    pub fn remove<K: AsRef<[u8]>>(&mut self, key: K) -> Option<V> {
        let key = key.as_ref();
        let slot = self.slot_of(key)?;
        self.table.erase(key);
        self.slots.remove(slot)
    }

    pub fn iter(&self) -> MapIter<'_, V, L> {
        MapIter {
            entries: self.table.iter(),
            slots: &self.slots,
        }
    }

    /// Values in unspecified order, unrelated to [`iter`](Self::iter) order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.slots.values_mut()
    }

    pub fn clear(&mut self) {
        self.table.clear();
        self.slots.clear();
    }

    pub fn reserve(&mut self, count: usize) -> Result<(), TableError> {
        self.table.reserve(count)?;
        let extra = count.saturating_sub(self.slots.len());
        self.slots.reserve(extra);
        Ok(())
    }

    pub fn rehash(&mut self, bucket_count: usize) -> Result<(), TableError> {
        self.table.rehash(bucket_count)
    }

    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit()
    }

    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }
}

/// Iterator over `(key, value)` pairs of an [`ArrayMap`], in table order.
pub struct MapIter<'a, V, L> {
    entries: Iter<'a, L>,
    slots: &'a SlotMap<DefaultKey, V>,
}

impl<'a, V, L: KeyLen> Iterator for MapIter<'a, V, L> {
    type Item = (&'a [u8], &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let e = self.entries.next()?;
        let slots: &'a SlotMap<DefaultKey, V> = self.slots;
        Some((e.key(), &slots[decode_slot(e.value())]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<'a, V, L: KeyLen> ExactSizeIterator for MapIter<'a, V, L> {}

impl<'a, V, S, E, L, G> IntoIterator for &'a ArrayMap<V, S, E, L, G>
where
    S: BuildHasher,
    E: KeyEq,
    L: KeyLen,
    G: GrowthPolicy,
{
    type Item = (&'a [u8], &'a V);
    type IntoIter = MapIter<'a, V, L>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V, S, E, L, G> fmt::Debug for ArrayMap<V, S, E, L, G>
where
    V: fmt::Debug,
    S: BuildHasher,
    E: KeyEq,
    L: KeyLen,
    G: GrowthPolicy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(k, v)| (String::from_utf8_lossy(k), v)))
            .finish()
    }
}
