//! Construction-time table settings.

/// Bucket count used when none is requested.
pub const DEFAULT_BUCKET_COUNT: usize = 16;

/// Packed buckets tolerate longer chains than node-based tables, so the
/// default load factor is above 1.
pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 2.0;

/// Lower clamp for `max_load_factor`.
pub const MIN_MAX_LOAD_FACTOR: f32 = 0.1;

/// Entry-count ceiling, the width of a 32-bit index.
pub const MAX_SIZE: usize = u32::MAX as usize;

/// Settings fixed when a table is built.
///
/// ```
/// use array_hash::TableConfig;
///
/// let config = TableConfig::default()
///     .bucket_count(64)
///     .max_load_factor(1.0)
///     .store_terminator(false);
/// assert_eq!(config.bucket_count, 64);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableConfig {
    /// Requested initial bucket count; the growth policy rounds it up.
    pub bucket_count: usize,
    /// Clamped to at least [`MIN_MAX_LOAD_FACTOR`].
    pub max_load_factor: f32,
    /// Store a `0x00` byte after every key.
    pub store_terminator: bool,
    /// Entry-count ceiling; capped at [`MAX_SIZE`].
    pub max_size: usize,
    /// Fixed size in bytes of the value region of every entry.
    pub value_size: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            store_terminator: true,
            max_size: MAX_SIZE,
            value_size: 0,
        }
    }
}

impl TableConfig {
    pub fn bucket_count(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    pub fn max_load_factor(mut self, max_load_factor: f32) -> Self {
        self.max_load_factor = max_load_factor;
        self
    }

    pub fn store_terminator(mut self, store_terminator: bool) -> Self {
        self.store_terminator = store_terminator;
        self
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn value_size(mut self, value_size: usize) -> Self {
        self.value_size = value_size;
        self
    }

    pub(crate) fn clamped_load_factor(&self) -> f32 {
        clamp_load_factor(self.max_load_factor)
    }

    pub(crate) fn clamped_max_size(&self) -> usize {
        self.max_size.min(MAX_SIZE)
    }
}

// `f32::max` ignores NaN, so NaN lands on the lower clamp.
pub(crate) fn clamp_load_factor(ml: f32) -> f32 {
    ml.max(MIN_MAX_LOAD_FACTOR)
}
