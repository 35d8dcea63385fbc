//! Error type shared by the engine and its adapters.

use std::collections::TryReserveError;

/// Reasons an operation on an [`ArrayHash`](crate::ArrayHash) can fail.
///
/// Every failing operation leaves the table exactly as it was before the
/// call.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TableError {
    /// The key is longer than the entry codec's length prefix can describe.
    #[error("key of {len} bytes exceeds the maximum key size of {max} bytes")]
    KeyTooLong { len: usize, max: usize },

    /// The table already holds its maximum number of entries.
    #[error("table already holds the maximum of {max} entries")]
    CapacityExceeded { max: usize },

    /// The value bytes handed to the engine do not match the table's fixed
    /// value size.
    #[error("value of {len} bytes does not match the fixed value size of {expected} bytes")]
    ValueSizeMismatch { len: usize, expected: usize },

    /// The growth policy has no bucket count large enough for the request.
    #[error("no bucket count of at least {requested} is available to the growth policy")]
    BucketCountOverflow { requested: usize },

    /// Reserving memory for a bucket buffer or the bucket array failed.
    #[error("failed to allocate bucket storage: {0}")]
    AllocFailed(#[from] TryReserveError),
}
