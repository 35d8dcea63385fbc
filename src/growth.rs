//! Growth policies: bucket-count normalization and hash-to-bucket mapping.
//!
//! All bucket-count arithmetic in the engine goes through a
//! [`GrowthPolicy`], so the bucket store and the entry codec never assume a
//! particular count shape.

use crate::error::TableError;

/// Maps requested capacities to bucket counts and hashes to bucket indices.
pub trait GrowthPolicy: Clone + Default {
    /// Smallest bucket count the policy accepts for at least `requested`
    /// buckets. Monotonic in `requested`.
    fn bucket_count_for(&self, requested: usize) -> Result<usize, TableError>;

    /// Bucket index for `hash` in a table of `bucket_count` buckets, where
    /// `bucket_count` was produced by this policy.
    fn index_for(&self, hash: u64, bucket_count: usize) -> usize;

    /// Next larger bucket count after `current`, used when the load factor
    /// is exceeded.
    fn next_count(&self, current: usize) -> Result<usize, TableError>;

    /// Smallest bucket count the policy ever produces.
    fn min_bucket_count(&self) -> usize;

    fn max_bucket_count(&self) -> usize;
}

/// Power-of-two bucket counts, multiplied by `FACTOR` on growth.
///
/// `FACTOR` must be a power of two no smaller than 2; other values are
/// rejected at compile time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PowerOfTwoGrowth<const FACTOR: usize = 2>;

impl<const FACTOR: usize> PowerOfTwoGrowth<FACTOR> {
    const VALID_FACTOR: () = assert!(
        FACTOR >= 2 && FACTOR.is_power_of_two(),
        "growth factor must be a power of two >= 2"
    );

    const MAX_BUCKET_COUNT: usize = 1 << (usize::BITS - 1);
}

impl<const FACTOR: usize> GrowthPolicy for PowerOfTwoGrowth<FACTOR> {
    fn bucket_count_for(&self, requested: usize) -> Result<usize, TableError> {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID_FACTOR;
        if requested > Self::MAX_BUCKET_COUNT {
            return Err(TableError::BucketCountOverflow { requested });
        }
        Ok(requested.max(1).next_power_of_two())
    }

    #[inline]
    fn index_for(&self, hash: u64, bucket_count: usize) -> usize {
        debug_assert!(bucket_count.is_power_of_two());
        (hash as usize) & (bucket_count - 1)
    }

    fn next_count(&self, current: usize) -> Result<usize, TableError> {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID_FACTOR;
        current
            .checked_mul(FACTOR)
            .filter(|&n| n <= Self::MAX_BUCKET_COUNT)
            .ok_or(TableError::BucketCountOverflow {
                requested: current.saturating_mul(FACTOR),
            })
    }

    fn min_bucket_count(&self) -> usize {
        1
    }

    fn max_bucket_count(&self) -> usize {
        Self::MAX_BUCKET_COUNT
    }
}

// Each entry roughly doubles the previous one.
const PRIMES: [u64; 40] = [
    1,
    5,
    17,
    29,
    37,
    53,
    67,
    79,
    97,
    131,
    193,
    257,
    389,
    521,
    769,
    1031,
    1543,
    2053,
    3079,
    6151,
    12289,
    24593,
    49157,
    98317,
    196613,
    393241,
    786433,
    1572869,
    3145739,
    6291469,
    12582917,
    25165843,
    50331653,
    100663319,
    201326611,
    402653189,
    805306457,
    1610612741,
    3221225473,
    4294967291,
];

/// Prime bucket counts drawn from a fixed table; indices are `hash % count`.
///
/// Spreads poorly distributed hashes better than [`PowerOfTwoGrowth`] at
/// the cost of a modulo per lookup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrimeGrowth;

impl PrimeGrowth {
    fn first_at_least(requested: usize) -> Option<usize> {
        let pos = PRIMES.partition_point(|&p| p < requested as u64);
        PRIMES
            .get(pos)
            .and_then(|&p| usize::try_from(p).ok())
    }
}

impl GrowthPolicy for PrimeGrowth {
    fn bucket_count_for(&self, requested: usize) -> Result<usize, TableError> {
        Self::first_at_least(requested).ok_or(TableError::BucketCountOverflow { requested })
    }

    #[inline]
    fn index_for(&self, hash: u64, bucket_count: usize) -> usize {
        (hash % bucket_count as u64) as usize
    }

    fn next_count(&self, current: usize) -> Result<usize, TableError> {
        let requested = current.saturating_add(1);
        Self::first_at_least(requested).ok_or(TableError::BucketCountOverflow { requested })
    }

    fn min_bucket_count(&self) -> usize {
        1
    }

    fn max_bucket_count(&self) -> usize {
        PRIMES
            .iter()
            .rev()
            .find_map(|&p| usize::try_from(p).ok())
            .unwrap_or(1)
    }
}
