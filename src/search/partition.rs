//! Work partitioning
//!
//! Splits the candidate list into contiguous, non-overlapping index ranges,
//! one per worker. Every chunk but the trailing ones has `ceil(T/W)` items;
//! trailing chunks may be shorter or empty when W does not divide T.

use crate::error::ConfigError;
use std::ops::Range;

/// Split `total` items into `workers` contiguous chunks
///
/// Always returns exactly `workers` ranges. Concatenated in order they cover
/// `0..total` exactly once.
pub fn partition(total: usize, workers: usize) -> Result<Vec<Range<usize>>, ConfigError> {
    if workers == 0 {
        return Err(ConfigError::InvalidWorkerCount { count: workers });
    }

    let chunk_size = total.div_ceil(workers);

    Ok((0..workers)
        .map(|i| {
            let start = (i * chunk_size).min(total);
            let end = (start + chunk_size).min(total);
            start..end
        })
        .collect())
}

/// Slice `items` according to `partition`
pub fn chunks<T>(items: &[T], workers: usize) -> Result<Vec<&[T]>, ConfigError> {
    Ok(partition(items.len(), workers)?
        .into_iter()
        .map(|range| &items[range])
        .collect())
}
