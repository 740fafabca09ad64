//! Splitting DOI lists into request-sized batches.

use serde::{Deserialize, Serialize};

/// Default number of DOIs per upstream request
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Largest batch OpenAlex accepts in a single OR filter
pub const MAX_BATCH_SIZE: usize = 100;

/// Number of DOIs per request, always within `1..=MAX_BATCH_SIZE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "usize", into = "usize")]
pub struct BatchSize(usize);

impl BatchSize {
    /// Create a batch size, clamping into the accepted range
    pub fn new(size: usize) -> Self {
        Self(size.clamp(1, MAX_BATCH_SIZE))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self(DEFAULT_BATCH_SIZE)
    }
}

impl From<usize> for BatchSize {
    fn from(size: usize) -> Self {
        Self::new(size)
    }
}

impl From<BatchSize> for usize {
    fn from(size: BatchSize) -> Self {
        size.0
    }
}

/// Lazily split `items` into contiguous batches of at most `size` entries.
///
/// Every item lands in exactly one batch and order is preserved; only the
/// last batch may be shorter.
pub fn batches<T>(items: &[T], size: BatchSize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.get())
}

/// Number of batches `len` items split into
pub fn batch_count(len: usize, size: BatchSize) -> usize {
    len.div_ceil(size.get())
}
