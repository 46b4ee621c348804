//! Reader configuration.

use textreader_position::utf8::MAX_RUNE_LEN;

/// Buffer capacity used by [`TextReader::new`](crate::TextReader::new).
pub const DEFAULT_CAPACITY: usize = 64 * 1024;

/// Smallest usable capacity: one maximal UTF-8 sequence.
pub const MIN_CAPACITY: usize = MAX_RUNE_LEN;

/// Configuration for a [`TextReader`](crate::TextReader).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ReaderConfig {
    /// Size of the internal buffer in bytes. Bounds both the largest
    /// forward seek and how far back a seek can reach. Values below
    /// [`MIN_CAPACITY`] are raised to it.
    pub capacity: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl ReaderConfig {
    /// Config with the given buffer capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        ReaderConfig { capacity }
    }

    /// The capacity actually allocated.
    pub fn effective_capacity(&self) -> usize {
        self.capacity.max(MIN_CAPACITY)
    }
}
