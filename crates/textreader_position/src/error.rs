//! Errors reported by [`Position::rewind`](crate::Position::rewind).

use thiserror::Error;

/// A rewind request that does not match the recorded history.
///
/// A failed rewind never mutates the ledger.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RewindError {
    /// More bytes were requested than have been scanned.
    #[error("cannot rewind by {requested} bytes, only {available} available")]
    NotEnoughHistory { requested: usize, available: usize },
    /// The rune count does not fit the byte span being rewound.
    #[error("rewinding {bytes} bytes as {runes} runes does not match the scanned text")]
    Inconsistent { bytes: usize, runes: usize },
    /// The line records ran out before the byte count was covered.
    #[error("rewind failed: wanted {requested} bytes, rewound {rewound}")]
    Unbalanced { requested: usize, rewound: usize },
}
