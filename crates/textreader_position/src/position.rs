//! Append-only line ledger with exact rewind.
//!
//! The ledger keeps one `(runes, bytes)` record per line. Scanning appends
//! to the open line and closes it on every newline byte; rewinding pops
//! whole lines from the tail and then trims the open line in place. Because
//! each closed line is separated from the next by exactly one newline byte,
//! the byte offset always equals the sum of all line byte counts plus the
//! number of closed lines.
//!
//! # Thread Safety
//!
//! Every public method takes the internal `parking_lot::Mutex` exactly once.
//! The lock is not reentrant, so no method calls another public method while
//! holding it.

use std::fmt;
use std::ops::Range;

use parking_lot::Mutex;

use crate::utf8::rune_count;
use crate::RewindError;

const NEWLINE: u8 = b'\n';

/// Rune and byte tallies for one line, excluding its terminating newline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct LineRecord {
    runes: usize,
    bytes: usize,
}

/// Unsynchronized ledger state guarded by [`Position`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Ledger {
    /// Lines terminated by a newline, oldest first.
    closed: Vec<LineRecord>,
    /// The open line: everything since the last newline.
    current: LineRecord,
    /// Total bytes scanned.
    offset: usize,
}

impl Ledger {
    fn location(&self) -> Location {
        Location {
            line: self.closed.len() + 1,
            column: self.current.runes,
            offset: self.offset,
        }
    }

    /// Append `input`, asking `runes` for the rune count of each line
    /// segment (a byte range of `input` without newlines).
    fn scan_with(&mut self, input: &[u8], runes: impl Fn(Range<usize>) -> usize) {
        let mut start = 0;
        for newline in memchr::memchr_iter(NEWLINE, input) {
            self.extend_current(start..newline, &runes);
            self.closed.push(self.current);
            self.current = LineRecord::default();
            start = newline + 1;
        }
        self.extend_current(start..input.len(), &runes);
        self.offset += input.len();
    }

    fn extend_current(&mut self, segment: Range<usize>, runes: &impl Fn(Range<usize>) -> usize) {
        self.current.bytes += segment.len();
        self.current.runes += runes(segment);
    }

    fn rewind(&mut self, bytes: usize, runes: usize) -> Result<(), RewindError> {
        if bytes == 0 && runes == 0 {
            return Ok(());
        }
        if bytes > self.offset {
            return Err(RewindError::NotEnoughHistory {
                requested: bytes,
                available: self.offset,
            });
        }
        if runes > bytes {
            return Err(RewindError::Inconsistent { bytes, runes });
        }
        if bytes == self.offset {
            self.reset();
            return Ok(());
        }

        // Plan the rewind against a cursor into `closed` first; nothing is
        // mutated until the whole request is known to fit.
        let mut remaining_bytes = bytes;
        let mut remaining_runes = runes;
        let mut keep = self.closed.len();
        let mut line = self.current;

        while remaining_bytes > line.bytes {
            if keep == 0 {
                return Err(RewindError::Unbalanced {
                    requested: bytes,
                    rewound: bytes - remaining_bytes,
                });
            }
            // The popped line plus the newline that closed the line before it.
            remaining_bytes -= line.bytes + 1;
            remaining_runes = remaining_runes
                .checked_sub(line.runes + 1)
                .ok_or(RewindError::Inconsistent { bytes, runes })?;
            keep -= 1;
            line = self.closed[keep];
        }

        if remaining_runes > line.runes || remaining_runes > remaining_bytes {
            return Err(RewindError::Inconsistent { bytes, runes });
        }

        self.closed.truncate(keep);
        self.current = LineRecord {
            runes: line.runes - remaining_runes,
            bytes: line.bytes - remaining_bytes,
        };
        self.offset -= bytes;
        Ok(())
    }

    fn reset(&mut self) {
        self.closed.clear();
        self.current = LineRecord::default();
        self.offset = 0;
    }
}

/// Line, column and byte offset of a text stream, with exact rewind.
///
/// Lines are 1-based, columns are 0-based rune counts since the last
/// newline, and the offset counts bytes. Cloning produces a fully
/// independent ledger with its own lock.
///
/// # Example
///
/// ```
/// use textreader_position::Position;
///
/// let pos = Position::new();
/// pos.scan("hello\nworld".as_bytes());
/// assert_eq!((pos.line(), pos.column(), pos.offset()), (2, 5, 11));
///
/// pos.rewind(6, 6).unwrap();
/// assert_eq!(pos.to_string(), "1:5");
/// ```
#[derive(Default)]
pub struct Position {
    ledger: Mutex<Ledger>,
}

impl Position {
    /// Create an empty position: line 1, column 0, offset 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// 1-based line number.
    pub fn line(&self) -> usize {
        self.ledger.lock().closed.len() + 1
    }

    /// Runes consumed since the most recent newline.
    pub fn column(&self) -> usize {
        self.ledger.lock().current.runes
    }

    /// Total bytes scanned.
    pub fn offset(&self) -> usize {
        self.ledger.lock().offset
    }

    /// All three coordinates, read under a single lock.
    pub fn location(&self) -> Location {
        self.ledger.lock().location()
    }

    /// Record `input` as consumed.
    ///
    /// Must be called exactly once per consumed span. Malformed UTF-8 is
    /// counted one rune per offending byte.
    pub fn scan(&self, input: &[u8]) {
        self.ledger
            .lock()
            .scan_with(input, |segment| rune_count(&input[segment]));
    }

    /// Record `input` as consumed, counting one rune per byte flagged in
    /// `starts`.
    ///
    /// [`scan`](Self::scan) decodes each span on its own, so a character
    /// split across two spans counts twice. Readers that hand out text in
    /// arbitrary pieces classify bytes with
    /// [`utf8::mark_rune_starts`](crate::utf8::mark_rune_starts) and record
    /// them here instead. Newline bytes always close a line, whatever their
    /// flag says.
    pub fn scan_marked(&self, input: &[u8], starts: &[bool]) {
        debug_assert_eq!(input.len(), starts.len(), "one flag per byte");
        self.ledger.lock().scan_with(input, |segment| {
            starts[segment].iter().filter(|&&start| start).count()
        });
    }

    /// Undo the last `bytes` scanned bytes, which the caller knows to hold
    /// `runes` runes (newlines included).
    ///
    /// All or nothing: on error the ledger is unchanged. Rewinding the full
    /// offset is equivalent to [`reset`](Self::reset).
    pub fn rewind(&self, bytes: usize, runes: usize) -> Result<(), RewindError> {
        self.ledger.lock().rewind(bytes, runes)
    }

    /// Return to the empty initial state.
    pub fn reset(&self) {
        self.ledger.lock().reset();
    }
}

impl Clone for Position {
    fn clone(&self) -> Self {
        Position {
            ledger: Mutex::new(self.ledger.lock().clone()),
        }
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let lhs = self.ledger.lock().clone();
        lhs == *other.ledger.lock()
    }
}

impl Eq for Position {}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self.location();
        f.debug_struct("Position")
            .field("line", &location.line)
            .field("column", &location.column)
            .field("offset", &location.offset)
            .finish()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.location(), f)
    }
}

/// Plain-data snapshot of a [`Position`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    /// 1-based line number.
    pub line: usize,
    /// 0-based rune column.
    pub column: usize,
    /// Byte offset from the start of the stream.
    pub offset: usize,
}

impl Location {
    /// Start of a stream.
    pub const START: Location = Location {
        line: 1,
        column: 0,
        offset: 0,
    };
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
