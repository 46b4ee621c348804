//! The position-tracking reader.
//!
//! [`TextReader`] composes the fill engine ([`Window`]) and the position
//! ledger. All operations take `&self`; state lives behind one
//! `parking_lot::Mutex`, so each call is atomic with respect to other
//! callers. Sequences of calls ("read, then look at the position") are not.

use std::fmt;
use std::io::{self, Read};

use parking_lot::Mutex;
use textreader_position::utf8::{decode_rune, MAX_RUNE_LEN};
use textreader_position::Position;

use crate::window::{read_source, Window};
use crate::{ReadError, ReaderConfig};

/// What the next unread call may undo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum Undo {
    #[default]
    Nothing,
    /// A rune of the given width was read.
    LastRune(usize),
    /// A single byte was read (or was the last byte of a bulk read).
    LastByte,
}

impl Undo {
    /// Bytes an unread would step back over.
    pub(crate) fn len(self) -> usize {
        match self {
            Undo::Nothing => 0,
            Undo::LastRune(width) => width,
            Undo::LastByte => 1,
        }
    }
}

/// Reader state; only touched with the lock held.
pub(crate) struct Inner<R> {
    pub(crate) source: R,
    pub(crate) window: Window,
    pub(crate) position: Position,
    pub(crate) undo: Undo,
}

/// Buffered UTF-8 reader that tracks line, column and byte offset.
///
/// Reads come from an internal buffer of fixed capacity that is refilled
/// from the wrapped source. Bytes already read stay in the buffer until it
/// compacts, which is what lets [`seek`](Self::seek) move backwards.
///
/// # Example
///
/// ```
/// use textreader::TextReader;
///
/// let reader = TextReader::new("a你\nb".as_bytes());
/// assert_eq!(reader.read_rune().unwrap(), ('a', 1));
/// assert_eq!(reader.read_rune().unwrap(), ('你', 3));
///
/// reader.unread_rune().unwrap();
/// let pos = reader.position();
/// assert_eq!((pos.line(), pos.column(), pos.offset()), (1, 1, 1));
/// ```
pub struct TextReader<R> {
    inner: Mutex<Inner<R>>,
}

impl<R: Read> TextReader<R> {
    /// Reader with the default capacity (64 KiB).
    pub fn new(source: R) -> Self {
        Self::with_config(source, &ReaderConfig::default())
    }

    /// Reader with a buffer of `capacity` bytes (at least 4).
    pub fn with_capacity(source: R, capacity: usize) -> Self {
        Self::with_config(source, &ReaderConfig::with_capacity(capacity))
    }

    pub fn with_config(source: R, config: &ReaderConfig) -> Self {
        TextReader {
            inner: Mutex::new(Inner {
                source,
                window: Window::new(config.effective_capacity()),
                position: Position::new(),
                undo: Undo::Nothing,
            }),
        }
    }

    /// Read up to `dst.len()` bytes.
    ///
    /// Buffered bytes are drained first. If what remains is larger than the
    /// buffer, the source is read straight into `dst` and the buffer is
    /// emptied, which ends all backward seeking into earlier data.
    ///
    /// A short count without an error is normal. An error is returned only
    /// when no byte at all could be produced; `Ok(0)` is returned only for
    /// an empty `dst`. Afterwards `unread_byte` may undo the final byte if it
    /// came from the buffer; `unread_rune` is never valid.
    pub fn read(&self, dst: &mut [u8]) -> Result<usize, ReadError> {
        self.inner.lock().read(dst)
    }

    /// Read one byte.
    pub fn read_byte(&self) -> Result<u8, ReadError> {
        self.inner.lock().read_byte()
    }

    /// Read one rune and its encoded width.
    ///
    /// Malformed UTF-8 is not an error: the offending byte is returned as
    /// U+FFFD with width 1.
    pub fn read_rune(&self) -> Result<(char, usize), ReadError> {
        self.inner.lock().read_rune()
    }

    /// Undo the last [`read_byte`](Self::read_byte), or the final byte of
    /// the last [`read`](Self::read).
    pub fn unread_byte(&self) -> Result<(), ReadError> {
        self.inner.lock().unread_byte()
    }

    /// Undo the last [`read_rune`](Self::read_rune). One level only.
    pub fn unread_rune(&self) -> Result<(), ReadError> {
        self.inner.lock().unread_rune()
    }

    /// Independent snapshot of the current position.
    pub fn position(&self) -> Position {
        self.inner.lock().position.clone()
    }

    /// Buffer capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.inner.lock().window.capacity()
    }

    /// Unread bytes currently held in the buffer.
    pub fn buffered(&self) -> usize {
        self.inner.lock().window.buffered()
    }

    pub(crate) fn lock(&self) -> parking_lot::MutexGuard<'_, Inner<R>> {
        self.inner.lock()
    }
}

impl<R> TextReader<R> {
    /// Mutable access to the source. Reading from it directly desynchronizes
    /// the position.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner.get_mut().source
    }

    /// Unwrap the source. Buffered unread bytes are lost.
    pub fn into_inner(self) -> R {
        self.inner.into_inner().source
    }
}

impl<R: Read> Inner<R> {
    fn read(&mut self, dst: &mut [u8]) -> Result<usize, ReadError> {
        let needed = dst.len();
        let capacity = self.window.capacity();
        let mut filled = 0;
        let mut bypassed = false;
        let mut exhausted = false;
        let mut failure = None;

        while filled < needed {
            let n = (needed - filled).min(self.window.buffered());
            if n > 0 {
                let (span, starts) = self.window.consume(n);
                dst[filled..filled + n].copy_from_slice(span);
                self.position.scan_marked(span, starts);
                filled += n;
            }

            if filled == needed || exhausted || failure.is_some() {
                break;
            }

            let remaining = needed - filled;
            if remaining > capacity {
                tracing::debug!(remaining, capacity, "read bypasses buffer");
                match read_source(&mut self.source, &mut dst[filled..]) {
                    Ok(0) => exhausted = true,
                    Ok(n) => {
                        let out = &dst[filled..filled + n];
                        let starts = self.window.pass_through(out);
                        self.position.scan_marked(out, &starts);
                        filled += n;
                        bypassed = true;
                    }
                    Err(e) => failure = Some(e),
                }
                break;
            }

            match self
                .window
                .fill_at_least(&mut self.source, remaining, self.undo.len())
            {
                Ok(complete) => exhausted = !complete,
                Err(e) => failure = Some(e),
            }
        }

        if filled == 0 {
            if let Some(err) = failure {
                return Err(err);
            }
            if exhausted {
                return Err(ReadError::EndOfStream);
            }
            return Ok(0);
        }

        self.undo = if bypassed || self.window.read_pos() == 0 {
            Undo::Nothing
        } else {
            Undo::LastByte
        };
        Ok(filled)
    }

    fn read_byte(&mut self) -> Result<u8, ReadError> {
        // End of stream is fine here as long as a byte is still buffered.
        self.window
            .fill_at_least(&mut self.source, 1, self.undo.len())?;
        if self.window.buffered() == 0 {
            return Err(ReadError::EndOfStream);
        }

        let (span, starts) = self.window.consume(1);
        let byte = span[0];
        self.position.scan_marked(span, starts);
        self.undo = Undo::LastByte;
        Ok(byte)
    }

    fn read_rune(&mut self) -> Result<(char, usize), ReadError> {
        // A short fill at end of stream may still hold a decodable tail.
        self.window
            .fill_at_least(&mut self.source, MAX_RUNE_LEN, self.undo.len())?;
        let Some((rune, width)) = decode_rune(self.window.unread()) else {
            return Err(ReadError::EndOfStream);
        };

        let (span, starts) = self.window.consume(width);
        self.position.scan_marked(span, starts);
        self.undo = Undo::LastRune(width);
        Ok((rune, width))
    }
}

impl<R> Inner<R> {
    fn unread_byte(&mut self) -> Result<(), ReadError> {
        if self.undo != Undo::LastByte || self.window.read_pos() == 0 {
            return Err(ReadError::InvalidUnreadByte);
        }
        self.step_back(1)
    }

    fn unread_rune(&mut self) -> Result<(), ReadError> {
        let Undo::LastRune(width) = self.undo else {
            return Err(ReadError::InvalidUnreadRune);
        };
        if self.window.read_pos() < width {
            return Err(ReadError::InvalidUnreadRune);
        }
        self.step_back(width)
    }

    /// Move back over `len` scanned bytes, rewinding the position by exactly
    /// what was scanned for them. Clears the undo marker on success.
    pub(crate) fn step_back(&mut self, len: usize) -> Result<(), ReadError> {
        let runes = self.window.scanned_runes(len);
        if let Err(err) = self.position.rewind(len, runes) {
            tracing::warn!(len, runes, %err, "position rejected rewind");
            return Err(err.into());
        }
        self.window.retreat(len);
        self.undo = Undo::Nothing;
        Ok(())
    }
}

impl<R: Read> Read for TextReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        <&TextReader<R> as Read>::read(&mut &*self, buf)
    }
}

impl<R: Read> Read for &TextReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match TextReader::read(*self, buf) {
            Err(ReadError::EndOfStream) => Ok(0),
            result => result.map_err(io::Error::from),
        }
    }
}

impl<R> fmt::Debug for TextReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("TextReader")
            .field("position", &inner.position)
            .field("capacity", &inner.window.capacity())
            .field("buffered", &inner.window.buffered())
            .field("undo", &inner.undo)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
