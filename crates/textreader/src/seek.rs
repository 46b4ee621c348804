//! Seeking within the buffered window.
//!
//! A seek never touches the source beyond filling the buffer: forward seeks
//! may pull at most one buffer's worth of new data, backward seeks can only
//! reach bytes that compaction has not discarded yet. Targets are absolute
//! stream offsets; the window start sits at `position.offset() - read_pos`.
//!
//! A failed seek leaves the cursor, the position and the undo marker as they
//! were. Bytes pulled from the source while attempting a forward seek stay
//! buffered for later reads.

use std::io::{self, Read, Seek, SeekFrom};

use crate::reader::{Inner, Undo};
use crate::{ReadError, TextReader};

/// Reference point for [`TextReader::seek`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Whence {
    /// Absolute stream offset.
    Start,
    /// Relative to the current offset.
    Current,
    /// Relative to the end of the buffered data. The true stream length is
    /// unknown to a forward-only reader.
    End,
}

impl TryFrom<i32> for Whence {
    type Error = ReadError;

    /// Numeric whence as used by `lseek`: 0, 1 and 2.
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Whence::Start),
            1 => Ok(Whence::Current),
            2 => Ok(Whence::End),
            other => Err(ReadError::InvalidWhence(other)),
        }
    }
}

impl<R: Read> TextReader<R> {
    /// Move the cursor to `offset` relative to `whence` and return the new
    /// absolute offset.
    ///
    /// The position follows the cursor: skipped bytes are scanned as if
    /// read, and a backward seek rewinds line and column exactly.
    ///
    /// # Errors
    ///
    /// - [`ReadError::NegativePosition`] if the target is before offset 0.
    /// - [`ReadError::SeekOutOfBuffer`] if the target lies before the
    ///   window, more than one capacity ahead, or past the end of the stream.
    pub fn seek(&self, offset: i64, whence: Whence) -> Result<u64, ReadError> {
        self.lock().seek(offset, whence)
    }
}

impl<R: Read> Inner<R> {
    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, ReadError> {
        let current = self.position.offset();
        let base = match whence {
            Whence::Start => 0,
            Whence::Current => wide(current),
            Whence::End => wide(current + self.window.buffered()),
        };

        let target = base + i128::from(offset);
        if target < 0 {
            return Err(ReadError::NegativePosition);
        }

        let delta = target - wide(current);
        if delta == 0 {
            return Ok(current as u64);
        }

        let distance =
            usize::try_from(delta.unsigned_abs()).map_err(|_| out_of_buffer(target))?;
        if delta > 0 {
            self.seek_forward(distance, target)?;
        } else {
            self.seek_backward(distance, target)?;
        }

        self.undo = Undo::Nothing;
        Ok(self.position.offset() as u64)
    }

    fn seek_forward(&mut self, distance: usize, target: i128) -> Result<(), ReadError> {
        if distance > self.window.capacity() {
            return Err(out_of_buffer(target));
        }
        let reached = self
            .window
            .fill_at_least(&mut self.source, distance, self.undo.len())?;
        if !reached {
            return Err(out_of_buffer(target));
        }

        let (span, starts) = self.window.consume(distance);
        self.position.scan_marked(span, starts);
        Ok(())
    }

    fn seek_backward(&mut self, distance: usize, target: i128) -> Result<(), ReadError> {
        if distance > self.window.read_pos() {
            return Err(out_of_buffer(target));
        }
        self.step_back(distance)
    }
}

#[inline]
fn wide(n: usize) -> i128 {
    n as i128
}

fn out_of_buffer(target: i128) -> ReadError {
    tracing::debug!(offset = %target, "seek target outside buffered window");
    ReadError::SeekOutOfBuffer
}

impl Whence {
    /// Split a [`SeekFrom`] into an offset and its reference point.
    pub fn split(pos: SeekFrom) -> (i64, Whence) {
        match pos {
            // Offsets past i64::MAX cannot be buffered anyway.
            SeekFrom::Start(n) => (i64::try_from(n).unwrap_or(i64::MAX), Whence::Start),
            SeekFrom::Current(n) => (n, Whence::Current),
            SeekFrom::End(n) => (n, Whence::End),
        }
    }
}

impl<R: Read> Seek for TextReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        <&TextReader<R> as Seek>::seek(&mut &*self, pos)
    }
}

impl<R: Read> Seek for &TextReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (offset, whence) = Whence::split(pos);
        TextReader::seek(*self, offset, whence).map_err(io::Error::from)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position().offset() as u64)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
mod tests;
