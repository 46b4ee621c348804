//! Reader error type.
//!
//! Two tiers: failures of the wrapped source (`EndOfStream`, `Io`) and usage
//! errors reported synchronously. A failing operation never leaves a partial
//! mutation behind; the one exception is a bulk read, which returns the
//! bytes it managed to copy and defers the error to the next call.

use std::io;

use textreader_position::RewindError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReadError {
    /// No more bytes are available.
    #[error("end of stream")]
    EndOfStream,
    /// A single read unit would not fit the buffer.
    #[error("buffer too small: {requested} bytes requested, capacity is {capacity}")]
    BufferTooSmall { requested: usize, capacity: usize },
    /// The seek target is not within the buffered window.
    #[error("seek out of buffer")]
    SeekOutOfBuffer,
    /// `unread_byte` without a preceding byte read.
    #[error("invalid use of unread_byte")]
    InvalidUnreadByte,
    /// `unread_rune` without a preceding rune read.
    #[error("invalid use of unread_rune")]
    InvalidUnreadRune,
    /// The seek target is before the start of the stream.
    #[error("negative position")]
    NegativePosition,
    /// Unrecognized numeric whence.
    #[error("invalid whence: {0}")]
    InvalidWhence(i32),
    /// The position ledger refused a rewind.
    #[error("rewind: {0}")]
    Rewind(#[from] RewindError),
    /// The wrapped source failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ReadError {
    /// Whether this is [`ReadError::EndOfStream`].
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, ReadError::EndOfStream)
    }
}

impl From<ReadError> for io::Error {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Io(e) => e,
            eos @ ReadError::EndOfStream => io::Error::new(io::ErrorKind::UnexpectedEof, eos),
            other => io::Error::new(io::ErrorKind::InvalidInput, other),
        }
    }
}
