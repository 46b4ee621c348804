//! Buffered, position-tracking UTF-8 reader.
//!
//! [`TextReader`] wraps any [`std::io::Read`] and hands out bytes, runes or
//! bulk spans while keeping the exact line, column and byte offset of the
//! cursor. It supports one level of undo for the last rune or byte read and
//! can seek, but only within the bytes currently held in its fixed-capacity
//! buffer. That is enough for lexers and parsers that need to show the text
//! around a diagnostic.
//!
//! Malformed UTF-8 never stops the reader: each offending byte decodes to
//! U+FFFD with width 1.
//!
//! # Logging
//!
//! The crate emits `tracing` events (buffer compaction, buffer bypass,
//! rejected seeks and rewinds) at `trace`/`debug` level. It never installs a
//! subscriber.

mod config;
mod error;
mod reader;
mod seek;
mod window;

pub use config::{ReaderConfig, DEFAULT_CAPACITY, MIN_CAPACITY};
pub use error::ReadError;
pub use reader::TextReader;
pub use seek::Whence;
pub use textreader_position::{utf8, Location, Position, RewindError};
