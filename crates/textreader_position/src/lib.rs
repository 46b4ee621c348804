//! Line, column and byte offset tracking for streamed text.
//!
//! [`Position`] is an append-only ledger of per-line rune and byte counts
//! that can be rewound exactly, including across newlines and multi-byte
//! characters. The [`utf8`] module holds the lenient decoder that defines
//! what "one rune" means for both scanning and rewinding: malformed bytes
//! decode to U+FFFD one byte at a time and are never an error.
//!
//! This crate is standalone so that lexers needing only diagnostics
//! coordinates can use it without the buffered reader.

mod error;
mod position;
pub mod utf8;

pub use error::RewindError;
pub use position::{Location, Position};
