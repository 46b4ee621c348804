//! Shared helpers for the integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::io::{self, Read};
use std::sync::Once;

use textreader::{ReadError, TextReader};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber when `RUST_LOG` is set.
///
/// Safe to call from every test; only the first call does anything.
/// Enable with `RUST_LOG=textreader=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_test_writer().with_target(true))
                .with(filter)
                .init();
        }
    });
}

/// Source that returns at most `chunk` bytes per read, forcing the reader
/// through many short fills.
pub struct ChunkedSource {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl ChunkedSource {
    pub fn new(data: impl Into<Vec<u8>>, chunk: usize) -> Self {
        ChunkedSource {
            data: data.into(),
            pos: 0,
            chunk: chunk.max(1),
        }
    }
}

impl Read for ChunkedSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.chunk.min(buf.len()).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Reader over `text` with the given capacity and source chunk size.
pub fn chunked_reader(text: &[u8], capacity: usize, chunk: usize) -> TextReader<ChunkedSource> {
    init_tracing();
    TextReader::with_capacity(ChunkedSource::new(text, chunk), capacity)
}

/// `(line, column, offset)` expected after consuming `prefix`.
pub fn expected_coords(prefix: &str) -> (usize, usize, usize) {
    let line = 1 + prefix.matches('\n').count();
    let column = match prefix.rfind('\n') {
        Some(at) => prefix[at + 1..].chars().count(),
        None => prefix.chars().count(),
    };
    (line, column, prefix.len())
}

pub fn coords<R: Read>(reader: &TextReader<R>) -> (usize, usize, usize) {
    let loc = reader.position().location();
    (loc.line, loc.column, loc.offset)
}

/// Read runes until end of stream, panicking on any other error.
pub fn read_all_runes<R: Read>(reader: &TextReader<R>) -> String {
    let mut out = String::new();
    loop {
        match reader.read_rune() {
            Ok((rune, _)) => out.push(rune),
            Err(ReadError::EndOfStream) => return out,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}
