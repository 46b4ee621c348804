//! Fixed-capacity read buffer with compaction.
//!
//! The window holds `buf[..w]` as resident bytes. `buf[..r]` has already been
//! handed to the caller (and scanned into the position ledger); `buf[r..w]`
//! is unread. The scanned prefix is what makes backward seeks possible, and
//! it only shrinks when [`Window::fill_at_least`] compacts to make room.
//!
//! # Rune Starts
//!
//! For every scanned byte the window remembers whether that byte opened a
//! rune. Classification runs across consume calls: `carry` counts the
//! unread bytes that continue a rune whose first byte was already handed
//! out, so a character split between two reads is still one rune. Rewinding
//! a span passes the ledger exactly the rune count it recorded.

use std::io::{self, Read};

use textreader_position::utf8::{mark_rune_starts, MAX_RUNE_LEN};

use crate::ReadError;

pub(crate) struct Window {
    buf: Box<[u8]>,
    /// `rune_starts[i]` is meaningful for `i < r` only.
    rune_starts: Box<[bool]>,
    r: usize,
    w: usize,
    /// Bytes from `r` on that continue an already counted rune.
    carry: usize,
    /// The last source read returned end of stream.
    eof: bool,
}

impl Window {
    pub(crate) fn new(capacity: usize) -> Self {
        Window {
            buf: vec![0; capacity].into_boxed_slice(),
            rune_starts: vec![false; capacity].into_boxed_slice(),
            r: 0,
            w: 0,
            carry: 0,
            eof: false,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Unread resident bytes.
    #[inline]
    pub(crate) fn buffered(&self) -> usize {
        self.w - self.r
    }

    /// Length of the scanned prefix, i.e. how far back a seek may go.
    #[inline]
    pub(crate) fn read_pos(&self) -> usize {
        self.r
    }

    #[inline]
    pub(crate) fn unread(&self) -> &[u8] {
        &self.buf[self.r..self.w]
    }

    /// Ensure at least `n` unread bytes are resident.
    ///
    /// Returns `Ok(false)` if the source reached end of stream first; the
    /// bytes that did arrive stay buffered. `keep` is the number of scanned
    /// bytes just before the cursor that compaction should try to retain
    /// (the span a pending unread would restore).
    pub(crate) fn fill_at_least<R: Read>(
        &mut self,
        source: &mut R,
        n: usize,
        keep: usize,
    ) -> Result<bool, ReadError> {
        if n == 0 {
            return Ok(true);
        }

        let capacity = self.capacity();
        if n > capacity {
            return Err(ReadError::BufferTooSmall {
                requested: n,
                capacity,
            });
        }

        if self.buffered() >= n {
            return Ok(true);
        }

        if self.r + n > capacity {
            let room = capacity - n;
            if keep > room {
                // Compacting would cut into the undo span; only do so once
                // the source has produced more data.
                let mut probe = [0u8; MAX_RUNE_LEN];
                let shortfall = (n - self.buffered()).min(MAX_RUNE_LEN);
                let got = read_source(source, &mut probe[..shortfall])?;
                if got == 0 {
                    return Ok(self.reached_end(n));
                }
                self.compact(room);
                self.buf[self.w..self.w + got].copy_from_slice(&probe[..got]);
                self.w += got;
                self.eof = false;
            } else {
                self.compact(keep);
            }
        }

        while self.buffered() < n {
            match read_source(source, &mut self.buf[self.w..])? {
                0 => return Ok(self.reached_end(n)),
                read => {
                    self.w += read;
                    self.eof = false;
                }
            }
        }

        Ok(true)
    }

    fn reached_end(&mut self, requested: usize) -> bool {
        self.eof = true;
        tracing::trace!(
            requested,
            buffered = self.buffered(),
            "source reached end of stream"
        );
        false
    }

    /// Shift unread bytes (plus up to `keep` scanned bytes) to index 0.
    ///
    /// Everything before the retained span becomes unreachable for seeks.
    fn compact(&mut self, keep: usize) {
        let start = self.r - keep.min(self.r);
        if start == 0 {
            return;
        }

        self.buf.copy_within(start..self.w, 0);
        self.rune_starts.copy_within(start..self.r, 0);
        self.r -= start;
        self.w -= start;

        tracing::trace!(
            discarded = start,
            retained = self.r,
            unread = self.buffered(),
            "compacted read buffer"
        );
    }

    /// Advance the cursor over `len` unread bytes and return them with
    /// their rune-start flags for scanning.
    pub(crate) fn consume(&mut self, len: usize) -> (&[u8], &[bool]) {
        let start = self.r;
        let end = start + len;
        debug_assert!(end <= self.w, "consume past buffered data");

        self.carry = mark_rune_starts(
            &self.buf[start..self.w],
            len,
            self.carry,
            self.eof,
            &mut self.rune_starts[start..end],
        );
        self.r = end;
        (&self.buf[start..end], &self.rune_starts[start..end])
    }

    /// Runes recorded for the last `len` scanned bytes.
    pub(crate) fn scanned_runes(&self, len: usize) -> usize {
        debug_assert!(len <= self.r, "span exceeds scanned prefix");
        self.rune_starts[self.r - len..self.r]
            .iter()
            .filter(|&&start| start)
            .count()
    }

    /// Move the cursor back over `len` scanned bytes.
    pub(crate) fn retreat(&mut self, len: usize) {
        debug_assert!(len <= self.r, "retreat past window start");
        let end = self.r;
        self.r -= len;
        let tail = self.rune_starts[self.r..end]
            .iter()
            .take_while(|&&start| !start)
            .count();
        self.carry = if tail == len { len + self.carry } else { tail };
    }

    /// Classify `bytes`, read from the source around the empty buffer, and
    /// return their rune-start flags. Resets the window to empty; nothing
    /// before this point can be sought back into.
    pub(crate) fn pass_through(&mut self, bytes: &[u8]) -> Vec<bool> {
        debug_assert_eq!(self.buffered(), 0, "bypass with buffered data");
        let mut starts = vec![false; bytes.len()];
        self.carry = mark_rune_starts(bytes, bytes.len(), self.carry, false, &mut starts);
        self.r = 0;
        self.w = 0;
        self.eof = false;
        starts
    }
}

/// One read from the source, retrying on `Interrupted`.
pub(crate) fn read_source<R: Read>(source: &mut R, dst: &mut [u8]) -> Result<usize, ReadError> {
    loop {
        match source.read(dst) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            result => return result.map_err(ReadError::Io),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
