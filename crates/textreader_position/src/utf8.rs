//! Lenient UTF-8 rune decoding.
//!
//! Decoding never fails: a byte that does not start a well-formed sequence
//! decodes to [`REPLACEMENT`] with width 1, so a scanner walking arbitrary
//! bytes always makes progress. Both the position ledger and the reader use
//! this module, which keeps their notion of "one rune" identical.

/// Maximum number of bytes in one UTF-8 encoded code point.
pub const MAX_RUNE_LEN: usize = 4;

/// Code point produced for malformed input.
pub const REPLACEMENT: char = char::REPLACEMENT_CHARACTER;

/// Expected sequence width for a leading byte, or 0 if `b` cannot start one.
///
/// `0xC0`, `0xC1` (overlong two-byte forms) and `0xF5..=0xFF` (beyond
/// U+10FFFF) are rejected up front; the remaining overlong and surrogate
/// forms are caught by `str::from_utf8`.
#[inline]
const fn sequence_width(b: u8) -> usize {
    match b {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

/// Decode the first rune of `bytes`.
///
/// Returns `None` only for empty input. Invalid or truncated sequences yield
/// `(REPLACEMENT, 1)`.
#[inline]
pub fn decode_rune(bytes: &[u8]) -> Option<(char, usize)> {
    let &first = bytes.first()?;
    if first.is_ascii() {
        return Some((char::from(first), 1));
    }

    let width = sequence_width(first);
    if width == 0 || bytes.len() < width {
        return Some((REPLACEMENT, 1));
    }

    let decoded = std::str::from_utf8(&bytes[..width])
        .ok()
        .and_then(|s| s.chars().next());
    Some(decoded.map_or((REPLACEMENT, 1), |ch| (ch, width)))
}

/// Iterator over the `(rune, width)` pairs of a byte slice.
///
/// The widths always sum to the slice length.
#[derive(Clone, Debug)]
pub struct Runes<'a> {
    bytes: &'a [u8],
}

impl<'a> Runes<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Runes { bytes }
    }
}

impl Iterator for Runes<'_> {
    type Item = (char, usize);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (ch, width) = decode_rune(self.bytes)?;
        self.bytes = &self.bytes[width..];
        Some((ch, width))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.bytes.len();
        (len.div_ceil(MAX_RUNE_LEN), Some(len))
    }
}

/// Number of runes in `bytes` under lenient decoding.
pub fn rune_count(bytes: &[u8]) -> usize {
    // Pure ASCII is the common case in source text.
    if bytes.is_ascii() {
        return bytes.len();
    }
    Runes::new(bytes).count()
}

#[inline]
const fn is_continuation(b: u8) -> bool {
    b & 0xC0 == 0x80
}

/// Whether `bytes` is a well-formed but unfinished prefix of one sequence.
fn is_incomplete(bytes: &[u8]) -> bool {
    let Some(&first) = bytes.first() else {
        return false;
    };
    sequence_width(first) > bytes.len()
        && matches!(std::str::from_utf8(bytes), Err(e) if e.error_len().is_none())
}

/// Flag which of the first `len` bytes of `bytes` open a rune when text
/// arrives in pieces.
///
/// `carry` is the number of leading bytes that continue a rune opened by an
/// earlier piece; they are trusted only while they are continuation bytes.
/// `bytes[len..]` is lookahead. A sequence that is cut off by the end of
/// `bytes` counts as one rune unless `at_end` says no more input follows,
/// in which case each of its bytes decodes as U+FFFD on its own.
///
/// Returns the carry for the byte after `len`.
pub fn mark_rune_starts(
    bytes: &[u8],
    len: usize,
    carry: usize,
    at_end: bool,
    starts: &mut [bool],
) -> usize {
    debug_assert!(len <= bytes.len(), "span exceeds input");
    debug_assert_eq!(starts.len(), len, "one flag per byte");

    let mut at = 0;
    let mut carry = carry;
    while carry > 0 && at < len && is_continuation(bytes[at]) {
        starts[at] = false;
        at += 1;
        carry -= 1;
    }
    if at == len {
        return carry;
    }

    while at < len {
        let rest = &bytes[at..];
        let width = if !at_end && is_incomplete(rest) {
            sequence_width(rest[0])
        } else {
            decode_rune(rest).map_or(1, |(_, width)| width)
        };
        starts[at] = true;
        starts[at + 1..(at + width).min(len)].fill(false);
        at += width;
    }
    at - len
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
