use super::*;
use pretty_assertions::assert_eq;

fn reader(text: &str, capacity: usize) -> TextReader<&[u8]> {
    TextReader::with_capacity(text.as_bytes(), capacity)
}

fn coords<R: Read>(reader: &TextReader<R>) -> (usize, usize, usize) {
    let loc = reader.position().location();
    (loc.line, loc.column, loc.offset)
}

// === Whence ===

#[test]
fn whence_from_numeric() {
    assert_eq!(Whence::try_from(0).unwrap(), Whence::Start);
    assert_eq!(Whence::try_from(1).unwrap(), Whence::Current);
    assert_eq!(Whence::try_from(2).unwrap(), Whence::End);
    assert!(matches!(
        Whence::try_from(99),
        Err(ReadError::InvalidWhence(99))
    ));
}

#[test]
fn split_seek_from() {
    assert_eq!(Whence::split(SeekFrom::Start(7)), (7, Whence::Start));
    assert_eq!(Whence::split(SeekFrom::Current(-3)), (-3, Whence::Current));
    assert_eq!(Whence::split(SeekFrom::End(0)), (0, Whence::End));
    assert_eq!(
        Whence::split(SeekFrom::Start(u64::MAX)),
        (i64::MAX, Whence::Start)
    );
}

// === Validation ===

#[test]
fn negative_target_is_rejected() {
    let tr = reader("abc", 8);
    assert!(matches!(
        tr.seek(-1, Whence::Start),
        Err(ReadError::NegativePosition)
    ));

    tr.read_byte().unwrap();
    assert!(matches!(
        tr.seek(-2, Whence::Current),
        Err(ReadError::NegativePosition)
    ));
    assert_eq!(coords(&tr), (1, 1, 1));
}

#[test]
fn seek_to_current_offset_is_noop() {
    let tr = reader("ab", 8);
    tr.read_rune().unwrap();
    assert_eq!(tr.seek(0, Whence::Current).unwrap(), 1);
    assert_eq!(tr.seek(1, Whence::Start).unwrap(), 1);

    // Nothing moved, so the pending undo survives.
    tr.unread_rune().unwrap();
    assert_eq!(coords(&tr), (1, 0, 0));
}

#[test]
fn successful_seek_clears_undo() {
    let tr = reader("abc", 8);
    tr.read_rune().unwrap();
    tr.seek(1, Whence::Current).unwrap();
    assert!(matches!(tr.unread_rune(), Err(ReadError::InvalidUnreadRune)));

    tr.read_byte().unwrap();
    tr.seek(-1, Whence::Current).unwrap();
    assert!(matches!(tr.unread_byte(), Err(ReadError::InvalidUnreadByte)));
}

// === Forward ===

#[test]
fn forward_seek_scans_skipped_bytes() {
    let tr = reader("ab\ncd\nef", 16);
    assert_eq!(tr.seek(4, Whence::Start).unwrap(), 4);
    assert_eq!(coords(&tr), (2, 1, 4));
    assert_eq!(tr.read_byte().unwrap(), b'd');

    assert_eq!(tr.seek(2, Whence::Current).unwrap(), 7);
    assert_eq!(coords(&tr), (3, 1, 7));
}

#[test]
fn forward_seek_beyond_capacity_fails() {
    let text = "x".repeat(32);
    let tr = reader(&text, 8);
    assert!(matches!(
        tr.seek(9, Whence::Start),
        Err(ReadError::SeekOutOfBuffer)
    ));
    assert_eq!(coords(&tr), (1, 0, 0));
    assert_eq!(tr.seek(8, Whence::Start).unwrap(), 8);
}

#[test]
fn forward_seek_past_end_of_stream_rolls_back() {
    let tr = reader("abc", 8);
    assert_eq!(tr.read_rune().unwrap(), ('a', 1));

    assert!(matches!(
        tr.seek(5, Whence::Current),
        Err(ReadError::SeekOutOfBuffer)
    ));
    assert_eq!(coords(&tr), (1, 1, 1));

    // The undo marker survives the failed seek.
    tr.unread_rune().unwrap();
    assert_eq!(coords(&tr), (1, 0, 0));
    assert_eq!(tr.read_rune().unwrap(), ('a', 1));
    assert_eq!(tr.read_rune().unwrap(), ('b', 1));
}

#[test]
fn forward_seek_within_buffered_tail() {
    let tr = reader("0123456789", 8);
    tr.read_byte().unwrap();
    // Seven bytes are buffered; the eighth requires a refill.
    assert_eq!(tr.seek(8, Whence::Current).unwrap(), 9);
    assert_eq!(tr.read_byte().unwrap(), b'9');
}

// === Backward ===

#[test]
fn backward_seek_restores_line_and_column() {
    let tr = reader("ab\ncd\nef", 16);
    tr.seek(7, Whence::Start).unwrap();
    assert_eq!(coords(&tr), (3, 1, 7));

    assert_eq!(tr.seek(-6, Whence::Current).unwrap(), 1);
    assert_eq!(coords(&tr), (1, 1, 1));
    assert_eq!(tr.read_byte().unwrap(), b'b');

    assert_eq!(tr.seek(0, Whence::Start).unwrap(), 0);
    assert_eq!(coords(&tr), (1, 0, 0));
}

#[test]
fn backward_seek_over_bytewise_rune_is_exact() {
    let tr = reader("a你b", 16);
    for _ in 0..4 {
        tr.read_byte().unwrap();
    }
    assert_eq!(coords(&tr), (1, 2, 4));

    tr.seek(1, Whence::Start).unwrap();
    assert_eq!(coords(&tr), (1, 1, 1));
    assert_eq!(tr.read_rune().unwrap(), ('你', 3));
    assert_eq!(coords(&tr), (1, 2, 4));
}

#[test]
fn seek_into_middle_of_rune() {
    let tr = reader("你好", 16);
    tr.seek(1, Whence::Start).unwrap();
    assert_eq!(coords(&tr), (1, 1, 1));
    // The tail of '你' decodes on its own but opens no column.
    assert_eq!(tr.read_rune().unwrap(), ('\u{FFFD}', 1));
    assert_eq!(coords(&tr), (1, 1, 2));

    tr.seek(0, Whence::Start).unwrap();
    assert_eq!(coords(&tr), (1, 0, 0));
    assert_eq!(tr.read_rune().unwrap(), ('你', 3));
}

#[test]
fn rereading_after_backward_seek_into_rune_keeps_column() {
    let tr = reader("你好", 16);
    assert_eq!(tr.read_rune().unwrap(), ('你', 3));
    assert_eq!(coords(&tr), (1, 1, 3));

    tr.seek(-1, Whence::Current).unwrap();
    assert_eq!(coords(&tr), (1, 1, 2));
    assert_eq!(tr.read_rune().unwrap(), ('\u{FFFD}', 1));
    assert_eq!(coords(&tr), (1, 1, 3));

    assert_eq!(tr.read_rune().unwrap(), ('好', 3));
    assert_eq!(coords(&tr), (1, 2, 6));
}

#[test]
fn backward_seek_cannot_reach_compacted_bytes() {
    let tr = reader("0123456789abcdef", 8);
    let mut buf = [0u8; 8];
    assert_eq!(tr.read(&mut buf).unwrap(), 8);
    // Refilling compacts; only the byte a pending unread needs survives.
    assert_eq!(tr.read_byte().unwrap(), b'8');

    assert!(matches!(
        tr.seek(0, Whence::Start),
        Err(ReadError::SeekOutOfBuffer)
    ));
    assert_eq!(coords(&tr), (1, 9, 9));
    tr.unread_byte().unwrap();

    assert_eq!(tr.seek(7, Whence::Start).unwrap(), 7);
    assert_eq!(tr.read_byte().unwrap(), b'7');
}

// === End ===

#[test]
fn end_is_relative_to_buffered_data() {
    let tr = reader("hello", 32);
    assert_eq!(tr.read_rune().unwrap(), ('h', 1));
    assert_eq!(tr.seek(0, Whence::Start).unwrap(), 0);

    assert_eq!(tr.seek(0, Whence::End).unwrap(), 5);
    assert!(tr.read_byte().unwrap_err().is_end_of_stream());

    assert_eq!(tr.seek(-2, Whence::End).unwrap(), 3);
    assert_eq!(tr.read_byte().unwrap(), b'l');
}

#[test]
fn end_beyond_stream_fails() {
    let tr = reader("hello", 32);
    tr.read_byte().unwrap();
    assert!(matches!(
        tr.seek(1, Whence::End),
        Err(ReadError::SeekOutOfBuffer)
    ));
    assert_eq!(tr.position().offset(), 1);
}

// === std::io::Seek ===

#[test]
fn io_seek_delegates() {
    let mut tr = reader("line\nnext", 16);
    assert_eq!(Seek::seek(&mut tr, SeekFrom::Start(5)).unwrap(), 5);
    assert_eq!(coords(&tr), (2, 0, 5));

    let mut handle = &tr;
    assert_eq!(Seek::stream_position(&mut handle).unwrap(), 5);
    assert_eq!(Seek::seek(&mut handle, SeekFrom::Current(-1)).unwrap(), 4);
    assert_eq!(coords(&tr), (1, 4, 4));
}

#[test]
fn io_seek_errors_map_to_invalid_input() {
    let mut tr = reader("abc", 8);
    let err = Seek::seek(&mut tr, SeekFrom::Current(-100)).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

    let err = Seek::seek(&mut tr, SeekFrom::Start(100)).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}
