//! Unit tests for the NDJSON codec.
//!
//! Covers:
//! - single and batched lines
//! - partial delivery buffered until newline
//! - CRLF line endings
//! - over-long lines mapped to `AppError::Acp("line too long")`
//! - encoding appends exactly one newline

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use droid_acp::codec::{NdjsonCodec, MAX_LINE_BYTES};
use droid_acp::AppError;

// ── Decoding ─────────────────────────────────────────────────────────────────

/// A complete line is returned without its trailing newline.
#[test]
fn single_line_decodes_without_newline() {
    let mut codec = NdjsonCodec::new();
    let mut buf = BytesMut::from("{\"jsonrpc\":\"2.0\",\"method\":\"initialize\"}\n");

    let line = codec.decode(&mut buf).expect("decode must succeed");

    assert_eq!(
        line.as_deref(),
        Some("{\"jsonrpc\":\"2.0\",\"method\":\"initialize\"}"),
        "codec must strip the trailing newline"
    );
}

/// Two lines in one buffer decode as two items.
#[test]
fn batched_lines_decode_separately() {
    let mut codec = NdjsonCodec::new();
    let mut buf = BytesMut::from("{\"id\":1}\n{\"id\":2}\n");

    let first = codec.decode(&mut buf).expect("first decode");
    let second = codec.decode(&mut buf).expect("second decode");
    let third = codec.decode(&mut buf).expect("third decode");

    assert_eq!(first.as_deref(), Some("{\"id\":1}"));
    assert_eq!(second.as_deref(), Some("{\"id\":2}"));
    assert_eq!(third, None, "no further complete line");
}

/// Bytes without a newline are buffered until the line completes.
#[test]
fn partial_line_is_buffered() {
    let mut codec = NdjsonCodec::new();
    let mut buf = BytesMut::from("{\"id\":");

    assert_eq!(codec.decode(&mut buf).expect("partial decode"), None);

    buf.extend_from_slice(b"7}\n");
    assert_eq!(
        codec.decode(&mut buf).expect("completed decode").as_deref(),
        Some("{\"id\":7}")
    );
}

/// A trailing `\r` is stripped along with the newline.
#[test]
fn crlf_line_endings_are_stripped() {
    let mut codec = NdjsonCodec::new();
    let mut buf = BytesMut::from("{\"id\":1}\r\n");

    assert_eq!(
        codec.decode(&mut buf).expect("decode").as_deref(),
        Some("{\"id\":1}")
    );
}

/// A final line without newline is still returned at EOF.
#[test]
fn unterminated_line_is_returned_at_eof() {
    let mut codec = NdjsonCodec::new();
    let mut buf = BytesMut::from("{\"id\":9}");

    assert_eq!(
        codec.decode_eof(&mut buf).expect("decode_eof").as_deref(),
        Some("{\"id\":9}")
    );
}

/// A line longer than the limit is reported as an ACP framing error.
#[test]
fn over_long_line_is_rejected() {
    let mut codec = NdjsonCodec::new();
    let mut buf = BytesMut::from(vec![b'x'; MAX_LINE_BYTES + 1].as_slice());
    buf.extend_from_slice(b"\n");

    let err = codec
        .decode(&mut buf)
        .expect_err("over-long line must fail");

    match err {
        AppError::Acp(msg) => assert!(msg.contains("line too long"), "got: {msg}"),
        other => panic!("expected AppError::Acp, got {other:?}"),
    }
}

// ── Encoding ─────────────────────────────────────────────────────────────────

/// Encoding appends exactly one newline.
#[test]
fn encode_appends_newline() {
    let mut codec = NdjsonCodec::new();
    let mut dst = BytesMut::new();

    codec
        .encode("{\"ok\":true}".to_owned(), &mut dst)
        .expect("encode must succeed");

    assert_eq!(&dst[..], b"{\"ok\":true}\n");
}
