//! NDJSON line codec shared by the editor and worker streams.
//!
//! Wraps [`tokio_util::codec::LinesCodec`] with a maximum line length so a
//! misbehaving peer cannot force an unbounded allocation for a single frame.
//! Both protocol dialects are newline-delimited JSON, so one codec serves
//! both read loops.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use crate::{AppError, Result};

/// Maximum line length accepted on either inbound stream: 1 MiB.
pub const MAX_LINE_BYTES: usize = 1_048_576;

/// Newline-delimited JSON codec.
///
/// Each `\n`-terminated UTF-8 line is one complete frame. Inbound lines
/// longer than [`MAX_LINE_BYTES`] decode to
/// [`AppError::Acp`]`("line too long: …")`, which the read loop logs and
/// skips. I/O failures map to [`AppError::Io`].
///
/// # Examples
///
/// ```rust,ignore
/// use tokio_util::codec::FramedRead;
/// use droid_acp::codec::NdjsonCodec;
///
/// let frames = FramedRead::new(tokio::io::stdin(), NdjsonCodec::new());
/// ```
#[derive(Debug)]
pub struct NdjsonCodec(LinesCodec);

impl NdjsonCodec {
    /// Create a codec with the default [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self(LinesCodec::new_with_max_length(MAX_LINE_BYTES))
    }
}

impl Default for NdjsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for NdjsonCodec {
    type Item = String;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode(src).map_err(map_codec_error)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode_eof(src).map_err(map_codec_error)
    }
}

impl Encoder<String> for NdjsonCodec {
    type Error = AppError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<()> {
        self.0.encode(item, dst).map_err(map_codec_error)
    }
}

fn map_codec_error(e: LinesCodecError) -> AppError {
    match e {
        LinesCodecError::MaxLineLengthExceeded => {
            AppError::Acp(format!("line too long: exceeded {MAX_LINE_BYTES} bytes"))
        }
        LinesCodecError::Io(io_err) => AppError::Io(io_err.to_string()),
    }
}
