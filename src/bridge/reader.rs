//! Read loop shared by both inbound streams.
//!
//! Drives a [`FramedRead`] over the stream using [`NdjsonCodec`] and hands
//! every non-blank line to the side's [`LineHandler`], strictly in arrival
//! order. A line is fully handled before the next one is read.

use std::future::Future;
use std::pin::Pin;

use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bridge::Side;
use crate::codec::NdjsonCodec;
use crate::{AppError, Result};

/// Consumer of decoded lines for one side of the bridge.
pub trait LineHandler: Send + Sync {
    /// Decode and dispatch one line.
    ///
    /// # Errors
    ///
    /// - [`AppError::Decode`] for malformed frames; the loop logs and skips.
    /// - [`AppError::Closed`] when an outbound queue is gone; the loop stops.
    fn handle_line<'a>(
        &'a self,
        line: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Why a read loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEnd {
    /// The stream reached EOF.
    Eof,
    /// The cancellation token fired.
    Cancelled,
    /// The stream failed with an unrecoverable I/O error.
    Failed(String),
    /// An outbound queue closed while handling a frame.
    OutboundClosed(String),
}

/// Read lines from `stream` and dispatch each to `handler`.
///
/// Codec framing errors (over-long lines) and per-frame handling errors are
/// logged and skipped; they never stop the loop.
pub async fn run_reader<R, H>(
    side: Side,
    stream: R,
    handler: &H,
    cancel: CancellationToken,
) -> ReadEnd
where
    R: AsyncRead + Unpin + Send,
    H: LineHandler + ?Sized,
{
    let mut framed = FramedRead::new(stream, NdjsonCodec::new());

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(%side, "reader: cancellation received, stopping");
                return ReadEnd::Cancelled;
            }

            item = framed.next() => {
                match item {
                    None => {
                        info!(%side, "reader: EOF detected");
                        return ReadEnd::Eof;
                    }

                    Some(Err(AppError::Acp(ref msg))) => {
                        warn!(%side, error = msg.as_str(), "reader: framing error, skipping");
                    }

                    Some(Err(e)) => {
                        warn!(%side, error = %e, "reader: stream error, stopping");
                        return ReadEnd::Failed(e.to_string());
                    }

                    Some(Ok(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        debug!(%side, raw_line = %line, "inbound frame");

                        match handler.handle_line(&line).await {
                            Ok(()) => {}
                            Err(AppError::Closed(msg)) => {
                                warn!(%side, error = msg.as_str(), "reader: outbound closed, stopping");
                                return ReadEnd::OutboundClosed(msg);
                            }
                            Err(e) => {
                                warn!(%side, error = %e, raw_line = %line, "reader: frame dropped");
                            }
                        }
                    }
                }
            }
        }
    }
}
