//! Writer task.
//!
//! Drains one outbound queue, serialises each value to a single-line JSON
//! string, and writes it to the destination stream followed by `\n`. The
//! stream is flushed after every frame so the peer sees it immediately.

use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::bridge::Side;
use crate::{AppError, Result};

/// Serialise queued frames onto `sink`.
///
/// Runs until every sender has been dropped or `stop` fires. On `stop` the
/// queue is closed and whatever is already in it is still written. Either
/// way `sink` is shut down on exit, which signals EOF to the peer.
///
/// # Errors
///
/// Returns [`AppError::Io`] if a write or flush fails (e.g. the worker has
/// exited and its stdin pipe is broken).
pub async fn run_writer<W>(
    side: Side,
    mut sink: W,
    mut rx: mpsc::Receiver<Value>,
    stop: CancellationToken,
) -> Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    loop {
        tokio::select! {
            biased;

            () = stop.cancelled() => {
                rx.close();
                let mut drained = 0_usize;
                while let Ok(value) = rx.try_recv() {
                    write_frame(side, &mut sink, &value).await?;
                    drained += 1;
                }
                debug!(%side, drained, "writer: stop requested, queue drained");
                break;
            }

            msg = rx.recv() => {
                let Some(value) = msg else {
                    debug!(%side, "writer: queue closed, stopping");
                    break;
                };
                write_frame(side, &mut sink, &value).await?;
            }
        }
    }

    if let Err(e) = sink.shutdown().await {
        debug!(%side, error = %e, "writer: shutdown failed");
    }
    Ok(())
}

async fn write_frame<W>(side: Side, sink: &mut W, value: &Value) -> Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut bytes = serde_json::to_vec(value)?;
    bytes.push(b'\n');

    if let Err(e) = write_line(sink, &bytes).await {
        warn!(%side, error = %e, "writer: write failed");
        return Err(AppError::Io(format!("{side} write failed: {e}")));
    }
    Ok(())
}

async fn write_line<W>(sink: &mut W, bytes: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    sink.write_all(bytes).await?;
    sink.flush().await
}
