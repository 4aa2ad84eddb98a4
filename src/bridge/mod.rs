//! Bridge runtime: shared context, outbound write paths, and the two
//! independent read loops.
//!
//! ```text
//!  editor stdin ──► run_reader ──► EditorDispatcher ─┐         ┌─► worker writer ──► worker stdin
//!                                                    ├─ Bridge ┤
//! worker stdout ──► run_reader ──► WorkerDispatcher ─┘         └─► editor writer ──► editor stdout
//! ```
//!
//! The loops never talk to each other directly. Everything they share goes
//! through [`BridgeContext`](context::BridgeContext) and the two
//! [`outbound`] channels.

pub mod context;
pub mod outbound;
pub mod reader;
pub mod writer;

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::acp::dispatch::EditorDispatcher;
use crate::config::{BridgeConfig, CorrelationConfig};
use crate::worker::dispatch::WorkerDispatcher;
use crate::Result;

use self::context::BridgeContext;
use self::outbound::{EditorChannel, WorkerChannel};
use self::reader::{run_reader, ReadEnd};
use self::writer::run_writer;

/// Which peer a stream or frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The ACP editor on the bridge's stdio.
    Editor,
    /// The worker subprocess.
    Worker,
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Editor => f.write_str("editor"),
            Self::Worker => f.write_str("worker"),
        }
    }
}

/// Handles shared by both dispatchers.
#[derive(Debug, Clone)]
pub struct Bridge {
    /// Session state and correlation tables.
    pub ctx: Arc<BridgeContext>,
    /// Write path towards the editor.
    pub editor: Arc<EditorChannel>,
    /// Write path towards the worker.
    pub worker: Arc<WorkerChannel>,
}

impl Bridge {
    /// Build a bridge over the sending halves of the two outbound queues.
    #[must_use]
    pub fn new(
        policies: CorrelationConfig,
        editor_tx: mpsc::Sender<Value>,
        worker_tx: mpsc::Sender<Value>,
    ) -> Self {
        Self {
            ctx: Arc::new(BridgeContext::new(policies)),
            editor: Arc::new(EditorChannel::new(editor_tx)),
            worker: Arc::new(WorkerChannel::new(worker_tx)),
        }
    }
}

/// The four byte streams the bridge connects.
#[derive(Debug)]
pub struct BridgeStreams<EI, EO, WI, WO> {
    /// Frames from the editor.
    pub editor_in: EI,
    /// Frames to the editor.
    pub editor_out: EO,
    /// Frames to the worker (its stdin).
    pub worker_in: WI,
    /// Frames from the worker (its stdout).
    pub worker_out: WO,
}

/// Which loop finished first and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeExit {
    /// The side whose read loop ended.
    pub side: Side,
    /// How it ended.
    pub end: ReadEnd,
}

/// Run both read loops and both writers until the bridge has nothing left
/// to relay, or until `cancel` fires.
///
/// The loops end independently:
///
/// - Editor input ends: the worker queue is drained and the worker's stdin
///   is closed. The worker loop keeps relaying until the worker's output
///   ends, so replies to requests already forwarded still reach the editor.
/// - Worker output ends: the editor loop is dropped and both queues drain
///   before their streams are shut down.
/// - `cancel` fires: both loops stop and each writer flushes what is
///   already queued.
///
/// The returned [`BridgeExit`] names the loop that finished first.
///
/// # Errors
///
/// Currently infallible once started; writer failures are logged and end
/// the affected direction only.
pub async fn run_bridge<EI, EO, WI, WO>(
    config: &BridgeConfig,
    streams: BridgeStreams<EI, EO, WI, WO>,
    cancel: CancellationToken,
) -> Result<BridgeExit>
where
    EI: AsyncRead + Unpin + Send + 'static,
    EO: AsyncWrite + Unpin + Send + 'static,
    WI: AsyncWrite + Unpin + Send + 'static,
    WO: AsyncRead + Unpin + Send + 'static,
{
    let BridgeStreams {
        editor_in,
        editor_out,
        worker_in,
        worker_out,
    } = streams;

    let capacity = config.transport.channel_capacity;
    let (editor_tx, editor_rx) = mpsc::channel(capacity);
    let (worker_tx, worker_rx) = mpsc::channel(capacity);
    let bridge = Bridge::new(config.correlation.clone(), editor_tx, worker_tx);

    // The worker dispatcher keeps its own handle on the worker queue, so the
    // worker writer needs a stop signal of its own for editor EOF.
    let worker_input_stop = cancel.child_token();

    let editor_writer = tokio::spawn(run_writer(
        Side::Editor,
        editor_out,
        editor_rx,
        cancel.clone(),
    ));
    let worker_writer = tokio::spawn(run_writer(
        Side::Worker,
        worker_in,
        worker_rx,
        worker_input_stop.clone(),
    ));

    let worker_dispatcher = WorkerDispatcher::new(bridge.clone());
    let worker_cancel = cancel.clone();
    let mut worker_loop = tokio::spawn(async move {
        run_reader(Side::Worker, worker_out, &worker_dispatcher, worker_cancel).await
    });

    let editor_dispatcher = EditorDispatcher::new(bridge);
    let exit = tokio::select! {
        end = run_reader(Side::Editor, editor_in, &editor_dispatcher, cancel.clone()) => {
            BridgeExit { side: Side::Editor, end }
        }
        joined = &mut worker_loop => {
            let end = joined.unwrap_or_else(|err| ReadEnd::Failed(err.to_string()));
            BridgeExit { side: Side::Worker, end }
        }
    };
    info!(side = %exit.side, end = ?exit.end, "bridge read loop finished");
    drop(editor_dispatcher);

    if exit.side == Side::Editor {
        worker_input_stop.cancel();
        match worker_loop.await {
            Ok(end) => info!(end = ?end, "worker read loop finished"),
            Err(err) => warn!(%err, "worker read loop panicked"),
        }
    }

    // Every `Bridge` handle is gone now, so both queues close and drain.
    for (side, handle) in [(Side::Editor, editor_writer), (Side::Worker, worker_writer)] {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(%side, %err, "writer ended with error"),
            Err(err) => warn!(%side, %err, "writer task panicked"),
        }
    }

    Ok(exit)
}
