//! Outbound write paths for the editor and worker streams.
//!
//! Each destination owns one [`Outbound`]: a bounded queue drained by a
//! writer task plus a lock around the destination's id counter. Every frame
//! is enqueued while holding that lock, so frames never interleave and ids
//! are handed out in the order their frames hit the wire.

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::bridge::Side;
use crate::worker::types::{methods, FACTORY_API_VERSION};
use crate::{AppError, Result};

/// JSON-RPC version stamped on every frame.
pub const JSONRPC_VERSION: &str = "2.0";

/// Serialized, id-allocating handle onto one outbound queue.
#[derive(Debug)]
pub struct Outbound {
    side: Side,
    tx: mpsc::Sender<Value>,
    last_id: Mutex<u64>,
}

impl Outbound {
    /// Wrap the sending half of a destination's queue.
    #[must_use]
    pub fn new(side: Side, tx: mpsc::Sender<Value>) -> Self {
        Self {
            side,
            tx,
            last_id: Mutex::new(0),
        }
    }

    /// Enqueue a frame that needs no id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Closed`] if the writer task has stopped.
    pub async fn send(&self, frame: Value) -> Result<()> {
        let _guard = self.last_id.lock().await;
        self.enqueue(frame).await
    }

    /// Allocate the next id, build a frame with it, and enqueue the frame.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Closed`] if the writer task has stopped.
    pub async fn send_with_id<F>(&self, build: F) -> Result<u64>
    where
        F: FnOnce(u64) -> Value + Send,
    {
        let mut last_id = self.last_id.lock().await;
        *last_id += 1;
        let id = *last_id;
        self.enqueue(build(id)).await?;
        Ok(id)
    }

    async fn enqueue(&self, frame: Value) -> Result<()> {
        debug!(side = %self.side, %frame, "outbound frame queued");
        self.tx
            .send(frame)
            .await
            .map_err(|_| AppError::Closed(format!("{} writer stopped", self.side)))
    }
}

// ── Editor side ───────────────────────────────────────────────────────────────

/// JSON-RPC 2.0 write path towards the editor.
#[derive(Debug)]
pub struct EditorChannel(Outbound);

impl EditorChannel {
    /// Wrap the editor queue.
    #[must_use]
    pub fn new(tx: mpsc::Sender<Value>) -> Self {
        Self(Outbound::new(Side::Editor, tx))
    }

    /// Reply to an editor request.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Decode`] if `result` does not serialize, or
    /// [`AppError::Closed`] if the writer has stopped.
    pub async fn respond<T: Serialize + ?Sized>(&self, id: Value, result: &T) -> Result<()> {
        let result = serde_json::to_value(result)?;
        self.0
            .send(json!({ "jsonrpc": JSONRPC_VERSION, "id": id, "result": result }))
            .await
    }

    /// Reply to an editor request with an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Closed`] if the writer has stopped.
    pub async fn respond_empty(&self, id: Value) -> Result<()> {
        self.respond(id, &json!({})).await
    }

    /// Reply to an editor request with a JSON-RPC error.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Closed`] if the writer has stopped.
    pub async fn respond_error(&self, id: Value, code: i64, message: &str) -> Result<()> {
        self.0
            .send(json!({
                "jsonrpc": JSONRPC_VERSION,
                "id": id,
                "error": { "code": code, "message": message },
            }))
            .await
    }

    /// Send a notification.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Decode`] if `params` does not serialize, or
    /// [`AppError::Closed`] if the writer has stopped.
    pub async fn notify<T: Serialize + ?Sized>(&self, method: &str, params: &T) -> Result<()> {
        let params = serde_json::to_value(params)?;
        self.0
            .send(json!({ "jsonrpc": JSONRPC_VERSION, "method": method, "params": params }))
            .await
    }

    /// Send a request and return its synthesized id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Decode`] if `params` does not serialize, or
    /// [`AppError::Closed`] if the writer has stopped.
    pub async fn request<T: Serialize + ?Sized>(&self, method: &str, params: &T) -> Result<u64> {
        let params = serde_json::to_value(params)?;
        let method = method.to_owned();
        self.0
            .send_with_id(move |id| {
                json!({ "jsonrpc": JSONRPC_VERSION, "id": id, "method": method, "params": params })
            })
            .await
    }
}

// ── Worker side ───────────────────────────────────────────────────────────────

/// Envelope write path towards the worker.
#[derive(Debug)]
pub struct WorkerChannel(Outbound);

impl WorkerChannel {
    /// Wrap the worker queue.
    #[must_use]
    pub fn new(tx: mpsc::Sender<Value>) -> Self {
        Self(Outbound::new(Side::Worker, tx))
    }

    /// Send a request and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Decode`] if `params` does not serialize, or
    /// [`AppError::Closed`] if the writer has stopped.
    pub async fn request<T: Serialize + ?Sized>(&self, method: &str, params: &T) -> Result<String> {
        let params = serde_json::to_value(params)?;
        let method = method.to_owned();
        let id = self
            .0
            .send_with_id(move |id| {
                json!({
                    "jsonrpc": JSONRPC_VERSION,
                    "factoryApiVersion": FACTORY_API_VERSION,
                    "type": "request",
                    "id": id.to_string(),
                    "method": method,
                    "params": params,
                })
            })
            .await?;
        Ok(id.to_string())
    }

    /// Reply to a worker request.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Decode`] if `result` does not serialize, or
    /// [`AppError::Closed`] if the writer has stopped.
    pub async fn respond<T: Serialize + ?Sized>(&self, id: Value, result: &T) -> Result<()> {
        let result = serde_json::to_value(result)?;
        self.0
            .send(json!({
                "jsonrpc": JSONRPC_VERSION,
                "factoryApiVersion": FACTORY_API_VERSION,
                "type": "response",
                "id": id,
                "result": result,
            }))
            .await
    }

    /// Acknowledge a worker request with `{ok: true}`.
    ///
    /// Frames without an id (or with an empty string id) are notifications
    /// and are not acknowledged.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Closed`] if the writer has stopped.
    pub async fn ack(&self, id: Option<&Value>) -> Result<()> {
        match id {
            None | Some(Value::Null) => Ok(()),
            Some(Value::String(s)) if s.is_empty() => Ok(()),
            Some(id) => self.respond(id.clone(), &json!({ "ok": true })).await,
        }
    }

    /// Start (or restart) the worker session in `cwd` with a fresh machine id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Closed`] if the writer has stopped.
    pub async fn initialize_session(&self, cwd: &str) -> Result<String> {
        let params = json!({
            "machineId": uuid::Uuid::new_v4().to_string(),
            "cwd": cwd,
        });
        self.request(methods::INITIALIZE_SESSION, &params).await
    }
}
