//! Editor-side dispatcher.
//!
//! Classifies each frame read from the editor and either answers it
//! directly, forwards it to the worker, or routes a permission decision back
//! to the worker request that asked for it.
//!
//! | Frame                         | Handling                                     |
//! |-------------------------------|----------------------------------------------|
//! | `error`                       | logged, dropped                              |
//! | `result`, no `method`         | permission decision → worker reply           |
//! | `initialize`                  | fixed capability descriptor                  |
//! | `session/new`                 | parked; worker `droid.initialize_session`    |
//! | `session/prompt`              | parked; worker `droid.add_user_message`      |
//! | `session/set_model`           | worker `droid.update_session_settings`       |
//! | *(any other method)*          | empty result                                 |

use std::future::Future;
use std::pin::Pin;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::acp::prompt::flatten_prompt;
use crate::acp::types::{
    EditorFrame, EditorMessage, InitializeResult, NewSessionParams, PermissionOutcome,
    PermissionResponse, PromptParams, RpcError, SetModelParams,
};
use crate::bridge::context::SlotOutcome;
use crate::bridge::reader::LineHandler;
use crate::bridge::Bridge;
use crate::worker::types::methods;
use crate::{AppError, Result};

/// JSON-RPC error code used when a single-slot request is rejected.
pub const BUSY_ERROR_CODE: i64 = -32000;

/// Option sent to the worker when the editor cancels a permission prompt.
pub const CANCEL_OPTION: &str = "cancel";

/// Handles frames arriving from the editor.
#[derive(Debug, Clone)]
pub struct EditorDispatcher {
    bridge: Bridge,
}

impl EditorDispatcher {
    /// Create a dispatcher over the shared bridge handles.
    #[must_use]
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    /// Decode one editor line and dispatch it.
    ///
    /// # Errors
    ///
    /// - [`AppError::Decode`] if the line is not a JSON-RPC frame.
    /// - [`AppError::Closed`] if an outbound queue is gone.
    pub async fn dispatch_line(&self, line: &str) -> Result<()> {
        let frame: EditorFrame = serde_json::from_str(line)
            .map_err(|e| AppError::Decode(format!("malformed editor frame: {e}")))?;
        self.dispatch(frame).await
    }

    /// Dispatch one decoded editor frame.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Closed`] if an outbound queue is gone.
    pub async fn dispatch(&self, frame: EditorFrame) -> Result<()> {
        match frame.classify() {
            EditorMessage::Error { id, error } => {
                log_editor_error(id.as_ref(), &error);
                Ok(())
            }
            EditorMessage::Response { id, result } => self.on_decision(id, result).await,
            EditorMessage::Call { id, method, params } => self.on_call(id, &method, params).await,
            EditorMessage::Empty { id } => {
                warn!(id = ?id, "editor frame has no method, result, or error; dropping");
                Ok(())
            }
        }
    }

    async fn on_call(&self, id: Option<Value>, method: &str, params: Value) -> Result<()> {
        debug!(method, id = ?id, "editor call");
        match method {
            "initialize" => self.on_initialize(id).await,
            "session/new" => self.on_new_session(id, params).await,
            "session/prompt" => self.on_prompt(id, params).await,
            "session/set_model" => self.on_set_model(id, params).await,
            other => {
                info!(method = other, "unknown editor method, replying with empty result");
                match id {
                    Some(id) => self.bridge.editor.respond_empty(id).await,
                    None => Ok(()),
                }
            }
        }
    }

    async fn on_initialize(&self, id: Option<Value>) -> Result<()> {
        let Some(id) = id else {
            warn!("initialize without id; nothing to reply to");
            return Ok(());
        };
        self.bridge
            .editor
            .respond(id, &InitializeResult::bridge())
            .await
    }

    async fn on_new_session(&self, id: Option<Value>, params: Value) -> Result<()> {
        let params: NewSessionParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                warn!(error = %e, "failed to parse session/new params");
                return Ok(());
            }
        };
        let id = id.unwrap_or(Value::Null);
        let requested_cwd = params.cwd.unwrap_or_default();

        let worker = &self.bridge.worker;
        let outcome = self
            .bridge
            .ctx
            .begin_session(id.clone(), &requested_cwd, |cwd| async move {
                let queued = worker.initialize_session(&cwd).await;
                if let Ok(handshake_id) = &queued {
                    info!(
                        cwd = cwd.as_str(),
                        handshake_id = handshake_id.as_str(),
                        "worker session initialization requested"
                    );
                }
                queued
            })
            .await?;

        match outcome {
            SlotOutcome::Rejected => {
                warn!(id = %id, "session/new rejected: another session/new is pending");
                self.bridge
                    .editor
                    .respond_error(id, BUSY_ERROR_CODE, "session/new already in progress")
                    .await
            }
            SlotOutcome::Replaced(old) => {
                warn!(old_id = %old, new_id = %id, "pending session/new replaced");
                Ok(())
            }
            SlotOutcome::Stored => Ok(()),
        }
    }

    async fn on_prompt(&self, id: Option<Value>, params: Value) -> Result<()> {
        let params: PromptParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                warn!(error = %e, "failed to parse session/prompt params");
                return Ok(());
            }
        };
        let id = id.unwrap_or(Value::Null);

        match self.bridge.ctx.begin_prompt(id.clone()).await {
            SlotOutcome::Rejected => {
                warn!(id = %id, "session/prompt rejected: another prompt is pending");
                return self
                    .bridge
                    .editor
                    .respond_error(id, BUSY_ERROR_CODE, "session/prompt already in progress")
                    .await;
            }
            SlotOutcome::Replaced(old) => {
                warn!(old_id = %old, new_id = %id, "pending session/prompt replaced; earlier caller will not be answered");
            }
            SlotOutcome::Stored => {}
        }

        let message = flatten_prompt(&params.prompt);
        debug!(
            session_id = params.session_id.as_str(),
            attachments = message.attachments.len(),
            "forwarding prompt to worker"
        );
        self.bridge
            .worker
            .request(methods::ADD_USER_MESSAGE, &message)
            .await?;
        Ok(())
    }

    async fn on_set_model(&self, id: Option<Value>, params: Value) -> Result<()> {
        let params: SetModelParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                warn!(error = %e, "failed to parse session/set_model params");
                return match id {
                    Some(id) => self.bridge.editor.respond_empty(id).await,
                    None => Ok(()),
                };
            }
        };

        let mut session_id = params.session_id.trim().to_owned();
        if session_id.is_empty() {
            session_id = self.bridge.ctx.session_id().await;
        }

        let model_id = params.model_id.trim();
        if model_id.is_empty() {
            warn!("session/set_model without modelId");
        } else {
            self.bridge.ctx.set_model(model_id).await;
        }

        self.bridge
            .worker
            .request(
                methods::UPDATE_SESSION_SETTINGS,
                &json!({ "sessionId": session_id, "modelId": model_id }),
            )
            .await?;
        Ok(())
    }

    /// Route a `session/request_permission` decision back to the worker.
    async fn on_decision(&self, id: Option<Value>, result: Value) -> Result<()> {
        let Some(id) = id else {
            warn!("editor result without id; dropping");
            return Ok(());
        };

        let response: PermissionResponse = match serde_json::from_value(result) {
            Ok(response) => response,
            Err(e) => {
                warn!(id = %id, error = %e, "failed to parse editor result");
                return Ok(());
            }
        };

        let PermissionOutcome { outcome, option_id } = response.outcome;
        let option_id = if !option_id.is_empty() {
            option_id
        } else if outcome == "cancelled" {
            CANCEL_OPTION.to_owned()
        } else {
            warn!(id = %id, "editor result carries no permission decision; dropping");
            return Ok(());
        };

        let Some(entry) = self.bridge.ctx.take_permission(&id).await else {
            warn!(id = %id, "no pending permission request for editor result");
            return Ok(());
        };

        info!(
            tool_call_id = entry.tool_call_id.as_str(),
            option_id = option_id.as_str(),
            "forwarding permission decision to worker"
        );
        self.bridge
            .worker
            .respond(entry.worker_request_id, &json!({ "selectedOption": option_id }))
            .await
    }
}

impl LineHandler for EditorDispatcher {
    fn handle_line<'a>(
        &'a self,
        line: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.dispatch_line(line))
    }
}

fn log_editor_error(id: Option<&Value>, error: &RpcError) {
    warn!(
        id = ?id,
        code = error.code,
        message = error.message.as_str(),
        "editor returned an error"
    );
}
