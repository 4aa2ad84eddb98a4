//! Worker-side dispatcher.
//!
//! Consumes one worker frame at a time. Responses complete a pending
//! `session/new`; requests are acknowledged, translated into editor
//! notifications, or turned into editor permission requests whose ids are
//! recorded for the decision that comes back later.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::acp::types::{
    ContentChunk, NewSessionResult, PermissionOption, PermissionOptionKind, PermissionToolCall,
    PromptResult, RequestPermissionParams, SessionNotification, SessionUpdate, StopReason,
    ToolCallContent, ToolCallNotice, ToolCallStatus, ToolKind,
};
use crate::bridge::context::PermissionCorrelation;
use crate::bridge::reader::LineHandler;
use crate::bridge::Bridge;
use crate::catalog::normalize_catalog;
use crate::worker::types::{
    methods, Confirmation, FileChange, InitializeSessionResult, PermissionParams, ToolUseEntry,
    WorkerFrame, WorkerMessage, WorkerNotification, WorkerOption,
};
use crate::{AppError, Result};

/// Editor method carrying streaming session updates.
pub const SESSION_UPDATE: &str = "session/update";

/// Editor method asking the user to approve a tool call.
pub const REQUEST_PERMISSION: &str = "session/request_permission";

/// Worker working state that ends a prompt turn.
const IDLE_STATE: &str = "idle";

/// Prefix turning a patch path into the URI shown in edit tool calls.
const FILE_URI_PREFIX: &str = "file://";

/// Handles frames arriving from the worker.
#[derive(Debug, Clone)]
pub struct WorkerDispatcher {
    bridge: Bridge,
}

impl WorkerDispatcher {
    /// Create a dispatcher over the shared bridge handles.
    #[must_use]
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    /// Decode one worker line and dispatch it.
    ///
    /// # Errors
    ///
    /// - [`AppError::Decode`] if the line is not a worker envelope.
    /// - [`AppError::Closed`] if an outbound queue is gone.
    pub async fn dispatch_line(&self, line: &str) -> Result<()> {
        let frame: WorkerFrame = serde_json::from_str(line)
            .map_err(|e| AppError::Decode(format!("malformed worker frame: {e}")))?;
        self.dispatch(frame).await
    }

    /// Dispatch one decoded worker frame.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Closed`] if an outbound queue is gone.
    pub async fn dispatch(&self, frame: WorkerFrame) -> Result<()> {
        let Some(method) = frame.method().map(str::to_owned) else {
            if frame.is_response() {
                return self.on_response(frame).await;
            }
            debug!(kind = frame.kind.as_str(), id = ?frame.id, "worker frame without method ignored");
            return Ok(());
        };

        debug!(method = method.as_str(), id = ?frame.id, "worker request");
        match method.as_str() {
            methods::INITIALIZE_SESSION
            | methods::UPDATE_SESSION_SETTINGS
            | methods::ADD_USER_MESSAGE => self.ack(frame.id.as_ref()).await,
            methods::SESSION_NOTIFICATION => self.on_notification(frame.id, frame.params).await,
            methods::REQUEST_PERMISSION => self.on_permission(frame).await,
            other => {
                info!(method = other, "unknown worker method, acknowledging");
                self.ack(frame.id.as_ref()).await
            }
        }
    }

    // ── Responses ─────────────────────────────────────────────────────────────

    async fn on_response(&self, frame: WorkerFrame) -> Result<()> {
        if let Some(error) = &frame.error {
            warn!(id = ?frame.id, %error, "worker returned an error response");
            return Ok(());
        }

        if !self.bridge.ctx.awaits_handshake(frame.id.as_ref()).await {
            debug!(id = ?frame.id, "worker response does not answer a pending session/new");
            return Ok(());
        }

        let result = frame.result.unwrap_or(Value::Null);
        let init: InitializeSessionResult = match serde_json::from_value(result) {
            Ok(init) => init,
            Err(e) => {
                warn!(id = ?frame.id, error = %e, "failed to parse initialize_session result");
                return Ok(());
            }
        };

        let models = normalize_catalog(&init.settings.model_id, &init.available_models);

        let Some(editor_id) = self.bridge.ctx.take_pending_session().await else {
            warn!("session handshake completed with no pending session/new; dropping");
            return Ok(());
        };

        let session_id = self.bridge.ctx.start_session(&models.current_model_id).await;
        info!(
            session_id = session_id.as_str(),
            worker_session_id = init.session_id.as_str(),
            current_model_id = models.current_model_id.as_str(),
            models = models.available_models.len(),
            "session established"
        );

        self.bridge
            .editor
            .respond(editor_id, &NewSessionResult { session_id, models })
            .await
    }

    // ── Session notifications ─────────────────────────────────────────────────

    async fn on_notification(&self, id: Option<Value>, params: Option<Value>) -> Result<()> {
        let notification = match WorkerNotification::from_params(params.unwrap_or(Value::Null)) {
            Ok(notification) => notification,
            Err(e) => {
                warn!(id = ?id, error = %e, "failed to parse session notification");
                return self.ack(id.as_ref()).await;
            }
        };

        match notification {
            WorkerNotification::AssistantTextDelta { text } => {
                self.send_update(SessionUpdate::AgentMessageChunk {
                    content: ContentChunk::text(text),
                })
                .await
            }
            WorkerNotification::ThinkingTextDelta { text } => {
                self.send_update(SessionUpdate::AgentThoughtChunk {
                    content: ContentChunk::text(text),
                })
                .await
            }
            WorkerNotification::CreateMessage(message) => self.on_create_message(&message).await,
            WorkerNotification::WorkingStateChanged { new_state } => {
                debug!(new_state = new_state.as_str(), "worker working state changed");
                if new_state == IDLE_STATE {
                    self.complete_prompt().await
                } else {
                    Ok(())
                }
            }
            WorkerNotification::McpStatusChanged => self.ack(id.as_ref()).await,
            WorkerNotification::SettingsUpdated => {
                self.ack(id.as_ref()).await?;
                let cwd = self.bridge.ctx.cwd().await;
                let queued = self.bridge.worker.initialize_session(&cwd).await;
                if let Ok(handshake_id) = &queued {
                    info!(
                        cwd = cwd.as_str(),
                        handshake_id = handshake_id.as_str(),
                        "worker settings updated; session re-initialized"
                    );
                }
                tolerate_closed_worker_input(queued.map(drop))
            }
            WorkerNotification::Other { kind } => {
                info!(kind = kind.as_str(), "unknown session notification kind, acknowledging");
                self.ack(id.as_ref()).await
            }
        }
    }

    /// Emit one edit tool call per content block carrying a recognized patch.
    async fn on_create_message(&self, message: &WorkerMessage) -> Result<()> {
        for block in &message.content {
            let Some(patch) = block.patch() else {
                continue;
            };
            debug!(
                tool_call_id = block.id.as_str(),
                path = patch.path.as_str(),
                "patch recognized in created message"
            );
            self.send_update(SessionUpdate::ToolCall(ToolCallNotice {
                tool_call_id: block.id.clone(),
                title: "update".to_owned(),
                kind: ToolKind::Edit,
                status: None,
                content: vec![ToolCallContent::Diff {
                    path: format!("{FILE_URI_PREFIX}{}", patch.path),
                    old_text: Some(patch.before),
                    new_text: patch.after,
                }],
            }))
            .await?;
        }
        Ok(())
    }

    async fn complete_prompt(&self) -> Result<()> {
        let Some(prompt_id) = self.bridge.ctx.take_pending_prompt().await else {
            info!("worker idle with no pending session/prompt");
            return Ok(());
        };
        debug!(id = %prompt_id, "prompt turn complete");
        self.bridge
            .editor
            .respond(
                prompt_id,
                &PromptResult {
                    stop_reason: StopReason::EndTurn,
                },
            )
            .await
    }

    async fn send_update(&self, update: SessionUpdate) -> Result<()> {
        let session_id = self.bridge.ctx.session_id().await;
        self.bridge
            .editor
            .notify(SESSION_UPDATE, &SessionNotification { session_id, update })
            .await
    }

    // ── Permission requests ───────────────────────────────────────────────────

    async fn on_permission(&self, frame: WorkerFrame) -> Result<()> {
        let params = frame.params.unwrap_or(Value::Null);
        let params: PermissionParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                warn!(id = ?frame.id, error = %e, "failed to parse permission request");
                return Ok(());
            }
        };

        let Some(worker_request_id) = frame.id else {
            warn!("permission request without id; no way to answer it");
            return Ok(());
        };

        if params.tool_uses.is_empty() {
            warn!(id = %worker_request_id, "permission request without tool uses; dropping");
            return Ok(());
        }

        let options = translate_options(&params.options);
        let session_id = self.bridge.ctx.session_id().await;

        for entry in &params.tool_uses {
            let request = permission_request(&session_id, entry, options.clone());
            let tool_call_id = request.tool_call.tool_call_id.clone();

            self.send_update(SessionUpdate::ToolCall(tool_call_notice(entry)))
                .await?;

            let outbound_id = self
                .bridge
                .editor
                .request(REQUEST_PERMISSION, &request)
                .await?;
            self.bridge
                .ctx
                .register_permission(
                    &outbound_id.to_string(),
                    PermissionCorrelation {
                        worker_request_id: worker_request_id.clone(),
                        tool_call_id,
                    },
                )
                .await;
        }
        Ok(())
    }

    /// Acknowledge a worker request, unless the worker's input is already
    /// closed.
    async fn ack(&self, id: Option<&Value>) -> Result<()> {
        tolerate_closed_worker_input(self.bridge.worker.ack(id).await)
    }
}

/// Worker-bound frames are dropped once the editor has gone away and the
/// worker's stdin has been closed; the worker loop keeps relaying output.
fn tolerate_closed_worker_input(sent: Result<()>) -> Result<()> {
    match sent {
        Err(AppError::Closed(reason)) => {
            debug!(reason = reason.as_str(), "worker input closed; frame dropped");
            Ok(())
        }
        other => other,
    }
}

impl LineHandler for WorkerDispatcher {
    fn handle_line<'a>(
        &'a self,
        line: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.dispatch_line(line))
    }
}

// ── Translation helpers ───────────────────────────────────────────────────────

/// The options offered when the worker supplies none the editor understands.
#[must_use]
pub fn default_options() -> Vec<PermissionOption> {
    vec![
        option("proceed_once", "Allow Once", PermissionOptionKind::AllowOnce),
        option("proceed_always", "Allow Always", PermissionOptionKind::AllowAlways),
        option("cancel", "Reject Once", PermissionOptionKind::RejectOnce),
    ]
}

fn option(id: &str, name: &str, kind: PermissionOptionKind) -> PermissionOption {
    PermissionOption {
        option_id: id.to_owned(),
        name: name.to_owned(),
        kind,
    }
}

/// Map worker option values onto editor permission options.
///
/// Labels are kept except for `proceed_always`, which always reads
/// "Allow Always". Unknown values are skipped.
#[must_use]
pub fn translate_options(options: &[WorkerOption]) -> Vec<PermissionOption> {
    let translated: Vec<PermissionOption> = options
        .iter()
        .filter_map(|o| {
            let (kind, fallback) = match o.value.as_str() {
                "proceed_once" => (PermissionOptionKind::AllowOnce, "Allow Once"),
                "proceed_always" => {
                    return Some(option(
                        &o.value,
                        "Allow Always",
                        PermissionOptionKind::AllowAlways,
                    ))
                }
                "cancel" => (PermissionOptionKind::RejectOnce, "Reject Once"),
                other => {
                    debug!(value = other, "skipping untranslatable permission option");
                    return None;
                }
            };
            let name = if o.label.trim().is_empty() {
                fallback
            } else {
                o.label.as_str()
            };
            Some(option(&o.value, name, kind))
        })
        .collect();

    if translated.is_empty() {
        default_options()
    } else {
        translated
    }
}

fn change_title(verb: &str, change: Option<&FileChange>) -> String {
    match change {
        Some(change) => format!("{verb} {}", change.path),
        None => verb.to_lowercase(),
    }
}

fn diff(change: Option<&FileChange>) -> Vec<ToolCallContent> {
    change
        .map(|c| ToolCallContent::Diff {
            path: c.path.clone(),
            old_text: c.old_text.clone(),
            new_text: c.new_text.clone(),
        })
        .into_iter()
        .collect()
}

/// The `tool_call` notice announcing a tool use before its permission
/// request.
#[must_use]
pub fn tool_call_notice(entry: &ToolUseEntry) -> ToolCallNotice {
    let (title, kind) = match entry.confirmation() {
        Confirmation::Exec { command } => (command, ToolKind::Execute),
        Confirmation::Edit(change) => (change_title("Update", change.as_ref()), ToolKind::Edit),
        Confirmation::Create(change) => (change_title("Create", change.as_ref()), ToolKind::Edit),
    };
    ToolCallNotice {
        tool_call_id: entry.tool_use.id.clone(),
        title,
        kind,
        status: Some(ToolCallStatus::InProgress),
        content: Vec::new(),
    }
}

/// The `session/request_permission` params for one tool use.
///
/// Commands get a bare tool-call reference; edits and creations carry the
/// decoded diff.
#[must_use]
pub fn permission_request(
    session_id: &str,
    entry: &ToolUseEntry,
    options: Vec<PermissionOption>,
) -> RequestPermissionParams {
    let tool_call_id = entry.tool_use.id.clone();
    let tool_call = match entry.confirmation() {
        Confirmation::Exec { .. } => PermissionToolCall {
            tool_call_id,
            title: None,
            kind: None,
            content: Vec::new(),
        },
        Confirmation::Edit(change) => PermissionToolCall {
            tool_call_id,
            title: Some(change_title("Update", change.as_ref())),
            kind: Some(ToolKind::Edit),
            content: diff(change.as_ref()),
        },
        Confirmation::Create(change) => PermissionToolCall {
            tool_call_id,
            title: Some(change_title("Create", change.as_ref())),
            kind: Some(ToolKind::Edit),
            content: diff(change.as_ref()),
        },
    };
    RequestPermissionParams {
        session_id: session_id.to_owned(),
        tool_call,
        options,
    }
}
