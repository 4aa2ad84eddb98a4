//! Shared bridge state: the live session and the correlation tables.
//!
//! Both dispatchers hold an `Arc<BridgeContext>`. Each field sits behind its
//! own lock and every accessor keeps its critical section to a single
//! read-modify-write. The one exception is [`BridgeContext::begin_session`],
//! which keeps the pending-session slot locked while the worker handshake is
//! queued so the slot is never visible without its handshake id. No lock
//! here is held across a stream write.

use std::collections::HashMap;
use std::future::Future;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{CorrelationConfig, PendingPolicy};
use crate::Result;

/// Working directory used when the editor supplies none.
pub const DEFAULT_CWD: &str = ".";

/// Result of storing a request id in a single-slot correlation.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotOutcome {
    /// The slot was empty and now holds the new id.
    Stored,
    /// The slot held an older id, which was dropped in favor of the new one.
    Replaced(Value),
    /// The slot is busy and the new id was not stored.
    Rejected,
}

/// Live session fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Current session id; `None` until the first handshake completes.
    pub session_id: Option<String>,
    /// Working directory of the last `session/new`.
    pub cwd: String,
    /// Last selected model id.
    pub model_id: Option<String>,
}

/// Routing data for a permission request forwarded to the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionCorrelation {
    /// Worker request awaiting the decision.
    pub worker_request_id: Value,
    /// Tool call the decision applies to.
    pub tool_call_id: String,
}

#[derive(Debug, Clone)]
struct PendingSession {
    editor_request_id: Value,
    handshake_id: String,
}

/// Explicit bridge context shared by the editor and worker dispatchers.
#[derive(Debug)]
pub struct BridgeContext {
    session: Mutex<SessionState>,
    pending_session: Mutex<Option<PendingSession>>,
    pending_prompt: Mutex<Option<Value>>,
    permissions: Mutex<HashMap<String, PermissionCorrelation>>,
    policies: CorrelationConfig,
}

impl BridgeContext {
    /// Create an empty context with the given pending-slot policies.
    #[must_use]
    pub fn new(policies: CorrelationConfig) -> Self {
        Self {
            session: Mutex::new(SessionState::default()),
            pending_session: Mutex::new(None),
            pending_prompt: Mutex::new(None),
            permissions: Mutex::new(HashMap::new()),
            policies,
        }
    }

    // ── Session state ─────────────────────────────────────────────────────────

    /// Snapshot of the live session fields.
    pub async fn session(&self) -> SessionState {
        self.session.lock().await.clone()
    }

    /// Current session id, or an empty string before the first handshake.
    pub async fn session_id(&self) -> String {
        self.session
            .lock()
            .await
            .session_id
            .clone()
            .unwrap_or_default()
    }

    /// Working directory for (re-)initializing the worker session.
    pub async fn cwd(&self) -> String {
        let cwd = self.session.lock().await.cwd.trim().to_owned();
        if cwd.is_empty() {
            DEFAULT_CWD.to_owned()
        } else {
            cwd
        }
    }

    /// Regenerate the session id and record the selected model.
    ///
    /// Returns the new session id.
    pub async fn start_session(&self, model_id: &str) -> String {
        let session_id = Uuid::new_v4().to_string();
        let mut session = self.session.lock().await;
        session.session_id = Some(session_id.clone());
        session.model_id = Some(model_id.to_owned()).filter(|m| !m.is_empty());
        session_id
    }

    /// Record the model chosen via `session/set_model`.
    pub async fn set_model(&self, model_id: &str) {
        self.session.lock().await.model_id = Some(model_id.to_owned());
    }

    // ── Pending session/new ───────────────────────────────────────────────────

    /// Park a `session/new` request until the worker handshake completes and
    /// remember its working directory.
    ///
    /// `handshake` receives the effective working directory, queues the
    /// worker's `droid.initialize_session` request and returns its id. It
    /// runs while the slot is locked, so a worker response can only ever be
    /// matched against a bound handshake id. A rejected request never calls
    /// `handshake`.
    ///
    /// The directory is recorded even when the request is rejected, matching
    /// the order in which the editor issued its requests.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `handshake`; the slot is left as it
    /// was.
    pub async fn begin_session<F, Fut>(
        &self,
        editor_request_id: Value,
        cwd: &str,
        handshake: F,
    ) -> Result<SlotOutcome>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let cwd = if cwd.trim().is_empty() {
            DEFAULT_CWD
        } else {
            cwd
        };
        self.session.lock().await.cwd = cwd.to_owned();

        let mut slot = self.pending_session.lock().await;
        let outcome = match (slot.as_ref(), self.policies.session_policy) {
            (None, _) => SlotOutcome::Stored,
            (Some(_), PendingPolicy::Reject) => return Ok(SlotOutcome::Rejected),
            (Some(old), PendingPolicy::Replace) => {
                warn!(old_id = %old.editor_request_id, "overwriting pending session/new request");
                SlotOutcome::Replaced(old.editor_request_id.clone())
            }
        };
        let handshake_id = handshake(cwd.to_owned()).await?;
        *slot = Some(PendingSession {
            editor_request_id,
            handshake_id,
        });
        Ok(outcome)
    }

    /// Whether a `session/new` request is waiting for the worker.
    pub async fn has_pending_session(&self) -> bool {
        self.pending_session.lock().await.is_some()
    }

    /// Whether a worker response with `response_id` answers the pending
    /// handshake.
    ///
    /// Id-less responses are accepted; any other id must match the handshake
    /// request.
    pub async fn awaits_handshake(&self, response_id: Option<&Value>) -> bool {
        self.pending_session
            .lock()
            .await
            .as_ref()
            .is_some_and(|pending| {
                response_id.map_or(true, |id| id_key(id) == pending.handshake_id)
            })
    }

    /// Consume the pending `session/new` request id.
    pub async fn take_pending_session(&self) -> Option<Value> {
        self.pending_session
            .lock()
            .await
            .take()
            .map(|p| p.editor_request_id)
    }

    // ── Pending session/prompt ────────────────────────────────────────────────

    /// Park a `session/prompt` request until the worker reports idle.
    pub async fn begin_prompt(&self, editor_request_id: Value) -> SlotOutcome {
        let mut slot = self.pending_prompt.lock().await;
        let outcome = match (slot.as_ref(), self.policies.prompt_policy) {
            (None, _) => SlotOutcome::Stored,
            (Some(_), PendingPolicy::Reject) => return SlotOutcome::Rejected,
            (Some(old), PendingPolicy::Replace) => {
                warn!(old_id = %old, "overwriting pending session/prompt request");
                SlotOutcome::Replaced(old.clone())
            }
        };
        *slot = Some(editor_request_id);
        outcome
    }

    /// Consume the pending `session/prompt` request id.
    pub async fn take_pending_prompt(&self) -> Option<Value> {
        self.pending_prompt.lock().await.take()
    }

    /// Whether a `session/prompt` request is waiting for turn completion.
    pub async fn has_pending_prompt(&self) -> bool {
        self.pending_prompt.lock().await.is_some()
    }

    // ── Permission correlation ────────────────────────────────────────────────

    /// Record routing data for an outbound permission request.
    pub async fn register_permission(&self, outbound_id: &str, entry: PermissionCorrelation) {
        debug!(
            outbound_id,
            tool_call_id = entry.tool_call_id.as_str(),
            "permission request registered"
        );
        self.permissions
            .lock()
            .await
            .insert(outbound_id.to_owned(), entry);
    }

    /// Consume the routing data for the editor's decision on `outbound_id`.
    ///
    /// Each entry is returned at most once.
    pub async fn take_permission(&self, outbound_id: &Value) -> Option<PermissionCorrelation> {
        self.permissions.lock().await.remove(&id_key(outbound_id))
    }

    /// Number of permission requests still awaiting a decision.
    pub async fn pending_permissions(&self) -> usize {
        self.permissions.lock().await.len()
    }
}

/// Normalize a JSON-RPC id to a table key: strings verbatim, everything
/// else in its JSON text form.
#[must_use]
pub fn id_key(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
