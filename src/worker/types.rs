//! Worker-side wire types.
//!
//! The worker speaks a JSON-RPC-like envelope with an explicit `type`
//! discriminator and a `factoryApiVersion` stamp. Notification and
//! permission payloads are loosely structured, so they are decoded into
//! tagged variants by inspecting which fields are present instead of through
//! one catch-all struct.

use serde::Deserialize;
use serde_json::Value;

use crate::catalog::RawModel;
use crate::patch::{extract_patch, PatchResult};

/// API version stamped on every outbound worker frame.
pub const FACTORY_API_VERSION: &str = "1.0.0";

/// Worker method names.
pub mod methods {
    /// Session handshake request/ack.
    pub const INITIALIZE_SESSION: &str = "droid.initialize_session";
    /// User message request/ack.
    pub const ADD_USER_MESSAGE: &str = "droid.add_user_message";
    /// Settings update request/ack.
    pub const UPDATE_SESSION_SETTINGS: &str = "droid.update_session_settings";
    /// Streaming session notification.
    pub const SESSION_NOTIFICATION: &str = "droid.session_notification";
    /// Tool permission request.
    pub const REQUEST_PERMISSION: &str = "droid.request_permission";
}

// ── Envelope ──────────────────────────────────────────────────────────────────

/// Raw worker frame.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerFrame {
    /// `request` or `response`.
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Frame id; strings in practice, tolerated as any JSON value.
    #[serde(default)]
    pub id: Option<Value>,
    /// Method name; absent on responses.
    #[serde(default)]
    pub method: Option<String>,
    /// Request parameters.
    #[serde(default)]
    pub params: Option<Value>,
    /// Response payload.
    #[serde(default)]
    pub result: Option<Value>,
    /// Response error.
    #[serde(default)]
    pub error: Option<Value>,
}

impl WorkerFrame {
    /// Method name, if the frame carries a non-empty one.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref().filter(|m| !m.is_empty())
    }

    /// Whether the frame is a reply to one of the bridge's requests.
    #[must_use]
    pub fn is_response(&self) -> bool {
        self.method().is_none() && self.kind == "response"
    }
}

// ── initialize_session result ─────────────────────────────────────────────────

/// Result of `droid.initialize_session`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InitializeSessionResult {
    /// Worker-side session id.
    pub session_id: String,
    /// Current settings.
    pub settings: SessionSettings,
    /// Models the worker can use.
    pub available_models: Vec<RawModel>,
}

/// Worker session settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// Current model.
    pub model_id: String,
    /// Reasoning effort level.
    pub reasoning_effort: String,
    /// Autonomy level.
    pub autonomy_level: String,
}

// ── droid.session_notification ────────────────────────────────────────────────

/// Parsed `droid.session_notification` payload.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerNotification {
    /// Streaming assistant text.
    AssistantTextDelta {
        /// The fragment.
        text: String,
    },
    /// Streaming reasoning text.
    ThinkingTextDelta {
        /// The fragment.
        text: String,
    },
    /// A complete message was created.
    CreateMessage(WorkerMessage),
    /// Worker working state changed.
    WorkingStateChanged {
        /// New state, e.g. `idle`.
        new_state: String,
    },
    /// MCP server status changed.
    McpStatusChanged,
    /// Worker settings changed externally.
    SettingsUpdated,
    /// Any other notification kind.
    Other {
        /// The reported kind.
        kind: String,
    },
}

/// A worker message with content blocks.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkerMessage {
    /// Message id.
    pub id: String,
    /// Author role.
    pub role: String,
    /// Content blocks.
    pub content: Vec<MessageContent>,
}

/// One content block of a worker message.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct MessageContent {
    /// Block id; the tool-use id for tool blocks.
    pub id: String,
    /// Block kind.
    #[serde(rename = "type")]
    pub kind: String,
    /// Text body.
    pub text: String,
    /// Tool input, for tool-use blocks.
    pub input: Option<Value>,
}

impl MessageContent {
    /// Run the block's patch-shaped input through the patch extractor.
    ///
    /// Returns `None` unless the input names a file.
    #[must_use]
    pub fn patch(&self) -> Option<PatchResult> {
        let blob = self.input.as_ref().and_then(patch_blob)?;
        Some(extract_patch(blob)).filter(PatchResult::is_recognized)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct NotificationParams {
    notification: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TextDelta {
    text_delta: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CreateMessage {
    message: WorkerMessage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WorkingState {
    new_state: String,
}

impl WorkerNotification {
    /// Decode the `params` of a `droid.session_notification` frame.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if a recognized kind carries
    /// fields of the wrong type.
    pub fn from_params(params: Value) -> serde_json::Result<Self> {
        let NotificationParams { notification } = serde_json::from_value(params)?;
        let kind = notification
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        Ok(match kind.as_str() {
            "assistant_text_delta" => {
                let TextDelta { text_delta } = serde_json::from_value(notification)?;
                Self::AssistantTextDelta { text: text_delta }
            }
            "thinking_text_delta" => {
                let TextDelta { text_delta } = serde_json::from_value(notification)?;
                Self::ThinkingTextDelta { text: text_delta }
            }
            "create_message" => {
                let CreateMessage { message } = serde_json::from_value(notification)?;
                Self::CreateMessage(message)
            }
            "droid_working_state_changed" => {
                let WorkingState { new_state } = serde_json::from_value(notification)?;
                Self::WorkingStateChanged { new_state }
            }
            "mcp_status_changed" => Self::McpStatusChanged,
            "settings_updated" => Self::SettingsUpdated,
            _ => Self::Other { kind },
        })
    }
}

// ── droid.request_permission ──────────────────────────────────────────────────

/// Parsed `droid.request_permission` payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionParams {
    /// Tool uses awaiting approval.
    pub tool_uses: Vec<ToolUseEntry>,
    /// Options shared by every tool use.
    pub options: Vec<WorkerOption>,
}

/// One tool use awaiting approval.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolUseEntry {
    /// The tool invocation.
    pub tool_use: ToolUse,
    /// Worker confirmation category (`exec`, `edit`, `create`, ...).
    pub confirmation_type: String,
    /// Extra details, notably the command line for executions.
    pub details: Option<ToolUseDetails>,
}

/// A tool invocation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolUse {
    /// Tool-use id, reused as the editor tool-call id.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Tool input.
    pub input: Option<Value>,
}

/// Confirmation details.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolUseDetails {
    /// Detail kind.
    #[serde(rename = "type")]
    pub kind: String,
    /// Full command line.
    pub full_command: String,
    /// Short command.
    pub command: String,
    /// Impact classification.
    pub impact_level: String,
}

/// A worker permission option.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkerOption {
    /// Display label.
    pub label: String,
    /// Option value (`proceed_once`, `proceed_always`, `cancel`, ...).
    pub value: String,
}

/// A file change decoded from a tool input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Target path.
    pub path: String,
    /// Previous text; `None` for new files.
    pub old_text: Option<String>,
    /// Replacement text.
    pub new_text: String,
}

/// What a tool use asks permission for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// Run a command.
    Exec {
        /// The command line.
        command: String,
    },
    /// Modify an existing file.
    Edit(Option<FileChange>),
    /// Create a new file.
    Create(Option<FileChange>),
}

impl ToolUseEntry {
    /// Decide what this tool use does from its details, confirmation type,
    /// and input.
    #[must_use]
    pub fn confirmation(&self) -> Confirmation {
        if let Some(command) = self.command() {
            return Confirmation::Exec { command };
        }

        let change = self.tool_use.input.as_ref().and_then(decode_file_change);
        let creates = self.confirmation_type.eq_ignore_ascii_case("create")
            || self.tool_use.name.eq_ignore_ascii_case("create")
            || change.as_ref().is_some_and(|c| c.old_text.is_none());

        if creates {
            Confirmation::Create(change)
        } else {
            Confirmation::Edit(change)
        }
    }

    fn command(&self) -> Option<String> {
        let details = self.details.as_ref()?;
        [&details.full_command, &details.command]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_owned)
    }
}

/// Patch text carried by a tool input, if any.
fn patch_blob(input: &Value) -> Option<&str> {
    match input {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => ["input", "patch"]
            .into_iter()
            .find_map(|key| map.get(key).and_then(Value::as_str)),
        _ => None,
    }
}

fn string_field<'a>(input: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| input.get(*key).and_then(Value::as_str))
}

/// Decode a tool input into a file change: a patch blob, an explicit
/// old/new text edit, or a path plus full content.
fn decode_file_change(input: &Value) -> Option<FileChange> {
    if let Some(patch) = patch_blob(input).map(extract_patch) {
        if patch.is_recognized() {
            return Some(FileChange {
                path: patch.path,
                old_text: Some(patch.before),
                new_text: patch.after,
            });
        }
    }

    let path = string_field(input, &["file_path", "filePath", "path"])?.trim();
    if path.is_empty() {
        return None;
    }

    let new_text = string_field(input, &["new_str", "new_string", "newText", "new_text"]);
    let old_text = string_field(input, &["old_str", "old_string", "oldText", "old_text"]);
    if let Some(new_text) = new_text {
        return Some(FileChange {
            path: path.to_owned(),
            old_text: Some(old_text.unwrap_or_default().to_owned()),
            new_text: new_text.to_owned(),
        });
    }

    string_field(input, &["content", "contents"]).map(|content| FileChange {
        path: path.to_owned(),
        old_text: None,
        new_text: content.to_owned(),
    })
}
