//! Editor-side (ACP) wire types.
//!
//! Inbound payloads are decoded leniently: unknown fields are ignored and
//! missing optional fields default. Outbound payloads serialize to the
//! camelCase shapes the editor expects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::ModelCatalog;

/// ACP protocol version echoed in the `initialize` reply.
pub const PROTOCOL_VERSION: u32 = 1;

/// Agent name reported to the editor.
pub const AGENT_NAME: &str = "droid-acp";

/// Agent title reported to the editor.
pub const AGENT_TITLE: &str = "Droid ACP";

// ── Envelope ──────────────────────────────────────────────────────────────────

/// JSON-RPC error object.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RpcError {
    /// Error code.
    #[serde(default)]
    pub code: i64,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Optional structured details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Raw editor frame as it appears on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditorFrame {
    /// Request id; absent for notifications.
    #[serde(default)]
    pub id: Option<Value>,
    /// Method name; absent for responses.
    #[serde(default)]
    pub method: Option<String>,
    /// Method parameters.
    #[serde(default)]
    pub params: Option<Value>,
    /// Response payload.
    #[serde(default)]
    pub result: Option<Value>,
    /// Response error.
    #[serde(default)]
    pub error: Option<RpcError>,
}

/// Classified editor frame.
#[derive(Debug, Clone)]
pub enum EditorMessage {
    /// Error response to one of the bridge's outbound requests.
    Error {
        /// Id of the failed request.
        id: Option<Value>,
        /// The error object.
        error: RpcError,
    },
    /// Successful response to one of the bridge's outbound requests.
    Response {
        /// Id of the answered request.
        id: Option<Value>,
        /// Response payload.
        result: Value,
    },
    /// Inbound request or notification.
    Call {
        /// Request id; `None` for notifications.
        id: Option<Value>,
        /// Method name.
        method: String,
        /// Parameters, `Value::Null` when absent.
        params: Value,
    },
    /// Frame with neither a method nor a result nor an error.
    Empty {
        /// Frame id, if any.
        id: Option<Value>,
    },
}

impl EditorFrame {
    /// Classify the frame by which envelope fields are present.
    #[must_use]
    pub fn classify(self) -> EditorMessage {
        match (self.method, self.result, self.error) {
            (Some(method), _, _) if !method.is_empty() => EditorMessage::Call {
                id: self.id,
                method,
                params: self.params.unwrap_or(Value::Null),
            },
            (_, _, Some(error)) => EditorMessage::Error { id: self.id, error },
            (_, Some(result), None) => EditorMessage::Response {
                id: self.id,
                result,
            },
            _ => EditorMessage::Empty { id: self.id },
        }
    }
}

// ── initialize ────────────────────────────────────────────────────────────────

/// Reply to `initialize`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Protocol version supported by the bridge.
    pub protocol_version: u32,
    /// Capability descriptor.
    pub agent_capabilities: AgentCapabilities,
    /// Agent identity.
    pub agent_info: AgentInfo,
}

/// Capabilities advertised to the editor.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    /// Whether `session/load` is supported.
    pub load_session: bool,
    /// Accepted prompt content kinds.
    pub prompt_capabilities: PromptCapabilities,
    /// Supported MCP server transports.
    pub mcp_capabilities: McpCapabilities,
}

/// Prompt content kinds the bridge accepts.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PromptCapabilities {
    /// Image blocks.
    pub image: bool,
    /// Audio blocks.
    pub audio: bool,
    /// Embedded resource blocks.
    pub embedded_context: bool,
}

/// MCP transports the bridge can forward.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct McpCapabilities {
    /// Streamable HTTP servers.
    pub http: bool,
    /// SSE servers.
    pub sse: bool,
}

/// Agent identity block.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AgentInfo {
    /// Machine name.
    pub name: String,
    /// Display title.
    pub title: String,
    /// Bridge version.
    pub version: String,
}

impl InitializeResult {
    /// The bridge's fixed capability descriptor.
    #[must_use]
    pub fn bridge() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            agent_capabilities: AgentCapabilities {
                load_session: false,
                prompt_capabilities: PromptCapabilities {
                    image: false,
                    audio: false,
                    embedded_context: true,
                },
                mcp_capabilities: McpCapabilities {
                    http: false,
                    sse: false,
                },
            },
            agent_info: AgentInfo {
                name: AGENT_NAME.to_owned(),
                title: AGENT_TITLE.to_owned(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
            },
        }
    }
}

// ── session/new ───────────────────────────────────────────────────────────────

/// Parameters of `session/new`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewSessionParams {
    /// Working directory for the session; absent, null and empty all mean
    /// the default directory.
    pub cwd: Option<String>,
}

/// Reply to `session/new`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionResult {
    /// Freshly generated session id.
    pub session_id: String,
    /// Available models and the current selection.
    pub models: ModelCatalog,
}

// ── session/prompt ────────────────────────────────────────────────────────────

/// Parameters of `session/prompt`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptParams {
    /// Target session.
    pub session_id: String,
    /// Prompt content blocks.
    pub prompt: Vec<PromptBlock>,
}

/// One prompt content block.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromptBlock {
    /// Plain text.
    Text {
        /// The text.
        #[serde(default)]
        text: String,
    },
    /// Embedded resource with inline contents.
    Resource {
        /// The embedded resource.
        #[serde(default)]
        resource: EmbeddedResource,
    },
    /// Reference to a resource without inline contents.
    ResourceLink {
        /// Resource URI.
        #[serde(default)]
        uri: String,
        /// Resource name.
        #[serde(default)]
        name: String,
        /// MIME type.
        #[serde(default, rename = "mimeType")]
        mime_type: Option<String>,
    },
    /// Any block kind the bridge does not forward.
    #[serde(other)]
    Unsupported,
}

/// Embedded resource contents.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddedResource {
    /// Resource URI.
    pub uri: String,
    /// MIME type.
    pub mime_type: Option<String>,
    /// Inline text contents.
    pub text: String,
}

/// Reply to `session/prompt`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PromptResult {
    /// Why the turn ended.
    pub stop_reason: StopReason,
}

/// Turn stop reasons.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The worker finished the turn normally.
    EndTurn,
}

// ── session/set_model ─────────────────────────────────────────────────────────

/// Parameters of `session/set_model`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetModelParams {
    /// Target session; falls back to the current session when empty.
    #[serde(default)]
    pub session_id: String,
    /// Requested model id.
    #[serde(default)]
    pub model_id: String,
}

// ── session/update ────────────────────────────────────────────────────────────

/// Parameters of a `session/update` notification.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionNotification {
    /// Session the update belongs to.
    pub session_id: String,
    /// The update itself.
    pub update: SessionUpdate,
}

/// Session update kinds emitted by the bridge.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "sessionUpdate", rename_all = "snake_case")]
pub enum SessionUpdate {
    /// Streaming assistant text.
    AgentMessageChunk {
        /// The text fragment.
        content: ContentChunk,
    },
    /// Streaming reasoning text.
    AgentThoughtChunk {
        /// The text fragment.
        content: ContentChunk,
    },
    /// Tool-call lifecycle notice.
    ToolCall(ToolCallNotice),
}

/// Content carried by a chunk update.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentChunk {
    /// Plain text fragment.
    Text {
        /// The text.
        text: String,
    },
}

impl ContentChunk {
    /// Wrap a text fragment.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Tool kinds the editor renders.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Command execution.
    Execute,
    /// File modification or creation.
    Edit,
}

/// Tool-call status values.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    /// Awaiting permission or running.
    InProgress,
}

/// Content attached to a tool call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolCallContent {
    /// File diff.
    Diff {
        /// Target path.
        path: String,
        /// Previous text; `None` for new files.
        #[serde(rename = "oldText")]
        old_text: Option<String>,
        /// Replacement text.
        #[serde(rename = "newText")]
        new_text: String,
    },
}

/// `tool_call` session update payload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallNotice {
    /// Tool-call id.
    pub tool_call_id: String,
    /// Human-readable title.
    pub title: String,
    /// Tool kind.
    pub kind: ToolKind,
    /// Lifecycle status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ToolCallStatus>,
    /// Attached content.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ToolCallContent>,
}

// ── session/request_permission ────────────────────────────────────────────────

/// Parameters of an outbound `session/request_permission` request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestPermissionParams {
    /// Session the tool call belongs to.
    pub session_id: String,
    /// Tool call awaiting approval.
    pub tool_call: PermissionToolCall,
    /// Options offered to the user.
    pub options: Vec<PermissionOption>,
}

/// Tool call reference inside a permission request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PermissionToolCall {
    /// Tool-call id.
    pub tool_call_id: String,
    /// Title, when the request carries more than a bare reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Kind, when the request carries more than a bare reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ToolKind>,
    /// Diff content for edits.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ToolCallContent>,
}

/// Permission option kinds.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PermissionOptionKind {
    /// Allow this once.
    AllowOnce,
    /// Allow from now on.
    AllowAlways,
    /// Reject this once.
    RejectOnce,
}

/// One selectable permission option.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PermissionOption {
    /// Option id echoed back in the decision.
    pub option_id: String,
    /// Display label.
    pub name: String,
    /// Option kind.
    pub kind: PermissionOptionKind,
}

/// Editor reply to `session/request_permission`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PermissionResponse {
    /// The user's decision.
    pub outcome: PermissionOutcome,
}

/// Decision payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionOutcome {
    /// `selected` or `cancelled`.
    pub outcome: String,
    /// Chosen option id, present for `selected`.
    pub option_id: String,
}
