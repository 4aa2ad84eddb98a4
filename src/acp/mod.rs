//! Agent Client Protocol (ACP) side of the bridge.
//!
//! The editor talks JSON-RPC 2.0 over NDJSON on the bridge's own stdio.
//!
//! - `types`: wire shapes for the requests, replies, and notifications the
//!   bridge exchanges with the editor.
//! - `prompt`: flattening of prompt content blocks into one worker message.
//! - `dispatch`: [`EditorDispatcher`](dispatch::EditorDispatcher), the
//!   handler the editor read loop feeds.

pub mod dispatch;
pub mod prompt;
pub mod types;
