//! Editor-side dispatch: `initialize`, `session/set_model`, unknown methods,
//! error frames, and malformed input.

use serde_json::json;

use droid_acp::AppError;

use super::test_helpers::Harness;

// ── initialize ───────────────────────────────────────────────────────────────

/// `initialize` is answered synchronously with the fixed descriptor and
/// nothing reaches the worker.
#[tokio::test]
async fn initialize_replies_with_capabilities() {
    let mut h = Harness::new();

    h.from_editor(json!({
        "jsonrpc": "2.0",
        "id": 0,
        "method": "initialize",
        "params": { "protocolVersion": 1, "clientCapabilities": {} }
    }))
    .await;

    let reply = h.next_to_editor();
    assert_eq!(reply["jsonrpc"], "2.0");
    assert_eq!(reply["id"], 0);
    let result = &reply["result"];
    assert_eq!(result["protocolVersion"], 1);
    assert_eq!(result["agentCapabilities"]["loadSession"], false);
    assert_eq!(
        result["agentCapabilities"]["promptCapabilities"],
        json!({ "image": false, "audio": false, "embeddedContext": true })
    );
    assert_eq!(
        result["agentCapabilities"]["mcpCapabilities"],
        json!({ "http": false, "sse": false })
    );
    assert_eq!(result["agentInfo"]["name"], "droid-acp");
    assert_eq!(result["agentInfo"]["title"], "Droid ACP");
    assert_eq!(result["agentInfo"]["version"], env!("CARGO_PKG_VERSION"));
    h.assert_quiet();
}

// ── Unknown methods ──────────────────────────────────────────────────────────

/// An unknown method gets exactly one empty-result reply.
#[tokio::test]
async fn unknown_method_gets_one_empty_result() {
    let mut h = Harness::new();

    h.from_editor(json!({ "jsonrpc": "2.0", "id": 9, "method": "session/load", "params": {} }))
        .await;

    assert_eq!(
        h.next_to_editor(),
        json!({ "jsonrpc": "2.0", "id": 9, "result": {} })
    );
    h.assert_quiet();
}

/// An unknown notification (no id) is not answered.
#[tokio::test]
async fn unknown_notification_is_not_answered() {
    let mut h = Harness::new();

    h.from_editor(json!({ "jsonrpc": "2.0", "method": "session/cancel", "params": {} }))
        .await;

    h.assert_quiet();
}

// ── Errors and malformed frames ──────────────────────────────────────────────

/// Error frames from the editor are logged and dropped.
#[tokio::test]
async fn error_frame_is_dropped() {
    let mut h = Harness::new();

    h.from_editor(json!({
        "jsonrpc": "2.0",
        "id": 3,
        "error": { "code": -32601, "message": "method not found" }
    }))
    .await;

    h.assert_quiet();
}

/// Malformed JSON surfaces as a decode error for the read loop to log.
#[tokio::test]
async fn malformed_line_is_a_decode_error() {
    let mut h = Harness::new();

    let err = h
        .editor
        .dispatch_line("{\"jsonrpc\":\"2.0\",\"id\":")
        .await
        .expect_err("malformed input must fail");

    assert!(matches!(err, AppError::Decode(_)), "got {err:?}");
    h.assert_quiet();
}

// ── session/set_model ────────────────────────────────────────────────────────

/// A valid `session/set_model` is forwarded to the worker and not answered.
#[tokio::test]
async fn set_model_is_forwarded_without_reply() {
    let mut h = Harness::new();
    let session_id = h.open_session(1, "/repo").await;

    h.from_editor(json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "session/set_model",
        "params": { "sessionId": session_id, "modelId": "  gpt-5  " }
    }))
    .await;

    let request = h.next_to_worker();
    assert_eq!(request["type"], "request");
    assert_eq!(request["factoryApiVersion"], "1.0.0");
    assert_eq!(request["method"], "droid.update_session_settings");
    assert_eq!(
        request["params"],
        json!({ "sessionId": session_id, "modelId": "gpt-5" })
    );
    assert_eq!(
        h.bridge.ctx.session().await.model_id.as_deref(),
        Some("gpt-5")
    );
    h.assert_quiet();
}

/// Without a session id the current session is used.
#[tokio::test]
async fn set_model_falls_back_to_current_session() {
    let mut h = Harness::new();
    let session_id = h.open_session(1, "/repo").await;

    h.from_editor(json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "session/set_model",
        "params": { "modelId": "gpt-5" }
    }))
    .await;

    let request = h.next_to_worker();
    assert_eq!(request["params"]["sessionId"], session_id.as_str());
}

/// Unparseable `session/set_model` params get an empty result.
#[tokio::test]
async fn set_model_parse_failure_replies_empty() {
    let mut h = Harness::new();

    h.from_editor(json!({
        "jsonrpc": "2.0",
        "id": 5,
        "method": "session/set_model",
        "params": "gpt-5"
    }))
    .await;

    assert_eq!(
        h.next_to_editor(),
        json!({ "jsonrpc": "2.0", "id": 5, "result": {} })
    );
    h.assert_quiet();
}
