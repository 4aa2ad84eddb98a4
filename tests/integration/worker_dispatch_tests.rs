//! Worker-side dispatch: mandatory acknowledgements and tolerance of
//! unknown or malformed frames.

use serde_json::json;

use droid_acp::AppError;

use super::test_helpers::{notification, ok_ack, Harness};

fn worker_request(id: &str, method: &str) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "factoryApiVersion": "1.0.0",
        "type": "request",
        "id": id,
        "method": method,
        "params": {}
    })
}

// ── Acknowledgements ─────────────────────────────────────────────────────────

/// Worker requests named after the bridge's own methods are acked.
#[tokio::test]
async fn echo_methods_are_acknowledged() {
    let mut h = Harness::new();

    for (id, method) in [
        ("a-1", "droid.initialize_session"),
        ("a-2", "droid.update_session_settings"),
        ("a-3", "droid.add_user_message"),
    ] {
        h.from_worker(worker_request(id, method)).await;
        assert_eq!(h.next_to_worker(), ok_ack(id), "{method} must be acked");
    }
    h.assert_quiet();
}

/// An unknown worker method gets exactly one ack.
#[tokio::test]
async fn unknown_method_is_acknowledged_once() {
    let mut h = Harness::new();

    h.from_worker(worker_request("u-1", "droid.something_new")).await;

    assert_eq!(h.drain_worker(), [ok_ack("u-1")]);
    assert!(h.drain_editor().is_empty());
}

/// An unknown notification kind gets exactly one ack.
#[tokio::test]
async fn unknown_notification_kind_is_acknowledged_once() {
    let mut h = Harness::new();

    h.from_worker(notification("n-1", json!({ "type": "token_usage_updated", "total": 1200 })))
        .await;

    assert_eq!(h.drain_worker(), [ok_ack("n-1")]);
    assert!(h.drain_editor().is_empty());
}

/// MCP status changes are acknowledged.
#[tokio::test]
async fn mcp_status_change_is_acknowledged() {
    let mut h = Harness::new();

    h.from_worker(notification("m-1", json!({ "type": "mcp_status_changed", "servers": [] })))
        .await;

    assert_eq!(h.drain_worker(), [ok_ack("m-1")]);
}

/// Frames without an id are never acknowledged.
#[tokio::test]
async fn id_less_requests_are_not_acknowledged() {
    let mut h = Harness::new();

    h.from_worker(json!({
        "jsonrpc": "2.0",
        "factoryApiVersion": "1.0.0",
        "type": "request",
        "method": "droid.session_notification",
        "params": { "notification": { "type": "mcp_status_changed" } }
    }))
    .await;
    h.from_worker(json!({
        "jsonrpc": "2.0",
        "type": "request",
        "id": "",
        "method": "droid.unknown"
    }))
    .await;

    h.assert_quiet();
}

// ── Tolerance ────────────────────────────────────────────────────────────────

/// A frame with neither a method nor a response type is ignored.
#[tokio::test]
async fn frame_without_method_or_response_type_is_ignored() {
    let mut h = Harness::new();

    h.from_worker(json!({ "jsonrpc": "2.0", "type": "event", "id": "x" }))
        .await;

    h.assert_quiet();
}

/// A notification with malformed fields is still acknowledged.
#[tokio::test]
async fn malformed_notification_is_acknowledged() {
    let mut h = Harness::new();

    h.from_worker(notification(
        "bad-1",
        json!({ "type": "assistant_text_delta", "textDelta": 42 }),
    ))
    .await;

    assert_eq!(h.drain_worker(), [ok_ack("bad-1")]);
    assert!(h.drain_editor().is_empty());
}

/// Non-JSON input surfaces as a decode error.
#[tokio::test]
async fn malformed_line_is_a_decode_error() {
    let mut h = Harness::new();

    let err = h
        .worker
        .dispatch_line("not json at all")
        .await
        .expect_err("malformed input must fail");

    assert!(matches!(err, AppError::Decode(_)), "got {err:?}");
    h.assert_quiet();
}
