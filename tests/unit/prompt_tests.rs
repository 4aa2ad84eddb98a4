//! Unit tests for prompt flattening.

use serde_json::json;

use droid_acp::acp::prompt::{flatten_prompt, Attachment};
use droid_acp::acp::types::PromptBlock;

fn blocks(value: serde_json::Value) -> Vec<PromptBlock> {
    serde_json::from_value(value).expect("prompt blocks decode")
}

#[test]
fn single_text_block_maps_directly() {
    let message = flatten_prompt(&blocks(json!([{ "type": "text", "text": "fix the bug" }])));

    assert_eq!(message.text, "fix the bug");
    assert!(message.attachments.is_empty());
}

#[test]
fn text_blocks_are_joined_with_blank_line() {
    let message = flatten_prompt(&blocks(json!([
        { "type": "text", "text": "first" },
        { "type": "text", "text": "second" },
    ])));

    assert_eq!(message.text, "first\n\nsecond");
}

#[test]
fn resource_contributes_text_and_attachment() {
    let message = flatten_prompt(&blocks(json!([
        { "type": "text", "text": "explain this file" },
        {
            "type": "resource",
            "resource": {
                "uri": "file:///home/dev/project/src/main.rs",
                "mimeType": "text/x-rust",
                "text": "fn main() {}"
            }
        },
    ])));

    assert_eq!(message.text, "explain this file\n\nfn main() {}");
    assert_eq!(
        message.attachments,
        [Attachment {
            name: "main.rs".into(),
            mime_type: Some("text/x-rust".into()),
            path: "file:///home/dev/project/src/main.rs".into(),
        }]
    );
}

#[test]
fn resource_link_is_attachment_only() {
    let message = flatten_prompt(&blocks(json!([
        { "type": "resource_link", "uri": "file:///tmp/notes.md", "name": "" },
    ])));

    assert_eq!(message.text, "");
    assert_eq!(message.attachments.len(), 1);
    assert_eq!(message.attachments[0].name, "notes.md", "name derived from uri");
}

#[test]
fn resource_link_keeps_supplied_name() {
    let message = flatten_prompt(&blocks(json!([
        { "type": "resource_link", "uri": "file:///tmp/a.md", "name": "Design notes" },
    ])));

    assert_eq!(message.attachments[0].name, "Design notes");
}

#[test]
fn unsupported_blocks_are_skipped() {
    let message = flatten_prompt(&blocks(json!([
        { "type": "image", "data": "AAAA", "mimeType": "image/png" },
        { "type": "text", "text": "hello" },
    ])));

    assert_eq!(message.text, "hello");
    assert!(message.attachments.is_empty());
}

#[test]
fn user_message_serializes_without_empty_attachments() {
    let message = flatten_prompt(&blocks(json!([{ "type": "text", "text": "hi" }])));

    let json = serde_json::to_value(&message).expect("serialize");

    assert_eq!(json, json!({ "text": "hi" }));
}
