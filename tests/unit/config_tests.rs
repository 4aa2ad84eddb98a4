//! Unit tests for bridge configuration loading and validation.

use std::io::Write;

use droid_acp::config::{BridgeConfig, PendingPolicy};
use droid_acp::AppError;

fn sample_toml() -> &'static str {
    r#"
[worker]
command = "/opt/droid/bin/droid"
args = ["exec", "--input-format", "stream-jsonrpc", "--output-format", "stream-jsonrpc", "--auto", "low"]

[correlation]
prompt_policy = "reject"
session_policy = "replace"

[transport]
channel_capacity = 64
"#
}

// ── Defaults ─────────────────────────────────────────────────────────────────

#[test]
fn empty_document_yields_defaults() {
    let config = BridgeConfig::from_toml_str("").expect("empty config is valid");

    assert_eq!(config, BridgeConfig::default());
    assert_eq!(config.worker.command, "droid");
    assert_eq!(
        config.worker.args,
        [
            "exec",
            "--input-format",
            "stream-jsonrpc",
            "--output-format",
            "stream-jsonrpc"
        ]
    );
    assert_eq!(config.correlation.prompt_policy, PendingPolicy::Replace);
    assert_eq!(config.correlation.session_policy, PendingPolicy::Replace);
    assert_eq!(config.transport.channel_capacity, 256);
}

#[test]
fn partial_section_keeps_other_defaults() {
    let config = BridgeConfig::from_toml_str("[worker]\ncommand = \"droid-nightly\"\n")
        .expect("valid config");

    assert_eq!(config.worker.command, "droid-nightly");
    assert_eq!(config.worker.args.len(), 5, "args keep their default");
    assert_eq!(config.transport.channel_capacity, 256);
}

// ── Full document ────────────────────────────────────────────────────────────

#[test]
fn full_document_parses() {
    let config = BridgeConfig::from_toml_str(sample_toml()).expect("valid config");

    assert_eq!(config.worker.command, "/opt/droid/bin/droid");
    assert_eq!(config.worker.args.last().map(String::as_str), Some("low"));
    assert_eq!(config.correlation.prompt_policy, PendingPolicy::Reject);
    assert_eq!(config.correlation.session_policy, PendingPolicy::Replace);
    assert_eq!(config.transport.channel_capacity, 64);
}

#[test]
fn load_from_path_reads_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(sample_toml().as_bytes()).expect("write config");

    let config = BridgeConfig::load_from_path(file.path()).expect("load config");

    assert_eq!(config.transport.channel_capacity, 64);
}

// ── Validation ───────────────────────────────────────────────────────────────

#[test]
fn empty_worker_command_is_rejected() {
    let err = BridgeConfig::from_toml_str("[worker]\ncommand = \"  \"\n")
        .expect_err("blank command must fail");

    assert!(matches!(err, AppError::Config(_)), "got {err:?}");
    assert!(err.to_string().contains("worker.command"));
}

#[test]
fn zero_channel_capacity_is_rejected() {
    let err = BridgeConfig::from_toml_str("[transport]\nchannel_capacity = 0\n")
        .expect_err("zero capacity must fail");

    assert!(err.to_string().contains("channel_capacity"));
}

#[test]
fn unknown_policy_is_rejected() {
    let err = BridgeConfig::from_toml_str("[correlation]\nprompt_policy = \"queue\"\n")
        .expect_err("unknown policy must fail");

    assert!(matches!(err, AppError::Config(_)), "got {err:?}");
}

#[test]
fn missing_file_is_a_config_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = BridgeConfig::load_from_path(dir.path().join("absent.toml"))
        .expect_err("missing file must fail");

    assert!(err.to_string().starts_with("config: failed to read config"));
}
