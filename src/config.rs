//! Bridge configuration parsing and validation.
//!
//! Every field has a built-in default, so running without a config file is
//! equivalent to loading an empty TOML document.

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

/// What happens when a second request arrives for a single-slot correlation
/// (`session/new` or `session/prompt`) while the first is still unanswered.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingPolicy {
    /// Overwrite the pending id with the newer one and log a warning.
    /// The earlier caller never receives a reply.
    #[default]
    Replace,
    /// Keep the first pending id and answer the newer request with an error.
    Reject,
}

/// Worker subprocess launch settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct WorkerConfig {
    /// Worker executable.
    #[serde(default = "default_worker_command")]
    pub command: String,
    /// Arguments passed to the worker executable.
    #[serde(default = "default_worker_args")]
    pub args: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            command: default_worker_command(),
            args: default_worker_args(),
        }
    }
}

fn default_worker_command() -> String {
    "droid".into()
}

fn default_worker_args() -> Vec<String> {
    ["exec", "--input-format", "stream-jsonrpc", "--output-format", "stream-jsonrpc"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

/// Policies for the single-slot pending request correlations.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CorrelationConfig {
    /// Policy for overlapping `session/prompt` requests.
    #[serde(default)]
    pub prompt_policy: PendingPolicy,
    /// Policy for overlapping `session/new` requests.
    #[serde(default)]
    pub session_policy: PendingPolicy,
}

/// Outbound transport tuning.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TransportConfig {
    /// Capacity of each outbound frame queue.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    256
}

/// Top-level bridge configuration parsed from TOML.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BridgeConfig {
    /// Worker subprocess settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Pending-slot policies.
    #[serde(default)]
    pub correlation: CorrelationConfig,
    /// Outbound queue settings.
    #[serde(default)]
    pub transport: TransportConfig,
}

impl BridgeConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read, contains
    /// invalid TOML, or fails validation.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.worker.command.trim().is_empty() {
            return Err(AppError::Config("worker.command must not be empty".into()));
        }

        if self.transport.channel_capacity == 0 {
            return Err(AppError::Config(
                "transport.channel_capacity must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
