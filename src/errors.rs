//! Error types shared across the bridge.

use std::fmt::{Display, Formatter};

/// Shared bridge result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Bridge error enumeration covering all failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing, validation, or bootstrap failure.
    Config(String),
    /// Editor-side (ACP) protocol or framing failure.
    Acp(String),
    /// Worker-side protocol failure or subprocess failure.
    Worker(String),
    /// A frame or payload could not be decoded.
    Decode(String),
    /// An outbound channel has shut down.
    Closed(String),
    /// Stream I/O failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Acp(msg) => write!(f, "acp: {msg}"),
            Self::Worker(msg) => write!(f, "worker: {msg}"),
            Self::Decode(msg) => write!(f, "decode: {msg}"),
            Self::Closed(msg) => write!(f, "closed: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
