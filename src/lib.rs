#![forbid(unsafe_code)]

//! `droid-acp`: lets ACP-speaking editors drive the droid coding assistant.
//!
//! The bridge sits between an editor (JSON-RPC 2.0 over NDJSON on stdio) and
//! a droid worker subprocess (its own typed envelope over NDJSON), translating
//! each side's requests, notifications, and replies into the other's shape.

pub mod acp;
pub mod bridge;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod errors;
pub mod patch;
pub mod worker;

pub use config::BridgeConfig;
pub use errors::{AppError, Result};
