//! Worker process spawner.
//!
//! Launches the worker CLI with:
//! - piped stdin/stdout carrying the envelope stream;
//! - stderr inherited, so worker diagnostics land next to the bridge's own
//!   logs instead of on the protocol stream;
//! - `kill_on_drop(true)` so an abandoned bridge never leaves the worker
//!   running.

use std::process::Stdio;

use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::info;

use crate::config::WorkerConfig;
use crate::{AppError, Result};

/// Stdio handles of a running worker.
///
/// Dropping `stdin` closes the worker's input, which is how the bridge asks
/// it to exit. `child` must stay alive until then or the process is killed.
#[derive(Debug)]
pub struct WorkerProcess {
    /// Child process handle.
    pub child: Child,
    /// The worker's stdin; frames towards the worker.
    pub stdin: ChildStdin,
    /// The worker's stdout; frames from the worker.
    pub stdout: ChildStdout,
}

/// Build the command line for `config` without spawning it.
#[must_use]
pub fn worker_command(config: &WorkerConfig) -> Command {
    let mut cmd = Command::new(&config.command);
    cmd.args(&config.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    cmd
}

/// Spawn the worker described by `config`.
///
/// # Errors
///
/// - `AppError::Worker("failed to spawn worker: …")` on OS spawn failure,
///   e.g. the executable is not on `PATH`.
/// - `AppError::Worker("failed to capture worker …")` if a pipe is missing.
pub fn spawn_worker(config: &WorkerConfig) -> Result<WorkerProcess> {
    let mut child = worker_command(config).spawn().map_err(|err| {
        AppError::Worker(format!("failed to spawn worker `{}`: {err}", config.command))
    })?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| AppError::Worker("failed to capture worker stdin".into()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::Worker("failed to capture worker stdout".into()))?;

    info!(
        command = config.command.as_str(),
        args = ?config.args,
        pid = ?child.id(),
        "worker spawned"
    );

    Ok(WorkerProcess {
        child,
        stdin,
        stdout,
    })
}
