#![forbid(unsafe_code)]

//! `droid-acp` binary.
//!
//! Spawns the droid worker, wires the bridge between this process's stdio
//! (the editor) and the worker's stdio, and exits with the worker's verdict.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use tokio::task::JoinError;

use droid_acp::bridge::{run_bridge, BridgeExit, BridgeStreams};
use droid_acp::config::PendingPolicy;
use droid_acp::worker::spawner::{spawn_worker, WorkerProcess};
use droid_acp::{AppError, BridgeConfig, Result};

/// How long the bridge may keep relaying after the worker has exited.
const WORKER_EXIT_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "droid-acp",
    about = "Bridge between ACP editors and the droid coding assistant",
    disable_version_flag = true,
    long_about = None
)]
struct Cli {
    /// Print the version and exit.
    #[arg(short = 'v', long)]
    version: bool,

    /// Path to an optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json). Logs always go to stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// What to do with a second `session/prompt` while one is pending.
    #[arg(long, value_enum)]
    prompt_policy: Option<PendingPolicy>,
}

fn main() -> ExitCode {
    let args = Cli::parse();
    if args.version {
        println!("v.{}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    if let Err(err) = init_tracing(args.log_format) {
        eprintln!("droid-acp: {err}");
        return ExitCode::FAILURE;
    }

    match start(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "droid-acp terminated");
            ExitCode::FAILURE
        }
    }
}

fn start(args: Cli) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?;
    let outcome = runtime.block_on(run(args));
    // The editor stdin read may still be parked on a blocking thread.
    runtime.shutdown_background();
    outcome
}

fn load_config(args: &Cli) -> Result<BridgeConfig> {
    let mut config = match &args.config {
        Some(path) => BridgeConfig::load_from_path(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(policy) = args.prompt_policy {
        config.correlation.prompt_policy = policy;
    }
    Ok(config)
}

async fn run(args: Cli) -> Result<()> {
    let config = load_config(&args)?;
    info!(version = env!("CARGO_PKG_VERSION"), "droid-acp starting");

    let WorkerProcess {
        mut child,
        stdin,
        stdout,
    } = spawn_worker(&config.worker)?;

    let cancel = CancellationToken::new();
    let streams = BridgeStreams {
        editor_in: tokio::io::stdin(),
        editor_out: tokio::io::stdout(),
        worker_in: stdin,
        worker_out: stdout,
    };
    let bridge_cancel = cancel.clone();
    let mut bridge = tokio::spawn(async move { run_bridge(&config, streams, bridge_cancel).await });

    let status = tokio::select! {
        joined = &mut bridge => {
            log_bridge_end(joined);
            child.wait().await
        }
        status = child.wait() => {
            info!("worker exited; letting the bridge relay its last frames");
            match tokio::time::timeout(WORKER_EXIT_GRACE, &mut bridge).await {
                Ok(joined) => log_bridge_end(joined),
                Err(_) => {
                    warn!("bridge still running after worker exit; cancelling");
                    cancel.cancel();
                    log_bridge_end(bridge.await);
                }
            }
            status
        }
    };

    let status =
        status.map_err(|err| AppError::Worker(format!("failed to wait for worker: {err}")))?;
    if status.success() {
        info!("worker exited cleanly");
        Ok(())
    } else {
        Err(AppError::Worker(format!("worker exited with {status}")))
    }
}

fn log_bridge_end(joined: std::result::Result<Result<BridgeExit>, JoinError>) {
    match joined {
        Ok(Ok(exit)) => info!(side = %exit.side, end = ?exit.end, "bridge stopped"),
        Ok(Err(err)) => warn!(%err, "bridge stopped with error"),
        Err(err) => warn!(%err, "bridge task panicked"),
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
