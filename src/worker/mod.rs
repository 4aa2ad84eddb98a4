//! Worker side of the bridge.
//!
//! The worker is a child process speaking a typed JSON-RPC envelope over
//! its stdin/stdout.
//!
//! - `types`: envelope, notification, and permission payload shapes.
//! - `spawner`: process launch with piped stdio.
//! - `dispatch`: [`WorkerDispatcher`](dispatch::WorkerDispatcher), the
//!   handler the worker read loop feeds.

pub mod dispatch;
pub mod spawner;
pub mod types;
