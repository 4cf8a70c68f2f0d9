// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually starting the build and run
//! commands, using `tokio::process::Command`, and forwarding their output
//! line by line into the log.
//!
//! - [`command`] holds `CommandSpec` (what to run) and `OutputSink` (where
//!   output lines go).
//! - [`process`] owns `ManagedProcess`, a spawned child plus its two stream
//!   reader tasks.
//! - [`backend`] provides the `ProcessBackend` / `ChildProcess` traits and a
//!   concrete `RealProcessBackend` that the stages use in production, and
//!   which tests can replace with a fake implementation.

pub mod backend;
pub mod command;
pub mod process;

pub use backend::{BoxFuture, ChildProcess, ProcessBackend, RealProcessBackend};
pub use command::{CommandSpec, OutputLine, OutputSink};
pub use process::ManagedProcess;
