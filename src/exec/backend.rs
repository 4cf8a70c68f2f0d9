// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The build and run stages talk to a `ProcessBackend` instead of
//! `tokio::process` directly. This makes it easy to swap in a fake backend in
//! tests (counting spawns, holding builds open, failing on demand) while
//! production uses [`RealProcessBackend`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::errors::Result;
use crate::exec::command::{CommandSpec, OutputSink};
use crate::exec::process::ManagedProcess;
use crate::types::{ProcessStatus, DEFAULT_READER_DRAIN};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Handle to one spawned process, owned by whichever stage spawned it.
pub trait ChildProcess: Send + fmt::Debug {
    fn pid(&self) -> Option<u32>;

    fn status(&self) -> ProcessStatus;

    /// Wait for the process to terminate.
    fn wait(&mut self) -> BoxFuture<'_, Result<ProcessStatus>>;

    /// Terminate the process. Must be a no-op once it has exited or been killed.
    fn kill(&mut self) -> BoxFuture<'_, Result<()>>;
}

/// Trait abstracting how commands are started.
pub trait ProcessBackend: Send + Sync + fmt::Debug {
    /// Start `command`, forwarding its output to `sink`.
    ///
    /// An error means nothing is running.
    fn spawn(&self, command: &CommandSpec, sink: OutputSink) -> Result<Box<dyn ChildProcess>>;
}

/// Real backend used in production: spawns OS processes.
#[derive(Debug, Clone)]
pub struct RealProcessBackend {
    reader_drain: Duration,
}

impl RealProcessBackend {
    pub fn new(reader_drain: Duration) -> Self {
        Self { reader_drain }
    }
}

impl Default for RealProcessBackend {
    fn default() -> Self {
        Self::new(DEFAULT_READER_DRAIN)
    }
}

impl ProcessBackend for RealProcessBackend {
    fn spawn(&self, command: &CommandSpec, sink: OutputSink) -> Result<Box<dyn ChildProcess>> {
        let process = ManagedProcess::spawn(command, sink, self.reader_drain)?;
        Ok(Box::new(process))
    }
}

impl ChildProcess for ManagedProcess {
    fn pid(&self) -> Option<u32> {
        ManagedProcess::pid(self)
    }

    fn status(&self) -> ProcessStatus {
        ManagedProcess::status(self)
    }

    fn wait(&mut self) -> BoxFuture<'_, Result<ProcessStatus>> {
        Box::pin(ManagedProcess::wait(self))
    }

    fn kill(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(ManagedProcess::kill(self))
    }
}
