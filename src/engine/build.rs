// src/engine/build.rs

//! The build workflow: run the build command once and report how it went.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::errors::TbuildError;
use crate::exec::{CommandSpec, OutputSink, ProcessBackend};
use crate::types::{ProcessStatus, OUTPUT_FLAG};

use super::shutdown::Shutdown;

/// Component name build output is logged under.
pub const BUILDER_COMPONENT: &str = "builder";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    Building,
}

/// Result of one build cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Exit code 0; the artifact is ready for promotion.
    Succeeded,
    /// Non-zero exit (or -1 for abnormal termination).
    Failed(i32),
    /// The build command could not be started.
    SpawnFailed,
    /// Shutdown arrived mid-build and the build was killed.
    Cancelled,
}

/// Runs `build ++ ["-o", artifact]`.
///
/// The stage has no retry logic: a failed build stays failed until the next
/// trigger arrives from outside.
#[derive(Debug)]
pub struct BuildStage {
    command: CommandSpec,
    backend: Arc<dyn ProcessBackend>,
    sink: OutputSink,
    building: AtomicBool,
}

impl BuildStage {
    pub fn new(build: &CommandSpec, artifact: &Path, backend: Arc<dyn ProcessBackend>) -> Self {
        let command = build.with_args([OUTPUT_FLAG.to_string(), artifact.display().to_string()]);
        Self {
            command,
            backend,
            sink: OutputSink::new(BUILDER_COMPONENT),
            building: AtomicBool::new(false),
        }
    }

    /// Replace the output sink (e.g. to tap build output in tests).
    pub fn with_sink(mut self, sink: OutputSink) -> Self {
        self.sink = sink;
        self
    }

    /// The full command line, including the output flag.
    pub fn command(&self) -> &CommandSpec {
        &self.command
    }

    pub fn state(&self) -> BuildState {
        if self.building.load(Ordering::SeqCst) {
            BuildState::Building
        } else {
            BuildState::Idle
        }
    }

    /// Execute one build. Never returns an error: every failure is logged and
    /// folded into the outcome.
    pub async fn run_cycle(&self, shutdown: &Shutdown) -> BuildOutcome {
        self.building.store(true, Ordering::SeqCst);
        let outcome = self.build_once(shutdown).await;
        self.building.store(false, Ordering::SeqCst);
        outcome
    }

    async fn build_once(&self, shutdown: &Shutdown) -> BuildOutcome {
        info!(cmd = %self.command, "kicking off build");

        let mut child = match self.backend.spawn(&self.command, self.sink.clone()) {
            Ok(child) => child,
            Err(err) => {
                error!(error = %err, "unable to start build");
                return BuildOutcome::SpawnFailed;
            }
        };

        tokio::select! {
            status = child.wait() => match status {
                Ok(status) if status.success() => {
                    info!(pid = child.pid(), "build succeeded");
                    BuildOutcome::Succeeded
                }
                Ok(status) => {
                    let code = match status {
                        ProcessStatus::Exited(code) => code,
                        _ => -1,
                    };
                    error!(error = %TbuildError::BuildFailed { code }, "build failed");
                    BuildOutcome::Failed(code)
                }
                Err(err) => {
                    error!(error = %err, "waiting for build failed");
                    BuildOutcome::Failed(-1)
                }
            },

            _ = shutdown.wait() => {
                warn!(pid = child.pid(), "shutdown requested during build; killing build");
                if let Err(err) = child.kill().await {
                    warn!(error = %err, "failed to kill build process");
                }
                BuildOutcome::Cancelled
            }
        }
    }
}
