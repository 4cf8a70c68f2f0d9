// src/engine/run.rs

//! The run workflow: replace the current instance with the latest build.
//!
//! One run cycle is a single transition performed under one lock on the
//! [`CurrentInstance`] slot:
//!
//! ```text
//! observe occupant -> kill it -> clear slot -> promote artifact -> spawn -> install
//! ```
//!
//! Holding the lock for the whole sequence means no other cycle (and no
//! shutdown) can see an empty slot while a replacement is being started.

use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

use crate::errors::{Result, TbuildError};
use crate::exec::{ChildProcess, CommandSpec, OutputSink, ProcessBackend};
use crate::fs::FileSystem;

/// Component name app output is logged under.
pub const APP_COMPONENT: &str = "app";

/// The single slot shared between the run loop and shutdown.
pub type SharedInstance = Arc<AsyncMutex<CurrentInstance>>;

/// The most recently started long-running process, if any.
#[derive(Debug, Default)]
pub struct CurrentInstance {
    occupant: Option<Box<dyn ChildProcess>>,
}

impl CurrentInstance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedInstance {
        Arc::new(AsyncMutex::new(Self::new()))
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn pid(&self) -> Option<u32> {
        self.occupant.as_ref().and_then(|p| p.pid())
    }

    /// Remove the occupant without touching the process.
    pub fn take(&mut self) -> Option<Box<dyn ChildProcess>> {
        self.occupant.take()
    }

    /// Track `process` as current. Refuses (handing it back) when occupied.
    pub fn install(
        &mut self,
        process: Box<dyn ChildProcess>,
    ) -> std::result::Result<(), Box<dyn ChildProcess>> {
        if self.occupant.is_some() {
            return Err(process);
        }
        self.occupant = Some(process);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Replacing,
    Starting,
}

/// Result of one run cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// New instance installed as current.
    Started { pid: Option<u32> },
    /// The previous instance could not be terminated; it stays current.
    ReplaceFailed,
    /// Artifact could not be moved into place; the slot is left empty.
    PromotionFailed,
    /// Stable binary could not be started; the slot is left empty.
    SpawnFailed,
}

#[derive(Debug)]
pub struct RunStage {
    artifact: PathBuf,
    stable: PathBuf,
    command: CommandSpec,
    backend: Arc<dyn ProcessBackend>,
    fs: Arc<dyn FileSystem>,
    sink: OutputSink,
    current: SharedInstance,
    state: Mutex<RunState>,
}

impl RunStage {
    pub fn new(
        artifact: impl Into<PathBuf>,
        stable: impl Into<PathBuf>,
        run_args: Vec<String>,
        backend: Arc<dyn ProcessBackend>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        let stable = stable.into();
        let program = executable_path(&stable).display().to_string();
        Self {
            artifact: artifact.into(),
            command: CommandSpec::new(program, run_args),
            stable,
            backend,
            fs,
            sink: OutputSink::new(APP_COMPONENT),
            current: CurrentInstance::shared(),
            state: Mutex::new(RunState::Idle),
        }
    }

    /// Replace the output sink (e.g. to tap app output in tests).
    pub fn with_sink(mut self, sink: OutputSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn command(&self) -> &CommandSpec {
        &self.command
    }

    pub fn current(&self) -> SharedInstance {
        Arc::clone(&self.current)
    }

    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn set_state(&self, state: RunState) {
        *self.state.lock().unwrap_or_else(|p| p.into_inner()) = state;
        debug!(?state, "run stage state");
    }

    /// Execute one kill -> promote -> spawn transition.
    pub async fn run_cycle(&self) -> RunOutcome {
        let mut slot = self.current.lock().await;
        let outcome = self.replace(&mut slot).await;
        self.set_state(RunState::Idle);
        outcome
    }

    async fn replace(&self, slot: &mut CurrentInstance) -> RunOutcome {
        self.set_state(RunState::Replacing);

        if let Some(mut previous) = slot.take() {
            info!(pid = previous.pid(), "killing previous instance");
            if let Err(err) = previous.kill().await {
                error!(pid = previous.pid(), error = %err, "unable to kill previous instance; keeping it");
                // Slot was just emptied, so this cannot be refused.
                let _ = slot.install(previous);
                return RunOutcome::ReplaceFailed;
            }
        }

        if let Err(err) = self.promote() {
            error!(error = %err, "promotion failed; run cycle aborted");
            return RunOutcome::PromotionFailed;
        }

        self.set_state(RunState::Starting);
        info!(cmd = %self.command, "kicking off run");

        match self.backend.spawn(&self.command, self.sink.clone()) {
            Ok(process) => {
                let pid = process.pid();
                if slot.install(process).is_err() {
                    warn!(pid, "slot unexpectedly occupied; new instance dropped");
                    return RunOutcome::SpawnFailed;
                }
                info!(pid, "instance started");
                RunOutcome::Started { pid }
            }
            Err(err) => {
                error!(error = %err, "unable to start instance");
                RunOutcome::SpawnFailed
            }
        }
    }

    fn promote(&self) -> Result<()> {
        self.fs
            .rename(&self.artifact, &self.stable)
            .map_err(|e| TbuildError::Promotion {
                from: self.artifact.clone(),
                to: self.stable.clone(),
                reason: format!("{e:#}"),
            })
    }

    /// Kill and clear the current instance, if any. Used on shutdown.
    pub async fn terminate_current(&self) {
        let mut slot = self.current.lock().await;
        if let Some(mut process) = slot.take() {
            info!(pid = process.pid(), "stopping current instance");
            if let Err(err) = process.kill().await {
                warn!(pid = process.pid(), error = %err, "failed to kill current instance");
            }
        }
    }
}

/// Relative paths are run from the working directory, never looked up on PATH.
pub fn executable_path(stable: &Path) -> PathBuf {
    match stable.components().next() {
        _ if stable.is_absolute() => stable.to_path_buf(),
        Some(Component::CurDir) | Some(Component::ParentDir) => stable.to_path_buf(),
        _ => Path::new(".").join(stable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_stable_path_is_run_from_cwd() {
        assert_eq!(
            executable_path(Path::new("tbuild-bin")),
            PathBuf::from("./tbuild-bin")
        );
        assert_eq!(
            executable_path(Path::new("./tbuild-bin")),
            PathBuf::from("./tbuild-bin")
        );
        assert_eq!(
            executable_path(Path::new("/opt/app/bin")),
            PathBuf::from("/opt/app/bin")
        );
    }
}
