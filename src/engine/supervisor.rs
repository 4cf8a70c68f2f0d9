// src/engine/supervisor.rs

//! Coordinates the build and run stages.
//!
//! Two control loops run concurrently:
//! - the build loop consumes build-requested signals and drives [`BuildStage`];
//!   each successful build raises exactly one run-requested signal.
//! - the run loop consumes run-requested signals and drives [`RunStage`].
//!
//! Both loops select over the shutdown flag on every iteration. On shutdown
//! the signals are closed, an in-flight build is killed, the current instance
//! is killed, and both loops exit.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::{Result, TbuildError};
use crate::exec::{CommandSpec, ProcessBackend};
use crate::fs::FileSystem;

use super::build::{BuildOutcome, BuildStage};
use super::queue::RequestOutcome;
use super::run::{RunStage, SharedInstance};
use super::shutdown::{shutdown_channel, Shutdown, ShutdownTrigger};
use super::signal::Signal;

/// Everything the supervisor needs to know up front. Immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorSettings {
    pub build: CommandSpec,
    pub artifact_path: PathBuf,
    pub stable_path: PathBuf,
    /// Forwarded verbatim to every run of the built program.
    pub run_args: Vec<String>,
}

impl SupervisorSettings {
    pub fn from_config(cfg: &Config, run_args: Vec<String>) -> Result<Self> {
        let build = CommandSpec::from_argv(&cfg.build)
            .ok_or_else(|| TbuildError::Config("`build` must not be empty".to_string()))?;
        Ok(Self {
            build,
            artifact_path: cfg.artifact_path.clone(),
            stable_path: cfg.stable_path.clone(),
            run_args,
        })
    }
}

/// A configured, not yet started supervisor.
#[derive(Debug)]
pub struct Supervisor {
    build_stage: BuildStage,
    run_stage: RunStage,
    build_signal: Arc<Signal>,
    run_signal: Arc<Signal>,
    trigger: ShutdownTrigger,
    shutdown: Shutdown,
}

impl Supervisor {
    pub fn new(
        settings: SupervisorSettings,
        backend: Arc<dyn ProcessBackend>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        let build_stage = BuildStage::new(
            &settings.build,
            &settings.artifact_path,
            Arc::clone(&backend),
        );
        let run_stage = RunStage::new(
            settings.artifact_path,
            settings.stable_path,
            settings.run_args,
            backend,
            fs,
        );
        Self::from_stages(build_stage, run_stage)
    }

    /// Assemble from pre-built stages (useful to attach output taps).
    pub fn from_stages(build_stage: BuildStage, run_stage: RunStage) -> Self {
        let (trigger, shutdown) = shutdown_channel();
        Self {
            build_stage,
            run_stage,
            build_signal: Arc::new(Signal::new("build")),
            run_signal: Arc::new(Signal::new("run")),
            trigger,
            shutdown,
        }
    }

    pub fn handle(&self) -> SupervisorHandle {
        SupervisorHandle {
            build_signal: Arc::clone(&self.build_signal),
            run_signal: Arc::clone(&self.run_signal),
            trigger: self.trigger.clone(),
        }
    }

    /// Spawn both control loops.
    pub fn start(self) -> RunningSupervisor {
        let handle = self.handle();
        let build_stage = Arc::new(self.build_stage);
        let run_stage = Arc::new(self.run_stage);

        let build_task = tokio::spawn(build_loop(
            build_stage,
            Arc::clone(&self.build_signal),
            Arc::clone(&self.run_signal),
            self.shutdown.clone(),
        ));
        let run_task = tokio::spawn(run_loop(
            Arc::clone(&run_stage),
            Arc::clone(&self.run_signal),
            self.shutdown.clone(),
        ));

        info!("supervisor started");

        RunningSupervisor {
            handle,
            run_stage,
            build_task,
            run_task,
        }
    }
}

/// Cloneable entry point for trigger sources.
///
/// Runs cannot be requested from here; only the build loop raises them,
/// after a successful build.
#[derive(Debug, Clone)]
pub struct SupervisorHandle {
    build_signal: Arc<Signal>,
    run_signal: Arc<Signal>,
    trigger: ShutdownTrigger,
}

impl SupervisorHandle {
    pub fn request_build(&self) -> RequestOutcome {
        self.build_signal.request()
    }

    /// Stop accepting signals and tell both loops to exit.
    pub fn request_shutdown(&self) {
        self.build_signal.close();
        self.run_signal.close();
        self.trigger.trigger();
    }

    pub fn shutdown_listener(&self) -> Shutdown {
        self.trigger.subscribe()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.trigger.subscribe().is_requested()
    }
}

/// A supervisor whose loops are running.
#[derive(Debug)]
pub struct RunningSupervisor {
    handle: SupervisorHandle,
    run_stage: Arc<RunStage>,
    build_task: JoinHandle<()>,
    run_task: JoinHandle<()>,
}

impl RunningSupervisor {
    pub fn handle(&self) -> SupervisorHandle {
        self.handle.clone()
    }

    pub fn run_stage(&self) -> &RunStage {
        &self.run_stage
    }

    pub fn current(&self) -> SharedInstance {
        self.run_stage.current()
    }

    /// True once both control loops have returned.
    pub fn loops_finished(&self) -> bool {
        self.build_task.is_finished() && self.run_task.is_finished()
    }

    /// Wait for both loops to exit, then make sure no instance survives.
    ///
    /// Only returns after shutdown has been requested.
    pub async fn wait(self) -> Result<()> {
        let build = self.build_task.await;
        let run = self.run_task.await;

        // The run loop already did this; repeat in case it panicked.
        self.run_stage.terminate_current().await;

        for (name, res) in [("build", build), ("run", run)] {
            if let Err(err) = res {
                warn!(loop_name = name, error = %err, "control loop ended abnormally");
                return Err(TbuildError::Other(anyhow::anyhow!(
                    "{name} loop ended abnormally: {err}"
                )));
            }
        }

        info!("supervisor stopped");
        Ok(())
    }

    pub async fn shutdown(self) -> Result<()> {
        self.handle.request_shutdown();
        self.wait().await
    }
}

async fn build_loop(
    stage: Arc<BuildStage>,
    build_signal: Arc<Signal>,
    run_signal: Arc<Signal>,
    shutdown: Shutdown,
) {
    debug!("build loop started");
    loop {
        let cycle = tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            cycle = build_signal.recv() => match cycle {
                Some(cycle) => cycle,
                None => break,
            },
        };

        let outcome = stage.run_cycle(&shutdown).await;
        drop(cycle);

        if outcome == BuildOutcome::Succeeded {
            let requested = run_signal.request();
            debug!(?requested, "run requested after successful build");
        }
    }
    debug!("build loop finished");
}

async fn run_loop(stage: Arc<RunStage>, run_signal: Arc<Signal>, shutdown: Shutdown) {
    debug!("run loop started");
    loop {
        let cycle = tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            cycle = run_signal.recv() => match cycle {
                Some(cycle) => cycle,
                None => break,
            },
        };

        let outcome = stage.run_cycle().await;
        debug!(?outcome, "run cycle finished");
        drop(cycle);
    }

    stage.terminate_current().await;
    debug!("run loop finished");
}
