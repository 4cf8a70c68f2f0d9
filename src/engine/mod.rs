// src/engine/mod.rs

//! Build/run orchestration engine for tbuild.
//!
//! This module ties together:
//! - the depth-1 coalescing trigger queue ([`queue`]) and its async wrapper
//!   ([`signal`])
//! - the build workflow ([`build`])
//! - the run workflow and the single current-instance slot ([`run`])
//! - the two control loops and the shutdown path ([`supervisor`])
//!
//! Signal flow:
//!
//! ```text
//! trigger -> build signal -> BuildStage -> (success) -> run signal -> RunStage
//! ```

pub mod build;
pub mod queue;
pub mod run;
pub mod shutdown;
pub mod signal;
pub mod supervisor;

pub use build::{BuildOutcome, BuildStage, BuildState};
pub use queue::{CoalescingQueue, RequestOutcome};
pub use run::{CurrentInstance, RunOutcome, RunStage, RunState, SharedInstance};
pub use shutdown::{shutdown_channel, Shutdown, ShutdownTrigger};
pub use signal::{Cycle, Signal};
pub use supervisor::{RunningSupervisor, Supervisor, SupervisorHandle, SupervisorSettings};
