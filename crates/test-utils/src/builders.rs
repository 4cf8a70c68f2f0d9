#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tbuild::engine::{BuildStage, RunStage, Supervisor, SupervisorSettings};
use tbuild::exec::{CommandSpec, OutputSink, ProcessBackend};
use tbuild::fs::FileSystem;

/// Builder for `SupervisorSettings` to simplify test setup.
///
/// Defaults: build `go build`, artifact `/work/.built`, stable
/// `/work/tbuild-bin`, no run args.
pub struct SettingsBuilder {
    settings: SupervisorSettings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: SupervisorSettings {
                build: CommandSpec::new("go", ["build"]),
                artifact_path: PathBuf::from("/work/.built"),
                stable_path: PathBuf::from("/work/tbuild-bin"),
                run_args: Vec::new(),
            },
        }
    }

    pub fn build_command(mut self, program: &str, args: &[&str]) -> Self {
        self.settings.build = CommandSpec::new(program, args.iter().copied());
        self
    }

    pub fn in_dir(mut self, dir: &Path) -> Self {
        self.settings.artifact_path = dir.join(".built");
        self.settings.stable_path = dir.join("tbuild-bin");
        self
    }

    pub fn run_arg(mut self, arg: &str) -> Self {
        self.settings.run_args.push(arg.to_string());
        self
    }

    pub fn build(self) -> SupervisorSettings {
        self.settings
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble a supervisor whose build and app output are copied into `tap`.
pub fn tapped_supervisor(
    settings: SupervisorSettings,
    backend: Arc<dyn ProcessBackend>,
    fs: Arc<dyn FileSystem>,
    tap: OutputSink,
) -> Supervisor {
    let build = BuildStage::new(&settings.build, &settings.artifact_path, Arc::clone(&backend))
        .with_sink(tap.clone());
    let run = RunStage::new(
        settings.artifact_path,
        settings.stable_path,
        settings.run_args,
        backend,
        fs,
    )
    .with_sink(tap);
    Supervisor::from_stages(build, run)
}
