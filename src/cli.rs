// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Two binaries share this module: `tbuild` (the supervisor) parses
//! [`CliArgs`] and `twatch` (the file watcher) parses [`WatchArgs`].

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::DEFAULT_DEBOUNCE;

/// Command-line arguments for `tbuild`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tbuild",
    version,
    about = "Rebuild and restart a program whenever a trigger datagram arrives.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `tbuild.toml` in the current working directory. A missing
    /// default file is fine; a missing explicit file is an error.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Address to listen for trigger datagrams on (`host:port`).
    ///
    /// Either side may be empty, e.g. `:7373` or `127.0.0.1:`.
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<String>,

    /// Build command; repeat for each argument (`--build go --build build`).
    ///
    /// Replaces the configured build command entirely.
    #[arg(long = "build", value_name = "ARG")]
    pub build: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TBUILD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Arguments forwarded verbatim to the built program.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "APP_ARGS")]
    pub app_args: Vec<String>,
}

/// Command-line arguments for `twatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "twatch",
    version,
    about = "Notify a tbuild supervisor when source files change.",
    long_about = None
)]
pub struct WatchArgs {
    /// Address of the supervisor to notify. The default port is used when
    /// no `:port` is given.
    #[arg(long, value_name = "ADDR")]
    pub remote: String,

    /// File extension to watch, without the dot.
    #[arg(long, value_name = "EXT", default_value = "go")]
    pub ext: String,

    /// Directory to watch.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Watch subdirectories too.
    #[arg(long)]
    pub recursive: bool,

    /// Quiet period in milliseconds before a notification is sent.
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_DEBOUNCE.as_millis() as u64)]
    pub delay_ms: u64,

    /// Logging level (error, warn, info, debug, trace).
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

/// Convenience wrapper around `WatchArgs::parse()`.
pub fn parse_watch() -> WatchArgs {
    WatchArgs::parse()
}
