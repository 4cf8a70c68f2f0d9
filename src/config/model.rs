// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{
    DEFAULT_ARTIFACT_PATH, DEFAULT_BUILD, DEFAULT_MAX_DATAGRAM, DEFAULT_PORT, DEFAULT_READER_DRAIN,
    DEFAULT_STABLE_PATH,
};

/// Configuration as read from a TOML file.
///
/// ```toml
/// listen = ":7373"
/// build = ["cargo", "build", "--release"]
/// artifact_path = ".built"
/// stable_path = "tbuild-bin"
/// max_datagram = 2048
/// ```
///
/// Every field is optional; an empty file is a valid config.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// Trigger listen address; host or port may be left empty.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Build tool invocation: program followed by its arguments.
    #[serde(default = "default_build")]
    pub build: Vec<String>,

    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,

    #[serde(default = "default_stable_path")]
    pub stable_path: PathBuf,

    /// Receive buffer size for trigger datagrams.
    #[serde(default = "default_max_datagram")]
    pub max_datagram: usize,

    /// Milliseconds to let output readers drain after a child exits.
    #[serde(default = "default_reader_drain_ms")]
    pub reader_drain_ms: u64,
}

fn default_listen() -> String {
    format!(":{DEFAULT_PORT}")
}

fn default_build() -> Vec<String> {
    DEFAULT_BUILD.iter().map(|s| s.to_string()).collect()
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACT_PATH)
}

fn default_stable_path() -> PathBuf {
    PathBuf::from(DEFAULT_STABLE_PATH)
}

fn default_max_datagram() -> usize {
    DEFAULT_MAX_DATAGRAM
}

fn default_reader_drain_ms() -> u64 {
    DEFAULT_READER_DRAIN.as_millis() as u64
}

impl Default for RawConfigFile {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            build: default_build(),
            artifact_path: default_artifact_path(),
            stable_path: default_stable_path(),
            max_datagram: default_max_datagram(),
            reader_drain_ms: default_reader_drain_ms(),
        }
    }
}

/// Validated configuration. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Fully resolved `host:port`.
    pub listen: String,
    /// Build command without the output flag; never empty.
    pub build: Vec<String>,
    pub artifact_path: PathBuf,
    pub stable_path: PathBuf,
    pub max_datagram: usize,
    pub reader_drain: Duration,
}

impl Config {
    /// Construct without validation. Prefer `Config::try_from(RawConfigFile)`.
    pub(crate) fn new_unchecked(raw: RawConfigFile, listen: String) -> Self {
        Self {
            listen,
            build: raw.build,
            artifact_path: raw.artifact_path,
            stable_path: raw.stable_path,
            max_datagram: raw.max_datagram,
            reader_drain: Duration::from_millis(raw.reader_drain_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let listen = format!("0.0.0.0:{DEFAULT_PORT}");
        Self::new_unchecked(RawConfigFile::default(), listen)
    }
}
