// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Only startup errors (bad config, cannot bind the trigger listener) ever
//! reach `main`. Everything that goes wrong inside a build or run cycle is
//! logged and terminates that cycle only.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TbuildError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error on {addr}: {source}")]
    Transport {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to spawn `{cmd}`: {source}")]
    Spawn {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Build exited with code {code}")]
    BuildFailed { code: i32 },

    #[error("Unable to move {from:?} to {to:?}: {reason}")]
    Promotion {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TbuildError>;
