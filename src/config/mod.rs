// src/config/mod.rs

//! Configuration loading and validation for tbuild.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and apply CLI overrides (`loader.rs`).
//! - Validate and resolve it into a ready-to-use [`Config`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, Overrides};
pub use model::{Config, RawConfigFile};
pub use validate::resolve_listen_addr;
