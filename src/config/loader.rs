// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{Config, RawConfigFile};
use crate::errors::{Result, TbuildError};

/// CLI values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen: Option<String>,
    /// Replaces the whole build command when non-empty.
    pub build: Vec<String>,
}

impl Overrides {
    fn apply(self, raw: &mut RawConfigFile) {
        if let Some(listen) = self.listen {
            raw.listen = listen;
        }
        if !self.build.is_empty() {
            raw.build = self.build;
        }
    }
}

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        TbuildError::Config(format!("reading config file {}: {e}", path.display()))
    })?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load configuration, apply CLI overrides and validate the result.
///
/// - `Some(path)`: the file must exist.
/// - `None`: [`default_config_path`] is read if present, otherwise built-in
///   defaults are used.
pub fn load_and_validate(path: Option<&Path>, overrides: Overrides) -> Result<Config> {
    let mut raw = match path {
        Some(path) => load_from_path(path)?,
        None => {
            let default_path = default_config_path();
            if default_path.is_file() {
                load_from_path(&default_path)?
            } else {
                RawConfigFile::default()
            }
        }
    };

    overrides.apply(&mut raw);
    Config::try_from(raw)
}

/// `tbuild.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("tbuild.toml")
}
