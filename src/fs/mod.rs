// src/fs/mod.rs

//! Filesystem seam used by the run stage.
//!
//! The only mutation the supervisor performs is promotion: moving a freshly
//! built artifact over the stable executable path. On the real filesystem
//! that is a single `rename(2)`, so a concurrent reader of the stable path
//! observes either the previous file or the complete new one.

use std::fmt::Debug;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

pub mod mock;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    /// Atomically replace `to` with `from`. `from` no longer exists afterwards.
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).with_context(|| format!("renaming {:?} to {:?}", from, to))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("reading file {:?}", path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
            }
        }
        fs::write(path, contents).with_context(|| format!("writing to file {:?}", path))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_replaces_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFileSystem;
        let artifact = dir.path().join(".built");
        let stable = dir.path().join("tbuild-bin");

        fs.write(&stable, b"old").unwrap();
        fs.write(&artifact, b"new").unwrap();
        fs.rename(&artifact, &stable).unwrap();

        assert!(!fs.exists(&artifact));
        assert_eq!(fs.read(&stable).unwrap(), b"new");
    }

    #[test]
    fn rename_of_missing_file_fails_and_keeps_target() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFileSystem;
        let stable = dir.path().join("tbuild-bin");
        fs.write(&stable, b"old").unwrap();

        let err = fs.rename(&dir.path().join(".built"), &stable).unwrap_err();
        assert!(format!("{err:#}").contains("renaming"));
        assert_eq!(fs.read(&stable).unwrap(), b"old");
    }
}
