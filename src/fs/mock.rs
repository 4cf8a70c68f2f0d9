// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory filesystem for stage tests.
///
/// Clones share the same file table, so a test can keep one handle to
/// inspect what the run stage did through the other.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
    renames: Arc<Mutex<Vec<(PathBuf, PathBuf)>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.files()
            .insert(path.as_ref().to_path_buf(), content.into());
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) {
        self.files().remove(path.as_ref());
    }

    /// Every successful rename, in order.
    pub fn renames(&self) -> Vec<(PathBuf, PathBuf)> {
        self.renames
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    fn files(&self) -> MutexGuard<'_, HashMap<PathBuf, Vec<u8>>> {
        self.files.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl FileSystem for MockFileSystem {
    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut files = self.files();
        let content = files
            .remove(from)
            .ok_or_else(|| anyhow!("File not found: {:?}", from))?;
        files.insert(to.to_path_buf(), content);
        drop(files);

        self.renames
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((from.to_path_buf(), to.to_path_buf()));
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.files()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("File not found: {:?}", path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files().contains_key(path)
    }
}
