// src/watch/patterns.rs

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use notify::event::ModifyKind;
use notify::EventKind;

/// Compiled file-name patterns deciding which changes count.
///
/// Patterns are matched against the file name only (`main.go`), not the
/// full path, so the same filter works for recursive and flat watches.
#[derive(Clone)]
pub struct WatchFilter {
    patterns: Vec<String>,
    set: GlobSet,
}

impl fmt::Debug for WatchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchFilter")
            .field("patterns", &self.patterns)
            .finish()
    }
}

impl WatchFilter {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern)
                .with_context(|| format!("invalid watch pattern {pattern:?}"))?;
            builder.add(glob);
        }
        let set = builder.build().context("building watch pattern set")?;
        Ok(Self {
            patterns: patterns.to_vec(),
            set,
        })
    }

    /// Match every file with the given extension (`"go"` or `".go"`).
    pub fn for_extension(ext: &str) -> Result<Self> {
        let ext = ext.trim().trim_start_matches('.');
        if ext.is_empty() {
            anyhow::bail!("watch extension must not be empty");
        }
        Self::new(&[format!("*.{ext}")])
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| self.set.is_match(Path::new(name)))
            .unwrap_or(false)
    }
}

/// Content writes are the only events that restart the debounce timer.
pub fn is_write_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any)
    )
}

#[cfg(test)]
mod tests {
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};

    use super::*;

    #[test]
    fn extension_filter_matches_file_names() {
        let filter = WatchFilter::for_extension(".go").unwrap();
        assert!(filter.matches(Path::new("main.go")));
        assert!(filter.matches(Path::new("/src/pkg/server.go")));
        assert!(!filter.matches(Path::new("main.go.swp")));
        assert!(!filter.matches(Path::new("README.md")));
        assert!(!filter.matches(Path::new("/")));
    }

    #[test]
    fn empty_extension_is_rejected() {
        assert!(WatchFilter::for_extension(" . ").is_err());
    }

    #[test]
    fn only_data_writes_count() {
        assert!(is_write_event(&EventKind::Modify(ModifyKind::Data(
            DataChange::Content
        ))));
        assert!(is_write_event(&EventKind::Modify(ModifyKind::Any)));
        assert!(!is_write_event(&EventKind::Modify(ModifyKind::Metadata(
            MetadataKind::Permissions
        ))));
        assert!(!is_write_event(&EventKind::Create(CreateKind::File)));
        assert!(!is_write_event(&EventKind::Remove(RemoveKind::File)));
    }
}
