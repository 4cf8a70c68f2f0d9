// src/watch/watcher.rs

use std::path::PathBuf;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::watch::debounce::DebounceHandle;
use crate::watch::patterns::{is_write_event, WatchFilter};

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn a filesystem watcher on `root` that pokes `debounce` for every
/// content write to a file accepted by `filter`.
///
/// - `recursive = false` watches only the files directly inside `root`.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    recursive: bool,
    filter: WatchFilter,
    debounce: DebounceHandle,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    debug!("watcher event loop gone; dropping notify event");
                }
            }
            Err(err) => warn!(error = %err, "file watch error"),
        },
        Config::default(),
    )?;

    let mode = if recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    watcher.watch(&root, mode)?;

    info!(root = ?root, recursive, patterns = ?filter.patterns(), "file watcher started");

    let task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            trace!(?event, "received notify event");

            if !is_write_event(&event.kind) {
                continue;
            }

            if let Some(path) = event.paths.iter().find(|p| filter.matches(p)) {
                debug!(path = ?path, "watched file written; restarting debounce timer");
                debounce.poke();
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        task,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::watch::debounce::Debouncer;

    #[tokio::test]
    async fn writes_to_matching_files_fire_once_after_quiet_period() {
        let dir = tempfile::tempdir().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let debouncer = Debouncer::spawn(Duration::from_millis(100), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let filter = WatchFilter::for_extension("go").unwrap();
        let _watcher = spawn_watcher(dir.path(), false, filter, debouncer.handle()).unwrap();

        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        let main = dir.path().join("main.go");
        for i in 0..5 {
            std::fs::write(&main, format!("package main // {i}")).unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        for _ in 0..100 {
            if fired.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
