// src/watch/mod.rs

//! File watching for the `twatch` binary.
//!
//! This module is responsible for:
//! - Compiling the file-name filter (`*.go` by default).
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Debouncing bursts of writes so a save storm yields one notification.
//!
//! It does **not** know about the supervisor; it only turns filesystem
//! changes into debounced callbacks.

pub mod debounce;
pub mod patterns;
pub mod watcher;

pub use debounce::{DebounceHandle, Debouncer};
pub use patterns::{is_write_event, WatchFilter};
pub use watcher::{spawn_watcher, WatcherHandle};
