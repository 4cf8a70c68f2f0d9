// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod os_signals;
pub mod transport;
pub mod types;
pub mod watch;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::{CliArgs, WatchArgs};
use crate::config::{load_and_validate, Overrides};
use crate::engine::{Supervisor, SupervisorSettings};
use crate::exec::RealProcessBackend;
use crate::fs::RealFileSystem;
use crate::os_signals::{wait_for_shutdown_signal, ShutdownSignals};
use crate::transport::{notify_remote, resolve_remote_addr, UdpTrigger};
use crate::watch::{spawn_watcher, Debouncer, WatchFilter};

/// High-level entry point used by `tbuild`'s `main.rs`.
///
/// This wires together:
/// - config loading
/// - the supervisor (build loop + run loop)
/// - the UDP trigger listener
/// - SIGINT/SIGTERM handling
///
/// Returns once a termination signal has been handled and the current
/// instance is gone. Only startup failures are returned as errors.
pub async fn run(args: CliArgs) -> Result<()> {
    let overrides = Overrides {
        listen: args.listen.clone(),
        build: args.build.clone(),
    };
    let cfg = load_and_validate(args.config.as_deref(), overrides)?;
    info!(listen = %cfg.listen, build = ?cfg.build, "configuration loaded");

    let settings = SupervisorSettings::from_config(&cfg, args.app_args)?;
    let backend = Arc::new(RealProcessBackend::new(cfg.reader_drain));
    let supervisor = Supervisor::new(settings, backend, Arc::new(RealFileSystem));
    let handle = supervisor.handle();

    // Bind before starting anything: a busy port is fatal.
    let trigger = UdpTrigger::bind(&cfg.listen, cfg.max_datagram).await?;
    let mut signals = ShutdownSignals::install().context("installing signal handlers")?;

    let running = supervisor.start();
    let listener = tokio::spawn(trigger.serve(handle.clone(), handle.shutdown_listener()));

    // SIGINT / SIGTERM → graceful shutdown.
    {
        let handle = handle.clone();
        tokio::spawn(async move {
            match signals.recv().await {
                Ok(name) => info!(signal = name, "shutting down"),
                Err(e) => warn!(error = %e, "signal listener failed; shutting down"),
            }
            handle.request_shutdown();
        });
    }

    // Build once at startup, before any trigger arrives.
    handle.request_build();

    running.wait().await?;
    if let Err(err) = listener.await {
        warn!(error = %err, "udp listener ended abnormally");
    }
    Ok(())
}

/// High-level entry point used by the `twatch` binary.
///
/// Watches for writes to matching files and, after the debounce delay,
/// notifies the supervisor at `--remote`. Runs until interrupted.
pub async fn run_watch(args: WatchArgs) -> Result<()> {
    let remote = resolve_remote_addr(&args.remote);
    let filter = WatchFilter::for_extension(&args.ext)?;

    let debouncer = {
        let remote = remote.clone();
        Debouncer::spawn(Duration::from_millis(args.delay_ms), move || {
            let remote = remote.clone();
            async move {
                info!(%remote, "notifying");
                if let Err(err) = notify_remote(&remote).await {
                    warn!(%remote, error = %err, "unable to notify remote");
                }
            }
        })
    };

    let _watcher = spawn_watcher(&args.root, args.recursive, filter, debouncer.handle())?;

    let name = wait_for_shutdown_signal().await?;
    info!(signal = name, "watcher stopping");
    Ok(())
}
