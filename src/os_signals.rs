// src/os_signals.rs

//! Waiting for SIGINT / SIGTERM (Ctrl-C only on non-unix platforms).

/// Termination signal listeners, registered up front so a failure to
/// install them surfaces at startup.
#[derive(Debug)]
pub struct ShutdownSignals {
    #[cfg(unix)]
    sigint: tokio::signal::unix::Signal,
    #[cfg(unix)]
    sigterm: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    #[cfg(unix)]
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// Resolve with the signal's name once one arrives.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> std::io::Result<&'static str> {
        let name = tokio::select! {
            _ = self.sigint.recv() => "SIGINT",
            _ = self.sigterm.recv() => "SIGTERM",
        };
        Ok(name)
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> std::io::Result<&'static str> {
        tokio::signal::ctrl_c().await?;
        Ok("Ctrl-C")
    }
}

/// Resolve when the process is asked to terminate.
///
/// Returns `Err` if the signal handlers cannot be installed.
pub async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    ShutdownSignals::install()?.recv().await
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn sigterm_is_reported_by_name() {
        let mut signals = ShutdownSignals::install().unwrap();

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        let name = tokio::time::timeout(Duration::from_secs(2), signals.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(name, "SIGTERM");
    }
}
