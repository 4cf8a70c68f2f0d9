// src/transport/notifier.rs

//! UDP trigger egress, used by the watcher.

use std::net::SocketAddr;

use tokio::net::{lookup_host, UdpSocket};
use tracing::info;

use crate::errors::{Result, TbuildError};
use crate::types::{DEFAULT_PORT, TRIGGER_PAYLOAD};

/// Append the default port when `remote` names none.
pub fn resolve_remote_addr(remote: &str) -> String {
    let remote = remote.trim();
    if remote.contains(':') {
        remote.to_string()
    } else {
        format!("{remote}:{DEFAULT_PORT}")
    }
}

/// Send one trigger datagram to `remote` (`host:port`).
pub async fn notify_remote(remote: &str) -> Result<()> {
    let transport_err = |source| TbuildError::Transport {
        addr: remote.to_string(),
        source,
    };

    let target: SocketAddr = lookup_host(remote)
        .await
        .map_err(transport_err)?
        .next()
        .ok_or_else(|| {
            transport_err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "address resolved to nothing",
            ))
        })?;

    let bind_addr = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
    let socket = UdpSocket::bind(bind_addr).await.map_err(transport_err)?;
    socket
        .send_to(TRIGGER_PAYLOAD, target)
        .await
        .map_err(transport_err)?;

    info!(%target, "notified");
    Ok(())
}
