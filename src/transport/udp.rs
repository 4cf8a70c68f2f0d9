// src/transport/udp.rs

//! UDP trigger ingress: every datagram becomes one build request.

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::engine::{Shutdown, SupervisorHandle};
use crate::errors::{Result, TbuildError};

/// A bound trigger socket.
///
/// Payloads are ignored. The receive buffer is `max_datagram` bytes; a
/// longer datagram is truncated by the socket and still counts as exactly
/// one trigger.
#[derive(Debug)]
pub struct UdpTrigger {
    socket: UdpSocket,
    local_addr: SocketAddr,
    max_datagram: usize,
}

impl UdpTrigger {
    /// Bind the listener. Failure here is fatal to the supervisor.
    pub async fn bind(addr: &str, max_datagram: usize) -> Result<Self> {
        let transport_err = |source| TbuildError::Transport {
            addr: addr.to_string(),
            source,
        };

        let socket = UdpSocket::bind(addr).await.map_err(transport_err)?;
        let local_addr = socket.local_addr().map_err(transport_err)?;

        info!(%local_addr, "listening for udp packets");

        Ok(Self {
            socket,
            local_addr,
            max_datagram: max_datagram.max(1),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Forward datagrams to `handle` until `shutdown` fires.
    ///
    /// Receive errors are logged and skipped.
    pub async fn serve(self, handle: SupervisorHandle, shutdown: Shutdown) {
        let mut buf = vec![0u8; self.max_datagram];

        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, peer)) => {
                        debug!(len, %peer, "received trigger datagram");
                        let outcome = handle.request_build();
                        debug!(?outcome, "build requested");
                    }
                    Err(err) => {
                        warn!(error = %err, "an error occurred receiving a datagram");
                    }
                },
            }
        }

        debug!(local_addr = %self.local_addr, "udp listener stopped");
    }
}
