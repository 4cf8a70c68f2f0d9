// src/transport/mod.rs

//! Network plumbing between the watcher and the supervisor.
//!
//! The trigger protocol is a single UDP datagram with an ignored payload.

pub mod notifier;
pub mod udp;

pub use notifier::{notify_remote, resolve_remote_addr};
pub use udp::UdpTrigger;
