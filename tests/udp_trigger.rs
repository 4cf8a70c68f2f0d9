// tests/udp_trigger.rs

mod common;
use crate::common::builders::SettingsBuilder;
use crate::common::{init_tracing, wait_until, with_timeout, FakeBackend, FakeScript, BUILD};

use std::sync::Arc;
use std::time::Duration;

use tbuild::engine::{RunningSupervisor, Supervisor};
use tbuild::errors::TbuildError;
use tbuild::fs::mock::MockFileSystem;
use tbuild::transport::{notify_remote, UdpTrigger};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

async fn listening(max_datagram: usize) -> (FakeBackend, RunningSupervisor, String, JoinHandle<()>) {
    let backend = FakeBackend::new();
    backend.script(BUILD, FakeScript::exits(1));
    let supervisor = Supervisor::new(
        SettingsBuilder::new().build(),
        Arc::new(backend.clone()),
        Arc::new(MockFileSystem::new()),
    );
    let handle = supervisor.handle();

    let trigger = UdpTrigger::bind("127.0.0.1:0", max_datagram).await.unwrap();
    let addr = trigger.local_addr().to_string();

    let running = supervisor.start();
    let listener = tokio::spawn(trigger.serve(handle.clone(), handle.shutdown_listener()));
    (backend, running, addr, listener)
}

async fn send(addr: &str, payload: &[u8]) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket.send_to(payload, addr).await.unwrap();
}

#[tokio::test]
async fn each_datagram_requests_a_build() {
    init_tracing();
    let (backend, running, addr, listener) = listening(2048).await;

    send(&addr, b"build").await;
    wait_until("first build", || backend.spawn_count(BUILD) == 1).await;

    // Payload content is irrelevant.
    send(&addr, b"").await;
    wait_until("second build", || backend.spawn_count(BUILD) == 2).await;

    notify_remote(&addr).await.unwrap();
    wait_until("third build", || backend.spawn_count(BUILD) == 3).await;

    with_timeout(running.shutdown()).await.unwrap();
    with_timeout(listener).await.unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn oversized_datagram_counts_once() {
    init_tracing();
    let (backend, running, addr, listener) = listening(16).await;

    send(&addr, &[b'x'; 1000]).await;
    wait_until("build", || backend.spawn_count(BUILD) == 1).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(backend.spawn_count(BUILD), 1);

    with_timeout(running.shutdown()).await.unwrap();
    with_timeout(listener).await.unwrap();
}

#[tokio::test]
async fn busy_port_is_a_transport_error() {
    init_tracing();
    let holder = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = holder.local_addr().unwrap().to_string();

    let err = UdpTrigger::bind(&addr, 2048).await.unwrap_err();

    match err {
        TbuildError::Transport { addr: failed, .. } => assert_eq!(failed, addr),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn listener_stops_on_shutdown() {
    init_tracing();
    let (backend, running, _addr, listener) = listening(2048).await;

    running.handle().request_shutdown();

    with_timeout(listener).await.unwrap();
    with_timeout(running.wait()).await.unwrap();
    assert_eq!(backend.spawn_count(BUILD), 0);
}
