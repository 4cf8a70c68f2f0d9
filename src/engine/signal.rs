// src/engine/signal.rs

//! Async wrapper around [`CoalescingQueue`].
//!
//! Senders never block: `request` updates the queue under a short lock and
//! wakes the single consumer. The consumer (a stage's control loop) calls
//! `recv`, which returns a [`Cycle`] guard; dropping the guard marks the
//! cycle finished so a pending follow-up can start.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;
use tracing::debug;

use super::queue::{CoalescingQueue, RequestOutcome};

#[derive(Debug)]
pub struct Signal {
    name: &'static str,
    queue: Mutex<CoalescingQueue>,
    notify: Notify,
}

impl Signal {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            queue: Mutex::new(CoalescingQueue::new()),
            notify: Notify::new(),
        }
    }

    pub fn request(&self) -> RequestOutcome {
        let outcome = self.lock().request();
        debug!(signal = self.name, ?outcome, "signal requested");

        if matches!(outcome, RequestOutcome::Scheduled | RequestOutcome::Queued) {
            self.notify.notify_one();
        }
        outcome
    }

    /// Wait until a cycle may start. Returns `None` once the signal is closed.
    pub async fn recv(&self) -> Option<Cycle<'_>> {
        loop {
            let notified = self.notify.notified();
            {
                let mut queue = self.lock();
                if queue.is_closed() {
                    return None;
                }
                if queue.begin() {
                    return Some(Cycle { signal: self });
                }
            }
            notified.await;
        }
    }

    /// Stop accepting triggers and wake the consumer so it can exit.
    pub fn close(&self) {
        self.lock().close();
        self.notify.notify_waiters();
        self.notify.notify_one();
    }

    pub fn is_in_flight(&self) -> bool {
        self.lock().is_in_flight()
    }

    pub fn is_pending(&self) -> bool {
        self.lock().is_pending()
    }

    fn lock(&self) -> MutexGuard<'_, CoalescingQueue> {
        self.queue.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// A running cycle. Dropping it marks the cycle finished.
#[derive(Debug)]
pub struct Cycle<'a> {
    signal: &'a Signal,
}

impl Drop for Cycle<'_> {
    fn drop(&mut self) {
        self.signal.lock().finish();
        // A trigger that arrived mid-cycle is waiting on `begin`.
        self.signal.notify.notify_one();
    }
}
