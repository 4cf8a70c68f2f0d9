// src/engine/queue.rs

use tracing::debug;

/// What happened to a trigger handed to [`CoalescingQueue::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Nothing was running; a cycle will start.
    Scheduled,
    /// A cycle is running; exactly one follow-up cycle is now pending.
    Queued,
    /// A follow-up was already pending; this trigger adds nothing.
    Coalesced,
    /// The queue is closed (shutdown in progress).
    Rejected,
}

/// Depth-1 trigger queue: one in-flight flag and one pending flag.
///
/// Semantics:
/// - Any number of triggers arriving while a cycle runs collapse into a single
///   pending follow-up, so a burst of N triggers yields at most two cycles
///   (the one in flight plus one more).
/// - Once closed, the queue rejects triggers and drops what was pending.
///
/// This type is synchronous and does no IO; [`super::signal::Signal`] wraps it
/// with async wake-ups.
#[derive(Debug, Default)]
pub struct CoalescingQueue {
    pending: bool,
    in_flight: bool,
    closed: bool,
}

impl CoalescingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Record a trigger.
    pub fn request(&mut self) -> RequestOutcome {
        if self.closed {
            return RequestOutcome::Rejected;
        }
        if self.pending {
            return RequestOutcome::Coalesced;
        }

        self.pending = true;
        if self.in_flight {
            RequestOutcome::Queued
        } else {
            RequestOutcome::Scheduled
        }
    }

    /// Consume the pending trigger and mark a cycle as running.
    ///
    /// Returns false when there is nothing to start, when a cycle is already
    /// running, or when the queue is closed.
    pub fn begin(&mut self) -> bool {
        if self.closed || self.in_flight || !self.pending {
            return false;
        }
        self.pending = false;
        self.in_flight = true;
        true
    }

    /// Mark the running cycle as done.
    pub fn finish(&mut self) {
        self.in_flight = false;
    }

    pub fn close(&mut self) {
        if self.pending {
            debug!("dropping pending trigger on close");
        }
        self.closed = true;
        self.pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_trigger_is_scheduled() {
        let mut q = CoalescingQueue::new();
        assert_eq!(q.request(), RequestOutcome::Scheduled);
        assert!(q.begin());
        assert!(q.is_in_flight());
        assert!(!q.is_pending());
    }

    #[test]
    fn burst_during_cycle_leaves_one_follow_up() {
        let mut q = CoalescingQueue::new();
        q.request();
        assert!(q.begin());

        assert_eq!(q.request(), RequestOutcome::Queued);
        for _ in 0..10 {
            assert_eq!(q.request(), RequestOutcome::Coalesced);
        }

        // Cannot start a second cycle while one runs.
        assert!(!q.begin());

        q.finish();
        assert!(q.begin());
        q.finish();
        assert!(!q.begin(), "burst must not produce a third cycle");
    }

    #[test]
    fn triggers_before_start_coalesce() {
        let mut q = CoalescingQueue::new();
        assert_eq!(q.request(), RequestOutcome::Scheduled);
        assert_eq!(q.request(), RequestOutcome::Coalesced);
        assert!(q.begin());
        q.finish();
        assert!(!q.begin());
    }

    #[test]
    fn closed_queue_rejects_and_drops_pending() {
        let mut q = CoalescingQueue::new();
        q.request();
        q.close();
        assert!(!q.is_pending());
        assert_eq!(q.request(), RequestOutcome::Rejected);
        assert!(!q.begin());
    }
}
