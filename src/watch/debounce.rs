// src/watch/debounce.rs

//! Trailing-edge debounce: fire once after `delay` without new pokes.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

/// Collapses bursts of pokes into a single callback.
///
/// Every poke restarts the timer. When the timer runs out the callback is
/// awaited, then the debouncer goes back to waiting for the next poke.
/// Dropping the debouncer cancels a pending fire.
#[derive(Debug)]
pub struct Debouncer {
    tx: mpsc::UnboundedSender<()>,
    task: JoinHandle<()>,
}

impl Debouncer {
    pub fn spawn<F, Fut>(delay: Duration, mut on_fire: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let task = tokio::spawn(async move {
            'idle: while rx.recv().await.is_some() {
                loop {
                    tokio::select! {
                        poke = rx.recv() => {
                            if poke.is_none() {
                                break 'idle;
                            }
                        }
                        _ = sleep(delay) => {
                            debug!(?delay, "debounce window elapsed");
                            on_fire().await;
                            continue 'idle;
                        }
                    }
                }
            }
            debug!("debouncer stopped");
        });

        Self { tx, task }
    }

    /// Restart the quiet period.
    pub fn poke(&self) {
        let _ = self.tx.send(());
    }

    pub fn handle(&self) -> DebounceHandle {
        DebounceHandle {
            tx: self.tx.clone(),
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Cloneable poke-only handle.
#[derive(Debug, Clone)]
pub struct DebounceHandle {
    tx: mpsc::UnboundedSender<()>,
}

impl DebounceHandle {
    pub fn poke(&self) {
        let _ = self.tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn counting(delay: Duration) -> (Debouncer, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let debouncer = Debouncer::spawn(delay, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (debouncer, fired)
    }

    #[tokio::test]
    async fn burst_fires_once() {
        let (debouncer, fired) = counting(Duration::from_millis(60));

        for _ in 0..10 {
            debouncer.poke();
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0, "still inside the window");

        sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn separated_bursts_fire_separately() {
        let (debouncer, fired) = counting(Duration::from_millis(30));

        debouncer.poke();
        sleep(Duration::from_millis(150)).await;
        debouncer.handle().poke();
        sleep(Duration::from_millis(150)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn no_poke_no_fire() {
        let (_debouncer, fired) = counting(Duration::from_millis(10));
        sleep(Duration::from_millis(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
