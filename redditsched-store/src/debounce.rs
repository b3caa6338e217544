//! Cancellable trailing-edge timer.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// Runs the most recently scheduled action after a quiet period.
///
/// Scheduling replaces any pending action. Dropping the debouncer cancels
/// whatever is still pending.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Creates an idle debouncer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `action` to run after `delay`, cancelling any pending one.
    ///
    /// Outside a Tokio runtime there is nothing to wait on, so the action
    /// runs immediately.
    pub fn schedule<F>(&self, delay: Duration, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime, running debounced action immediately");
            self.cancel();
            action();
            return;
        };

        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        });

        let previous = self.slot().replace(task);
        if let Some(previous) = previous {
            previous.abort();
            trace!("Superseded pending debounced action");
        }
    }

    /// Cancels the pending action, if any.
    pub fn cancel(&self) {
        if let Some(task) = self.slot().take() {
            task.abort();
        }
    }

    /// Returns true while an action is waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.slot().as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Waits for the pending action to fire or be cancelled.
    pub async fn settle(&self) {
        let task = self.slot().take();
        if let Some(task) = task {
            // A cancelled task yields a JoinError; either way it's done.
            let _ = task.await;
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let hits = Arc::new(AtomicUsize::new(0));
        let debouncer = Debouncer::new();

        let h = hits.clone();
        debouncer.schedule(Duration::from_millis(300), move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_schedules_collapse_to_last() {
        let last = Arc::new(AtomicUsize::new(0));
        let debouncer = Debouncer::new();

        for value in 1..=3 {
            let l = last.clone();
            debouncer.schedule(Duration::from_millis(300), move || {
                l.store(value, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        debouncer.settle().await;
        assert_eq!(last.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_action() {
        let hits = Arc::new(AtomicUsize::new(0));
        let debouncer = Debouncer::new();

        let h = hits.clone();
        debouncer.schedule(Duration::from_millis(300), move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        debouncer.cancel();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending() {
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let debouncer = Debouncer::new();
            let h = hits.clone();
            debouncer.schedule(Duration::from_millis(300), move || {
                h.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_without_runtime_runs_immediately() {
        let hits = Arc::new(AtomicUsize::new(0));
        let debouncer = Debouncer::new();

        let h = hits.clone();
        debouncer.schedule(Duration::from_millis(300), move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
