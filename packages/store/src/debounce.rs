//! Trailing-edge debouncing of async work.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Runs only the last of a burst of scheduled tasks.
///
/// Each [`schedule`](Self::schedule) aborts the previously scheduled task
/// (if it has not started running its body yet, it never will) and starts
/// a new one that waits `delay` before running. Dropping the debouncer
/// aborts whatever is pending.
///
/// Must be used from within a Tokio runtime.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Replaces any pending task with `task`, to run after the delay.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Aborts the pending task, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }

    /// Waits for the pending task, if any, to run to completion.
    pub async fn wait(&self) {
        let handle = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
            && !e.is_cancelled()
        {
            log::warn!("Debounced task failed: {e}");
        }
    }

    /// Whether a scheduled task has not finished yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
