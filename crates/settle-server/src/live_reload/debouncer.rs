//! Quiet-window debouncing for live reload.
//!
//! Defers an action until no new trigger has arrived for a fixed delay, so a
//! burst of filesystem events (editors emit several per save) settles into a
//! single reload. Trailing edge: the most recently supplied action runs, timed
//! from the last trigger.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;

/// The scheduled action, if any.
///
/// `generation` changes on every trigger and on cancel, so a task that wakes
/// up after being superseded can tell and bail out.
#[derive(Default)]
struct Pending {
    generation: u64,
    handle: Option<AbortHandle>,
}

/// Thread-safe trailing-edge debouncer.
///
/// At most one action is pending at any time. The pending slot is released
/// when the quiet window elapses, before the action starts, so a trigger that
/// arrives while an action is executing schedules a fresh one instead of
/// aborting the running one.
pub(crate) struct QuietWindow {
    delay: Duration,
    pending: Arc<Mutex<Pending>>,
}

impl QuietWindow {
    /// Create a debouncer with the given quiet window.
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(Pending::default())),
        }
    }

    /// Schedule `action` to run once `delay` passes without another call.
    ///
    /// Cancels the previously scheduled action if it has not started yet.
    /// Must be called from within a tokio runtime.
    pub(crate) fn debounce<F>(&self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut pending = lock(&self.pending);
        if let Some(handle) = pending.handle.take() {
            handle.abort();
        }
        pending.generation += 1;

        let generation = pending.generation;
        let slot = Arc::clone(&self.pending);
        let delay = self.delay;

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut pending = lock(&slot);
                if pending.generation != generation {
                    return;
                }
                pending.handle = None;
            }
            action.await;
        });

        // Still holding the lock, so the task cannot claim the slot before
        // its handle is installed.
        pending.handle = Some(task.abort_handle());
    }

    /// Whether an action is scheduled and waiting for its quiet window.
    pub(crate) fn is_pending(&self) -> bool {
        lock(&self.pending).handle.is_some()
    }

    /// Drop the scheduled action, if any. A running action is not affected.
    pub(crate) fn cancel(&self) {
        let mut pending = lock(&self.pending);
        pending.generation += 1;
        if let Some(handle) = pending.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for QuietWindow {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn lock(pending: &Mutex<Pending>) -> MutexGuard<'_, Pending> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}
