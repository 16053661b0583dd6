//! Fan-out of watcher events to reload sessions.

use settle_watch::{DirWatcher, FileChangeEvent, WatchError};
use tokio::sync::broadcast;

/// Default number of events a slow subscriber may fall behind.
pub(crate) const BUS_CAPACITY: usize = 100;

/// Broadcasts content-affecting changes to every subscribed session.
#[derive(Clone, Debug)]
pub(crate) struct EventBus {
    tx: broadcast::Sender<FileChangeEvent>,
}

impl EventBus {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to events published from now on.
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<FileChangeEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscriptions, one per open session.
    pub(crate) fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Publish `event` if it can affect template content.
    ///
    /// Returns `false` when the event was dropped as noise.
    pub(crate) fn publish(&self, event: FileChangeEvent) -> bool {
        if !event.is_relevant() {
            tracing::debug!(
                path = %event.path.display(),
                kind = %event.kind,
                "Ignoring non-content change"
            );
            return false;
        }

        tracing::debug!(path = %event.path.display(), kind = %event.kind, "File changed");
        // Fails only when nobody is listening, which is fine
        let _ = self.tx.send(event);
        true
    }
}

/// Forward watcher events into the bus until the watcher stops.
///
/// # Errors
///
/// Returns the watcher's error if it fails; the caller treats it as fatal.
pub(crate) async fn run_relay(mut watcher: DirWatcher, bus: EventBus) -> Result<(), WatchError> {
    while let Some(result) = watcher.next().await {
        bus.publish(result?);
    }

    tracing::info!(dir = %watcher.dir().display(), "Watcher stopped");
    Ok(())
}
