//! Per-connection reload stream.
//!
//! A session subscribes to the [`EventBus`](super::bus::EventBus), records a
//! descriptor for every change it sees and, once changes stop arriving for the
//! quiet window, reloads the templates and writes one frame to its client.
//!
//! ```text
//! bus ──► relay task ──► receive loop ──► EventLog::append
//!        (arrival time)        │
//!                              └────────► QuietWindow::debounce(flush)
//!                                                 │
//!                                   flush: drain log, reload, write frame
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use settle_templates::{TemplateError, TemplateRegistry};
use settle_watch::FileChangeEvent;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::debouncer::QuietWindow;
use super::event_log::EventLog;
use super::frame::{ErrorFrame, ReloadFrame};
use super::sink::FrameSink;

/// Tagged events buffered between the relay task and the receive loop.
const ARRIVAL_BUFFER: usize = 64;

/// Work performed once per settle point before the client is notified.
pub(crate) trait ReloadAction: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// # Errors
    ///
    /// A failed reload is reported to the client; the session keeps running.
    fn run(&self) -> Result<(), Self::Error>;
}

impl ReloadAction for TemplateRegistry {
    type Error = TemplateError;

    fn run(&self) -> Result<(), TemplateError> {
        self.reload().map(|_| ())
    }
}

/// Timing parameters shared by every session of a server.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SessionConfig {
    /// Quiet window before a flush.
    pub(crate) quiet_window: Duration,
    /// Reconnect hint sent to the client.
    pub(crate) retry: Duration,
}

/// One client's reload stream.
pub(crate) struct ReloadSession<S, R> {
    id: Uuid,
    sink: S,
    action: Arc<R>,
    config: SessionConfig,
    cancel: CancellationToken,
}

impl<S: FrameSink, R: ReloadAction> ReloadSession<S, R> {
    /// Create a session writing to `sink`.
    ///
    /// Cancelling `cancel` ends the session; the session cancels it too when
    /// the client goes away.
    pub(crate) fn new(
        sink: S,
        action: Arc<R>,
        config: SessionConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sink,
            action,
            config,
            cancel,
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    /// Drive the session until cancellation or client disconnect.
    ///
    /// `events` must be subscribed before the first change of interest is
    /// published; changes from before the subscription are not seen.
    pub(crate) async fn run(self, events: broadcast::Receiver<FileChangeEvent>) {
        let Self {
            id,
            sink,
            action,
            config,
            cancel,
        } = self;

        let (tx, mut arrivals) = mpsc::channel(ARRIVAL_BUFFER);
        let relay = tokio::spawn(relay(id, events, tx, cancel.clone()));

        let flusher = Arc::new(Flusher {
            session: id,
            sink,
            action,
            log: EventLog::new(),
            retry: config.retry,
            sequence: Mutex::new(0),
            cancel: cancel.clone(),
        });
        let window = QuietWindow::new(config.quiet_window);

        tracing::info!(session = %id, "Reload session started");

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = flusher.sink.closed() => {
                    tracing::debug!(session = %id, "Client disconnected");
                    break;
                }
                arrival = arrivals.recv() => {
                    let Some(descriptor) = arrival else {
                        break;
                    };
                    flusher.log.append(descriptor);
                    let flusher = Arc::clone(&flusher);
                    window.debounce(async move { flusher.flush().await });
                }
            }
        }

        let flush_pending = window.is_pending();
        cancel.cancel();
        window.cancel();
        // Unblocks a relay stuck on a full channel
        drop(arrivals);
        let _ = relay.await;

        tracing::info!(
            session = %id,
            flush_pending,
            dropped = flusher.log.len(),
            "Reload session closed"
        );
    }
}

/// Forward bus events into the session, tagged with their arrival time.
async fn relay(
    session: Uuid,
    mut events: broadcast::Receiver<FileChangeEvent>,
    tx: mpsc::Sender<String>,
    cancel: CancellationToken,
) {
    loop {
        let received = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            received = events.recv() => received,
        };

        match received {
            Ok(event) => {
                if tx.send(describe(&event, Utc::now())).await.is_err() {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(session = %session, skipped, "Reload session fell behind file events");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Human-readable descriptor for one change.
fn describe(event: &FileChangeEvent, arrived: DateTime<Utc>) -> String {
    format!("name={}@time={}", event.name(), arrived.timestamp_millis())
}

/// State reachable from debounced flush tasks.
struct Flusher<S, R> {
    session: Uuid,
    sink: S,
    action: Arc<R>,
    log: EventLog,
    retry: Duration,
    /// Next reload frame id. Held for the whole flush so flushes never
    /// interleave.
    sequence: Mutex<u64>,
    cancel: CancellationToken,
}

impl<S: FrameSink, R: ReloadAction> Flusher<S, R> {
    async fn flush(&self) {
        let mut sequence = self.sequence.lock().await;

        let descriptors = self.log.drain_all();
        if descriptors.is_empty() || self.cancel.is_cancelled() {
            return;
        }

        match self.action.run() {
            Ok(()) => {
                let changes = descriptors.len();
                let frame = ReloadFrame {
                    id: *sequence,
                    retry: self.retry,
                    descriptors,
                };
                if self.send(frame.to_string()).await {
                    tracing::info!(session = %self.session, id = *sequence, changes, "Sent reload");
                    *sequence += 1;
                }
            }
            Err(err) => {
                tracing::warn!(session = %self.session, error = %err, "Template reload failed");
                let frame = ErrorFrame {
                    message: err.to_string(),
                };
                self.send(frame.to_string()).await;
            }
        }
    }

    /// Write one frame unless the session has ended. A failed write ends it.
    async fn send(&self, frame: String) -> bool {
        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return false,
            result = self.sink.send_frame(frame) => result,
        };

        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(session = %self.session, error = %err, "Stopping session");
                self.cancel.cancel();
                false
            }
        }
    }
}
