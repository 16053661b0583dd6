//! Scripted notifications for testing.
//!
//! Provides [`MockNotifier`] for driving a [`DirWatcher`] without waiting on
//! the OS backend.

use std::path::{Path, PathBuf};

use notify::EventKind;
use notify::event::{DataChange, ModifyKind};
use tokio::sync::mpsc;

use crate::error::WatchError;
use crate::watcher::{DirWatcher, EVENT_BUFFER};

/// Feeds raw notifications into a [`DirWatcher`].
///
/// Dropping the notifier ends the watcher's sequence.
///
/// # Example
///
/// ```ignore
/// use settle_watch::DirWatcher;
///
/// let (mut watcher, notifier) = DirWatcher::mock("templates", &["*.html".to_owned()])?;
/// notifier.fail("inotify queue overflow").await;
/// assert!(watcher.next().await.unwrap().is_err());
/// ```
#[derive(Clone, Debug)]
pub struct MockNotifier {
    dir: PathBuf,
    tx: mpsc::Sender<notify::Result<notify::Event>>,
}

impl MockNotifier {
    /// Report a content write to `name`, relative to the watched directory.
    pub async fn write(&self, name: impl AsRef<Path>) {
        let event = notify::Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(self.dir.join(name));
        let _ = self.tx.send(Ok(event)).await;
    }

    /// Report a backend failure.
    pub async fn fail(&self, message: &str) {
        let _ = self.tx.send(Err(notify::Error::generic(message))).await;
    }
}

impl DirWatcher {
    /// Watch `dir` (non-recursively) with notifications supplied by the
    /// returned [`MockNotifier`] instead of the OS.
    ///
    /// # Errors
    ///
    /// Same as [`DirWatcher::new`].
    pub fn mock(
        dir: impl Into<PathBuf>,
        patterns: &[String],
    ) -> Result<(Self, MockNotifier), WatchError> {
        let mut watcher = Self::new(dir, false, patterns)?;
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        watcher.rx = rx;

        let notifier = MockNotifier {
            dir: watcher.dir().to_path_buf(),
            tx,
        };
        Ok((watcher, notifier))
    }
}
