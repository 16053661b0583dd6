//! Directory watcher over the OS-native notification API.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::WatchError;
use crate::event::{ChangeKind, FileChangeEvent};

/// Capacity of the channel between the notify callback and [`DirWatcher::next`].
pub(crate) const EVENT_BUFFER: usize = 100;

/// Watches one directory and yields [`FileChangeEvent`]s.
///
/// The sequence is lazy and cannot be restarted: after the OS watcher reports
/// an error, [`next`](Self::next) yields that error once and then `None`.
/// Dropping the watcher detaches it from the directory.
pub struct DirWatcher {
    dir: PathBuf,
    patterns: Vec<Pattern>,
    pub(crate) rx: mpsc::Receiver<notify::Result<notify::Event>>,
    pending: VecDeque<FileChangeEvent>,
    failed: bool,
    _watcher: RecommendedWatcher,
}

impl DirWatcher {
    /// Start watching `dir`.
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory to watch
    /// * `recursive` - Also watch subdirectories
    /// * `patterns` - Glob patterns relative to `dir`; empty matches everything
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Pattern`] for an invalid glob and
    /// [`WatchError::Init`] if the directory cannot be watched.
    pub fn new(
        dir: impl Into<PathBuf>,
        recursive: bool,
        patterns: &[String],
    ) -> Result<Self, WatchError> {
        let dir = dir.into();
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|source| WatchError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Backends report canonical paths on some platforms
        let dir = dir.canonicalize().map_err(|e| WatchError::Init {
            path: dir.clone(),
            source: notify::Error::io(e),
        })?;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        // The callback runs on the backend's own thread, so blocking is fine
        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
                let _ = tx.blocking_send(res);
            })
            .map_err(|source| WatchError::Init {
                path: dir.clone(),
                source,
            })?;

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(&dir, mode)
            .map_err(|source| WatchError::Init {
                path: dir.clone(),
                source,
            })?;

        tracing::info!(dir = %dir.display(), recursive, "Watching directory");

        Ok(Self {
            dir,
            patterns,
            rx,
            pending: VecDeque::new(),
            failed: false,
            _watcher: watcher,
        })
    }

    /// The watched directory (canonicalized).
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Wait for the next change.
    ///
    /// Returns `None` once the watcher has shut down or failed.
    pub async fn next(&mut self) -> Option<Result<FileChangeEvent, WatchError>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.failed {
                return None;
            }

            match self.rx.recv().await? {
                Ok(event) => self.queue(&event),
                Err(err) => {
                    self.failed = true;
                    return Some(Err(WatchError::Watch(err)));
                }
            }
        }
    }

    /// Split a notify event into one [`FileChangeEvent`] per matching path.
    fn queue(&mut self, event: &notify::Event) {
        let kind = ChangeKind::from(&event.kind);

        for path in &event.paths {
            if !matches_patterns(path, &self.dir, &self.patterns) {
                tracing::trace!(path = %path.display(), "Ignoring unmatched path");
                continue;
            }
            self.pending
                .push_back(FileChangeEvent::new(path.clone(), kind));
        }
    }
}

/// Check if a path inside `dir` matches any pattern.
///
/// Wildcards do not cross `/`: `*.html` matches only files directly in `dir`,
/// `**/*.html` matches at any depth.
fn matches_patterns(path: &Path, dir: &Path, patterns: &[Pattern]) -> bool {
    const OPTIONS: MatchOptions = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let Ok(relative) = path.strip_prefix(dir) else {
        return false;
    };

    patterns.is_empty()
        || patterns
            .iter()
            .any(|pattern| pattern.matches_path_with(relative, OPTIONS))
}
