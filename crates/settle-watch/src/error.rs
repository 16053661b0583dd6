//! Watcher error types.

use std::path::PathBuf;

/// Errors from the directory watcher.
///
/// Every variant means the watch primitive itself is unusable; callers are
/// expected to escalate rather than retry.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The watcher could not be created or attached to the directory.
    #[error("Cannot watch {}: {source}", path.display())]
    Init {
        /// Directory that was to be watched.
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// A watch pattern is not a valid glob.
    #[error("Invalid watch pattern {pattern:?}: {source}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// The OS watcher reported an error after it was started.
    #[error("File watcher failed: {0}")]
    Watch(#[source] notify::Error),
}
