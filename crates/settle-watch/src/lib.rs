//! Filesystem change notification for settle.
//!
//! This crate wraps the OS-native watcher (via `notify`) for a single
//! template directory and turns raw notifications into [`FileChangeEvent`]s.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`DirWatcher`] yielding a lazy, non-restartable sequence of events
//! - [`FileChangeEvent`] and [`ChangeKind`] describing one change to one path
//! - [`ChangeKind::is_relevant`], the classifier separating content changes
//!   from metadata noise
//!
//! # Example
//!
//! ```ignore
//! use settle_watch::DirWatcher;
//!
//! let mut watcher = DirWatcher::new("templates", false, &["*.html".to_owned()])?;
//! while let Some(event) = watcher.next().await {
//!     let event = event?;
//!     println!("{} {}", event.kind, event.path.display());
//! }
//! ```

mod error;
mod event;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod watcher;

pub use error::WatchError;
pub use event::{ChangeKind, FileChangeEvent};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockNotifier;
pub use watcher::DirWatcher;
