//! File change event types.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use notify::EventKind;
use notify::event::{ModifyKind, RenameMode};

/// Kind of filesystem change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// File was created.
    Create,
    /// File content was written.
    Write,
    /// File was removed.
    Remove,
    /// Anything else: permission or metadata changes, the source side of a
    /// rename, access.
    Other,
}

impl ChangeKind {
    /// Whether this kind of change can affect template content.
    ///
    /// Only [`Create`](Self::Create), [`Write`](Self::Write) and
    /// [`Remove`](Self::Remove) are relevant.
    #[must_use]
    pub fn is_relevant(self) -> bool {
        matches!(self, Self::Create | Self::Write | Self::Remove)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Write => "write",
            Self::Remove => "remove",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&EventKind> for ChangeKind {
    fn from(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => Self::Create,
            EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Other) => {
                Self::Write
            }
            // A file renamed onto a path appears there, as with an atomic save
            EventKind::Modify(ModifyKind::Name(
                RenameMode::To | RenameMode::Both | RenameMode::Any,
            )) => Self::Create,
            EventKind::Remove(_) => Self::Remove,
            _ => Self::Other,
        }
    }
}

/// A single change to a single path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileChangeEvent {
    /// Absolute path of the changed file.
    pub path: PathBuf,
    /// Kind of change.
    pub kind: ChangeKind,
    /// When the watcher observed the change.
    pub timestamp: DateTime<Utc>,
}

impl FileChangeEvent {
    /// Create an event stamped with the current time.
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            timestamp: Utc::now(),
        }
    }

    /// Whether the event can affect template content.
    #[must_use]
    pub fn is_relevant(&self) -> bool {
        self.kind.is_relevant()
    }

    /// Short display name: the file name, or the event timestamp in
    /// milliseconds when the path has none.
    #[must_use]
    pub fn name(&self) -> Cow<'_, str> {
        match self.path.file_name() {
            Some(name) => name.to_string_lossy(),
            None => Cow::Owned(self.timestamp.timestamp_millis().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{
        AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode,
    };

    #[test]
    fn test_relevant_kinds() {
        assert!(ChangeKind::Create.is_relevant());
        assert!(ChangeKind::Write.is_relevant());
        assert!(ChangeKind::Remove.is_relevant());
        assert!(!ChangeKind::Other.is_relevant());
    }

    #[test]
    fn test_from_notify_create_and_remove() {
        assert_eq!(
            ChangeKind::from(&EventKind::Create(CreateKind::File)),
            ChangeKind::Create
        );
        assert_eq!(
            ChangeKind::from(&EventKind::Remove(RemoveKind::Any)),
            ChangeKind::Remove
        );
    }

    #[test]
    fn test_from_notify_content_writes() {
        assert_eq!(
            ChangeKind::from(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            ChangeKind::Write
        );
        assert_eq!(
            ChangeKind::from(&EventKind::Modify(ModifyKind::Any)),
            ChangeKind::Write
        );
    }

    #[test]
    fn test_from_notify_rename_target_is_create() {
        for mode in [RenameMode::To, RenameMode::Both, RenameMode::Any] {
            assert_eq!(
                ChangeKind::from(&EventKind::Modify(ModifyKind::Name(mode))),
                ChangeKind::Create,
                "{mode:?}"
            );
        }
    }

    #[test]
    fn test_from_notify_noise_is_other() {
        assert_eq!(
            ChangeKind::from(&EventKind::Modify(ModifyKind::Metadata(
                MetadataKind::Permissions
            ))),
            ChangeKind::Other
        );
        assert_eq!(
            ChangeKind::from(&EventKind::Modify(ModifyKind::Name(RenameMode::From))),
            ChangeKind::Other
        );
        assert_eq!(
            ChangeKind::from(&EventKind::Access(AccessKind::Read)),
            ChangeKind::Other
        );
        assert_eq!(ChangeKind::from(&EventKind::Any), ChangeKind::Other);
    }

    #[test]
    fn test_event_name_uses_file_name() {
        let event = FileChangeEvent::new("/templates/base.html", ChangeKind::Write);
        assert_eq!(event.name(), "base.html");
        assert!(event.is_relevant());
    }

    #[test]
    fn test_event_name_falls_back_to_timestamp() {
        let event = FileChangeEvent::new("/", ChangeKind::Other);
        assert_eq!(
            event.name(),
            event.timestamp.timestamp_millis().to_string()
        );
        assert!(!event.is_relevant());
    }

    #[test]
    fn test_change_kind_display() {
        assert_eq!(ChangeKind::Create.to_string(), "create");
        assert_eq!(ChangeKind::Other.to_string(), "other");
    }

    #[test]
    fn test_event_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FileChangeEvent>();
    }
}
