//! Change event types.

use std::path::PathBuf;

/// Kind of file change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    /// Convert a `notify::EventKind`.
    ///
    /// Returns `None` for event kinds that are not relevant (e.g., Access).
    pub(crate) fn from_notify(kind: notify::EventKind) -> Option<Self> {
        match kind {
            notify::EventKind::Create(_) => Some(Self::Created),
            notify::EventKind::Modify(_) => Some(Self::Modified),
            notify::EventKind::Remove(_) => Some(Self::Removed),
            _ => None,
        }
    }

    /// Whether the file has content worth processing after this change.
    #[must_use]
    pub fn has_content(self) -> bool {
        matches!(self, Self::Created | Self::Modified)
    }
}

/// A debounced change to a watched file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Absolute path of the changed file.
    pub path: PathBuf,
    pub kind: ChangeKind,
}
