//! Event debouncing for change notification.
//!
//! Coalesces multiple raw events into a single event per path, so an editor
//! save that emits several events triggers one cycle.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::event::{ChangeEvent, ChangeKind};

/// Pending event waiting to be emitted.
struct PendingEvent {
    kind: ChangeKind,
    deadline: Instant,
}

/// Thread-safe event debouncer.
///
/// Every recorded event pushes the path's deadline forward; an event is ready
/// once its path has been quiet for the debounce duration.
pub(crate) struct EventDebouncer {
    pending: Mutex<HashMap<PathBuf, PendingEvent>>,
    debounce_duration: Duration,
}

impl EventDebouncer {
    pub(crate) fn new(debounce_duration: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            debounce_duration,
        }
    }

    /// Record an event. Called from watcher callbacks.
    pub(crate) fn record(&self, path: PathBuf, kind: ChangeKind) {
        use std::collections::hash_map::Entry;

        let deadline = Instant::now() + self.debounce_duration;
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);

        match pending.entry(path) {
            Entry::Vacant(entry) => {
                entry.insert(PendingEvent { kind, deadline });
            }
            Entry::Occupied(mut entry) => match Self::coalesce(entry.get().kind, kind) {
                Some(kind) => {
                    *entry.get_mut() = PendingEvent { kind, deadline };
                }
                // Created then removed: nothing to process.
                None => {
                    entry.remove();
                }
            },
        }
    }

    /// Coalesce two event kinds. `None` discards both.
    #[allow(clippy::match_same_arms)]
    fn coalesce(existing: ChangeKind, new: ChangeKind) -> Option<ChangeKind> {
        use ChangeKind::{Created, Modified, Removed};

        match (existing, new) {
            (Created, Created | Modified) => Some(Created),
            (Created, Removed) => None,
            (Modified, Created) => Some(Created),
            (Modified, Modified) => Some(Modified),
            (Modified, Removed) => Some(Removed),
            // Editors that save by replacing the file
            (Removed, Created) => Some(Modified),
            (Removed, Modified | Removed) => Some(Removed),
        }
    }

    /// Take events whose debounce deadline has passed.
    pub(crate) fn drain_ready(&self) -> Vec<ChangeEvent> {
        let now = Instant::now();
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending
            .extract_if(|_, event| event.deadline <= now)
            .map(|(path, event)| ChangeEvent {
                path,
                kind: event.kind,
            })
            .collect()
    }
}
