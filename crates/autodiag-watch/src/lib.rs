//! File watching for autodiag's continuous mode.
//!
//! [`FileWatcher`] watches a set of files and directories and delivers
//! debounced [`ChangeEvent`]s on an async channel. It handles:
//!
//! - Watching the parent directory of each file, so editors that save by
//!   replacing the file keep being observed
//! - Ignoring dot-files
//! - Dropping events for paths under a [`WriteLease`], so a cycle writing a
//!   file does not trigger itself
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use autodiag_watch::{FileWatcher, WriteLeases};
//!
//! let leases = Arc::new(WriteLeases::new());
//! let (mut events, _handle) = FileWatcher::new(&paths, Arc::clone(&leases)).start()?;
//! while let Some(event) = events.recv().await {
//!     let _lease = leases.acquire(&event.path).await;
//!     // read, rewrite, write
//! }
//! ```

mod debouncer;
mod event;
mod lease;

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::time::Duration;

use notify::{RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

use debouncer::EventDebouncer;
pub use event::{ChangeEvent, ChangeKind};
pub use lease::{WriteLease, WriteLeases};

/// Default debounce duration.
const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Interval at which the drain thread polls the debouncer.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Capacity of the event channel.
const CHANNEL_CAPACITY: usize = 100;

/// File watching error.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("cannot watch {}: {source}", path.display())]
    Missing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("file watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// What the watcher reports for the given paths.
#[derive(Debug, Default)]
struct Targets {
    /// Individual files.
    files: HashSet<PathBuf>,
    /// Directories watched recursively; every file below them counts.
    dirs: Vec<PathBuf>,
}

impl Targets {
    /// Whether `path` is a watched file. Dot-files, and anything inside a
    /// dot-directory below a watched directory, are ignored.
    fn matches(&self, path: &Path) -> bool {
        if self.files.contains(path) {
            return path.file_name().is_none_or(|name| !is_hidden(Path::new(name)));
        }
        self.dirs
            .iter()
            .filter_map(|dir| path.strip_prefix(dir).ok())
            .any(|relative| !is_hidden(relative))
    }
}

/// Whether any component of `path` is a dot-file or dot-directory.
fn is_hidden(path: &Path) -> bool {
    path.components().any(|component| match component {
        Component::Normal(name) => name.to_str().is_some_and(|name| name.starts_with('.')),
        _ => false,
    })
}

/// Receiver for debounced change events.
pub struct ChangeReceiver {
    rx: async_mpsc::Receiver<ChangeEvent>,
}

impl ChangeReceiver {
    /// Wait for the next event. Returns `None` once the watcher has stopped.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }
}

/// Handle to stop watching. Dropping it stops the watcher.
pub struct WatchHandle {
    _shutdown: mpsc::Sender<()>,
}

/// Watches files and directories for changes.
pub struct FileWatcher {
    paths: Vec<PathBuf>,
    leases: Arc<WriteLeases>,
    debounce: Duration,
}

impl FileWatcher {
    /// Create a watcher for `paths` that honors `leases`.
    #[must_use]
    pub fn new(paths: &[PathBuf], leases: Arc<WriteLeases>) -> Self {
        Self {
            paths: paths.to_vec(),
            leases,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Set the debounce duration.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Start watching.
    ///
    /// Events are delivered with canonical absolute paths. The watcher runs
    /// until the returned [`WatchHandle`] is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if a path does not exist or cannot be watched.
    pub fn start(self) -> Result<(ChangeReceiver, WatchHandle), WatchError> {
        let mut targets = Targets::default();
        let mut watch_roots: Vec<(PathBuf, RecursiveMode)> = Vec::new();

        for path in &self.paths {
            let canonical = std::fs::canonicalize(path).map_err(|source| WatchError::Missing {
                path: path.clone(),
                source,
            })?;
            if canonical.is_dir() {
                watch_roots.push((canonical.clone(), RecursiveMode::Recursive));
                targets.dirs.push(canonical);
            } else {
                let parent = canonical
                    .parent()
                    .map_or_else(|| PathBuf::from("/"), Path::to_path_buf);
                if !watch_roots.iter().any(|(root, _)| *root == parent) {
                    watch_roots.push((parent, RecursiveMode::NonRecursive));
                }
                targets.files.insert(canonical);
            }
        }

        let (event_tx, event_rx) = async_mpsc::channel(CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let debouncer = Arc::new(EventDebouncer::new(self.debounce));

        let watcher_debouncer = Arc::clone(&debouncer);
        let leases = Arc::clone(&self.leases);
        let mut watcher = notify::recommended_watcher(
            move |res: Result<notify::Event, notify::Error>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!(error = %e, "File watcher error");
                        return;
                    }
                };
                let Some(kind) = ChangeKind::from_notify(event.kind) else {
                    return;
                };
                for path in event.paths {
                    if !targets.matches(&path) {
                        continue;
                    }
                    if leases.is_held(&path) {
                        tracing::debug!(path = %path.display(), "Ignoring event during write");
                        continue;
                    }
                    tracing::debug!(path = %path.display(), ?kind, "Recorded change event");
                    watcher_debouncer.record(path, kind);
                }
            },
        )?;

        for (root, mode) in &watch_roots {
            watcher.watch(root, *mode)?;
            tracing::debug!(root = %root.display(), ?mode, "Watching");
        }

        // Spawn drain thread. The watcher is moved in to keep it alive.
        std::thread::spawn(move || {
            let _watcher = watcher;

            loop {
                match shutdown_rx.recv_timeout(POLL_INTERVAL) {
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                }

                for event in debouncer.drain_ready() {
                    if event_tx.blocking_send(event).is_err() {
                        return;
                    }
                }
            }
        });

        Ok((
            ChangeReceiver { rx: event_rx },
            WatchHandle {
                _shutdown: shutdown_tx,
            },
        ))
    }
}
