//! Continuous mode: rerun the cycle for a file whenever it changes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use autodiag_watch::{ChangeEvent, FileWatcher, WatchError};

use crate::cycle::Cycle;

/// Watch `paths` and run `cycle` for every changed file until Ctrl-C.
///
/// Each change event starts a cycle on its own task. Cycles for the same
/// file are serialized by the cycle's write lease, and events caused by the
/// cycle's own writes are dropped by the watcher.
///
/// # Errors
///
/// Returns an error if a path cannot be watched.
pub async fn run_watch(
    cycle: Arc<Cycle>,
    paths: &[PathBuf],
    debounce: Duration,
) -> Result<(), WatchError> {
    let (mut events, _handle) = FileWatcher::new(paths, Arc::clone(cycle.leases()))
        .with_debounce(debounce)
        .start()?;
    tracing::info!(paths = paths.len(), "Watching for changes");

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                dispatch(&cycle, event);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received, stopping watcher...");
                break;
            }
        }
    }

    Ok(())
}

fn dispatch(cycle: &Arc<Cycle>, event: ChangeEvent) {
    if !event.kind.has_content() {
        tracing::debug!(path = %event.path.display(), "File removed, nothing to do");
        return;
    }
    tracing::info!(path = %event.path.display(), "File changed");

    let cycle = Arc::clone(cycle);
    tokio::spawn(async move {
        match cycle.run(&event.path).await {
            Ok(report) => {
                for failure in &report.failures {
                    tracing::warn!(
                        path = %report.path.display(),
                        position = failure.position(),
                        %failure,
                        "Cell failed"
                    );
                }
            }
            Err(error) => tracing::error!(%error, "Cycle failed"),
        }
    });
}
