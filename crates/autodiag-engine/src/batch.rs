//! Batch mode: one cycle per file, sequentially.

use std::path::{Path, PathBuf};

use crate::cycle::{Cycle, CycleError, CycleReport};

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Completed cycles, in argument order.
    pub reports: Vec<CycleReport>,
    /// Cycles that aborted.
    pub errors: Vec<CycleError>,
    /// Arguments that are not regular files.
    pub skipped: Vec<PathBuf>,
}

impl BatchSummary {
    /// Files whose normalized text differs from what was on disk.
    pub fn changed(&self) -> impl Iterator<Item = &Path> {
        self.reports
            .iter()
            .filter(|report| report.changed)
            .map(|report| report.path.as_path())
    }
}

/// Run one cycle per file.
///
/// Each argument is resolved against the working directory. Arguments that
/// are not regular files are skipped. A failing file is logged and the batch
/// continues with the next one.
pub async fn run_batch(cycle: &Cycle, files: &[PathBuf]) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for file in files {
        let path = std::path::absolute(file).unwrap_or_else(|_| file.clone());
        let is_file = tokio::fs::metadata(&path)
            .await
            .is_ok_and(|meta| meta.is_file());
        if !is_file {
            tracing::warn!(path = %path.display(), "Skipping: not a regular file");
            summary.skipped.push(path);
            continue;
        }

        match cycle.run(&path).await {
            Ok(report) => {
                for failure in &report.failures {
                    tracing::warn!(
                        path = %path.display(),
                        position = failure.position(),
                        %failure,
                        "Cell failed"
                    );
                }
                summary.reports.push(report);
            }
            Err(error) => {
                tracing::error!(%error, "Cycle failed");
                summary.errors.push(error);
            }
        }
    }

    summary
}
