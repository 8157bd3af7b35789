//! Command execution: batch, check and watch modes.

use std::process::ExitCode;
use std::sync::Arc;

use autodiag_config::{CliSettings, Config};
use autodiag_engine::{
    BatchSummary, Cycle, renderer_from_config, run_batch, run_watch, syntax_from_config,
};

use crate::Cli;
use crate::error::CliError;
use crate::output::Output;

impl Cli {
    /// Execute the command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the files cannot be watched.
    /// Failures of individual files are reported, not returned.
    pub(crate) async fn execute(self) -> Result<ExitCode, CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            backend: self.backend.map(Into::into),
            kroki_url: self.kroki_url.clone(),
            marker: self.marker.clone(),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Loaded configuration");
        }

        let settle = if self.watch {
            config.watch.settle()
        } else {
            config.batch.settle()
        };
        let mut cycle = Cycle::new(syntax_from_config(&config), &config.directive.marker)
            .with_settle(settle)
            .check_only(self.check);
        if self.svg && !self.check {
            cycle = cycle.with_renderer(renderer_from_config(&config.render));
        }

        if self.watch {
            output.info(&format!("Watching {} path(s), press Ctrl-C to stop", self.files.len()));
            run_watch(Arc::new(cycle), &self.files, config.watch.debounce()).await?;
            return Ok(ExitCode::SUCCESS);
        }

        let summary = run_batch(&cycle, &self.files).await;
        if self.check {
            Ok(report_check(&output, &summary))
        } else {
            report_batch(&output, &summary);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Print per-file results of a batch run.
fn report_batch(output: &Output, summary: &BatchSummary) {
    for path in &summary.skipped {
        output.warning(&format!("Skipped {} (not a file)", path.display()));
    }
    for report in &summary.reports {
        output.success(&report.path.display().to_string());
        for image in &report.exported {
            output.detail(&format!("wrote {}", image.display()));
        }
        for failure in &report.failures {
            output.warning(&format!("  {failure}"));
        }
    }
    for error in &summary.errors {
        output.error(&error.to_string());
    }
}

/// Print files that would change; non-zero exit if any would.
fn report_check(output: &Output, summary: &BatchSummary) -> ExitCode {
    for error in &summary.errors {
        output.error(&error.to_string());
    }

    let changed: Vec<_> = summary.changed().collect();
    for path in &changed {
        output.warning(&format!("Would rewrite {}", path.display()));
    }

    if changed.is_empty() {
        output.success(&format!(
            "{} file(s) already normalized",
            summary.reports.len()
        ));
        ExitCode::SUCCESS
    } else {
        output.info(&format!("{} file(s) would be rewritten", changed.len()));
        ExitCode::FAILURE
    }
}
