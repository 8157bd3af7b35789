//! autodiag CLI - keeps diagrams embedded in source comments normalized and rendered.
//!
//! Processes each file once (batch mode) or keeps watching them (`--watch`).
//! With `--svg`, every diagram is also exported as `<file><n>.svg` next to
//! its source.

mod error;
mod output;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use output::Output;

/// Rendering backend choice on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    /// Render through a Kroki server.
    Kroki,
    /// Render with the local Graphviz `dot` program.
    Dot,
}

impl From<BackendArg> for autodiag_config::Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Kroki => Self::Kroki,
            BackendArg::Dot => Self::Dot,
        }
    }
}

/// Normalize and render Graphviz diagrams embedded in source file comments.
#[derive(Debug, Parser)]
#[command(name = "autodiag", version, about)]
struct Cli {
    /// Files to process.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Keep watching the files and reprocess them on change.
    #[arg(short, long)]
    watch: bool,

    /// Export every diagram as an SVG file next to its source.
    #[arg(short, long)]
    svg: bool,

    /// Path to configuration file (default: auto-discover autodiag.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rendering backend (overrides config).
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,

    /// Kroki server URL (overrides config).
    #[arg(long, env = "AUTODIAG_KROKI_URL")]
    kroki_url: Option<String>,

    /// Directive marker word (overrides config).
    #[arg(long)]
    marker: Option<String>,

    /// Report files that would change without writing anything.
    #[arg(long, conflicts_with = "watch")]
    check: bool,

    /// Enable verbose output (per-file and per-diagram logs).
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = tokio::runtime::Runtime::new()
        .map_err(error::CliError::from)
        .and_then(|rt| rt.block_on(cli.execute()));

    match result {
        Ok(code) => code,
        Err(err) => {
            output.error(&format!("Error: {err}"));
            ExitCode::FAILURE
        }
    }
}
