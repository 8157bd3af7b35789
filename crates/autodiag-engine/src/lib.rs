//! Regeneration engine for autodiag.
//!
//! Drives the read → parse → update → render → serialize → write cycle over
//! source files with embedded diagram directives.
//!
//! - [`Cycle`]: one cycle over one file, holding the file's write lease throughout
//! - [`run_batch`]: every file once, sequentially
//! - [`run_watch`]: rerun on change until Ctrl-C
//!
//! # Example
//!
//! ```ignore
//! use autodiag_config::Config;
//! use autodiag_engine::{Cycle, renderer_from_config, run_batch, syntax_from_config};
//!
//! let config = Config::load(None, None)?;
//! let cycle = Cycle::new(syntax_from_config(&config), &config.directive.marker)
//!     .with_renderer(renderer_from_config(&config.render))
//!     .with_settle(config.batch.settle());
//! let summary = run_batch(&cycle, &files).await;
//! ```

mod batch;
mod config;
mod cycle;
mod watch;

pub use batch::{BatchSummary, run_batch};
pub use config::{renderer_from_config, syntax_from_config};
pub use cycle::{CellFailure, Cycle, CycleError, CycleReport};
pub use watch::run_watch;
