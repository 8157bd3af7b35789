//! CLI error types.

use autodiag_config::ConfigError;
use autodiag_watch::WatchError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Watch(#[from] WatchError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}
