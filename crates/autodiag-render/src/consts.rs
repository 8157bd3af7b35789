//! Backend defaults.

use std::time::Duration;

/// Public Kroki instance.
pub const DEFAULT_KROKI_URL: &str = "https://kroki.io";

/// Graphviz program looked up on `PATH`.
pub const DEFAULT_DOT_PROGRAM: &str = "dot";

/// Default HTTP timeout for Kroki requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
