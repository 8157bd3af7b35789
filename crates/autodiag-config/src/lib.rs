//! Configuration management for autodiag.
//!
//! Parses `autodiag.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `render.kroki_url`
//! - `render.dot_program`

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "autodiag.toml";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override rendering backend.
    pub backend: Option<Backend>,
    /// Override Kroki URL.
    pub kroki_url: Option<String>,
    /// Override directive marker.
    pub marker: Option<String>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directive recognition.
    pub directive: DirectiveConfig,
    /// Rendering backend.
    pub render: RenderConfig,
    /// Continuous mode timing.
    pub watch: WatchConfig,
    /// Batch mode timing.
    pub batch: BatchConfig,
    /// Comment syntax overrides keyed by file extension.
    pub syntax: BTreeMap<String, SyntaxConfig>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Directive configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DirectiveConfig {
    /// Word that opens a diagram directive inside a comment.
    pub marker: String,
}

impl Default for DirectiveConfig {
    fn default() -> Self {
        Self {
            marker: "DIAG".to_owned(),
        }
    }
}

/// Rendering backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// HTTP rendering through a Kroki server.
    #[default]
    Kroki,
    /// Local rendering through the Graphviz `dot` program.
    Dot,
}

/// Rendering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub backend: Backend,
    /// Kroki server URL.
    pub kroki_url: String,
    /// Graphviz program (name on `PATH` or path relative to the config file).
    pub dot_program: PathBuf,
    /// HTTP timeout for Kroki requests in seconds.
    pub timeout_secs: u64,
}

impl RenderConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            kroki_url: "https://kroki.io".to_owned(),
            dot_program: PathBuf::from("dot"),
            timeout_secs: 30,
        }
    }
}

/// Continuous mode configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet period before a change event is delivered.
    pub debounce_ms: u64,
    /// Pause before and after writing a file back.
    pub settle_ms: u64,
}

impl WatchConfig {
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            settle_ms: 200,
        }
    }
}

/// Batch mode configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Pause before and after writing a file back.
    pub settle_ms: u64,
}

impl BatchConfig {
    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { settle_ms: 10 }
    }
}

/// Comment syntax for one file extension.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyntaxConfig {
    pub block_open: String,
    pub block_close: String,
    #[serde(default)]
    pub line_prefix: Option<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`render.kroki_url`").
        field: String,
        /// Error message (e.g., "${`KROKI_URL`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `autodiag.toml` in current directory and parents,
    /// falling back to defaults.
    ///
    /// CLI settings are applied after loading, then the result is validated.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails, or
    /// the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(backend) = settings.backend {
            self.render.backend = backend;
        }
        if let Some(kroki_url) = &settings.kroki_url {
            self.render.kroki_url.clone_from(kroki_url);
        }
        if let Some(marker) = &settings.marker {
            self.directive.marker.clone_from(marker);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_directive()?;
        self.validate_render()?;
        self.validate_syntax()?;
        Ok(())
    }

    fn validate_directive(&self) -> Result<(), ConfigError> {
        let marker = &self.directive.marker;
        require_non_empty(marker, "directive.marker")?;
        if marker.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(
                "directive.marker cannot contain whitespace".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_render(&self) -> Result<(), ConfigError> {
        match self.render.backend {
            Backend::Kroki => {
                require_non_empty(&self.render.kroki_url, "render.kroki_url")?;
                require_http_url(&self.render.kroki_url, "render.kroki_url")?;
            }
            Backend::Dot => {
                if self.render.dot_program.as_os_str().is_empty() {
                    return Err(ConfigError::Validation(
                        "render.dot_program cannot be empty".to_owned(),
                    ));
                }
            }
        }

        if self.render.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "render.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_syntax(&self) -> Result<(), ConfigError> {
        for (extension, syntax) in &self.syntax {
            require_non_empty(&syntax.block_open, &format!("syntax.{extension}.block_open"))?;
            require_non_empty(
                &syntax.block_close,
                &format!("syntax.{extension}.block_close"),
            )?;
            if let Some(prefix) = &syntax.line_prefix {
                require_non_empty(prefix, &format!("syntax.{extension}.line_prefix"))?;
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.render.kroki_url = expand::expand_env(&self.render.kroki_url, "render.kroki_url")?;

        let dot_program = self.render.dot_program.to_string_lossy().into_owned();
        self.render.dot_program =
            PathBuf::from(expand::expand_env(&dot_program, "render.dot_program")?);

        Ok(())
    }

    /// Resolve a relative `dot_program` path against the config directory.
    ///
    /// Bare program names are left for `PATH` lookup.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let program = &self.render.dot_program;
        if program.is_relative() && program.components().count() > 1 {
            self.render.dot_program = config_dir.join(program);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.directive.marker, "DIAG");
        assert_eq!(config.render.backend, Backend::Kroki);
        assert_eq!(config.render.kroki_url, "https://kroki.io");
        assert_eq!(config.render.dot_program, PathBuf::from("dot"));
        assert_eq!(config.render.timeout(), Duration::from_secs(30));
        assert_eq!(config.watch.debounce(), Duration::from_millis(100));
        assert_eq!(config.watch.settle(), Duration::from_millis(200));
        assert_eq!(config.batch.settle(), Duration::from_millis(10));
        assert!(config.syntax.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.directive.marker, "DIAG");
        assert_eq!(config.render.backend, Backend::Kroki);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[directive]
marker = "GRAPH"

[render]
backend = "dot"
dot_program = "/usr/local/bin/dot"
timeout_secs = 5

[watch]
debounce_ms = 50
settle_ms = 300

[batch]
settle_ms = 0

[syntax.lua]
block_open = "--[["
block_close = "]]"
line_prefix = "--"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.directive.marker, "GRAPH");
        assert_eq!(config.render.backend, Backend::Dot);
        assert_eq!(
            config.render.dot_program,
            PathBuf::from("/usr/local/bin/dot")
        );
        assert_eq!(config.render.timeout_secs, 5);
        assert_eq!(config.watch.debounce_ms, 50);
        assert_eq!(config.watch.settle_ms, 300);
        assert_eq!(config.batch.settle_ms, 0);
        assert_eq!(
            config.syntax.get("lua"),
            Some(&SyntaxConfig {
                block_open: "--[[".to_owned(),
                block_close: "]]".to_owned(),
                line_prefix: Some("--".to_owned()),
            })
        );
    }

    #[test]
    fn test_unknown_backend_is_parse_error() {
        let result: Result<Config, _> = toml::from_str("[render]\nbackend = \"wasm\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file_resolves_relative_program() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            "[render]\nbackend = \"dot\"\ndot_program = \"tools/dot\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.render.dot_program, dir.path().join("tools/dot"));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_keeps_bare_program_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[render]\ndot_program = \"dot\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.render.dot_program, PathBuf::from("dot"));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let result = Config::load(Some(Path::new("/nonexistent/autodiag.toml")), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_expands_env_with_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            "[render]\nkroki_url = \"${AUTODIAG_TEST_UNSET_KROKI:-http://localhost:8000}\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.render.kroki_url, "http://localhost:8000");
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings {
            backend: Some(Backend::Dot),
            kroki_url: Some("http://kroki.internal".to_owned()),
            marker: Some("GV".to_owned()),
        });
        assert_eq!(config.render.backend, Backend::Dot);
        assert_eq!(config.render.kroki_url, "http://kroki.internal");
        assert_eq!(config.directive.marker, "GV");
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.render.backend, Backend::Kroki);
        assert_eq!(config.directive.marker, "DIAG");
    }

    #[test]
    fn test_cli_settings_are_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "").unwrap();

        let settings = CliSettings {
            kroki_url: Some("kroki.io".to_owned()),
            ..CliSettings::default()
        };
        let result = Config::load(Some(&path), Some(&settings));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_marker_empty() {
        let mut config = Config::default();
        config.directive.marker = String::new();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: directive.marker cannot be empty"
        );
    }

    #[test]
    fn test_validate_marker_whitespace() {
        let mut config = Config::default();
        config.directive.marker = "MY DIAG".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_kroki_url_invalid_scheme() {
        let mut config = Config::default();
        config.render.kroki_url = "ftp://kroki.io".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_validate_kroki_url_ignored_for_dot_backend() {
        let mut config = Config::default();
        config.render.backend = Backend::Dot;
        config.render.kroki_url = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_timeout_zero() {
        let mut config = Config::default();
        config.render.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_syntax_empty_delimiter() {
        let mut config = Config::default();
        config.syntax.insert(
            "lua".to_owned(),
            SyntaxConfig {
                block_open: "--[[".to_owned(),
                block_close: String::new(),
                line_prefix: None,
            },
        );
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: syntax.lua.block_close cannot be empty"
        );
    }
}
