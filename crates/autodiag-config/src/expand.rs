//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` names the configuration key for error messages. Values without a
/// `${` reference are returned unchanged, so bare `$` (e.g. in URLs) is kept.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_unchanged() {
        assert_eq!(
            expand_env("https://kroki.io", "render.kroki_url").unwrap(),
            "https://kroki.io"
        );
    }

    #[test]
    fn test_default_used_when_unset() {
        assert_eq!(
            expand_env(
                "${AUTODIAG_TEST_SURELY_UNSET_1:-http://localhost:8000}",
                "render.kroki_url"
            )
            .unwrap(),
            "http://localhost:8000"
        );
    }

    #[test]
    fn test_missing_variable_is_error() {
        let err = expand_env("${AUTODIAG_TEST_SURELY_UNSET_2}", "render.kroki_url").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Environment variable error in render.kroki_url: ${AUTODIAG_TEST_SURELY_UNSET_2} not set"
        );
    }

    #[test]
    fn test_set_variable_is_expanded() {
        // PATH is set in any environment that can run the test suite.
        let path = std::env::var("PATH").unwrap();
        assert_eq!(expand_env("${PATH}", "render.dot_program").unwrap(), path);
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        assert_eq!(expand_env("$VAR", "render.dot_program").unwrap(), "$VAR");
    }

    #[test]
    fn test_url_with_dollar_not_expanded() {
        assert_eq!(
            expand_env("https://example.com/$path", "render.kroki_url").unwrap(),
            "https://example.com/$path"
        );
    }
}
