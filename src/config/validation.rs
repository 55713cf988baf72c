//! Configuration errors and value helpers.

use std::time::Duration;

use thiserror::Error;

use crate::storage::SinkError;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    ValidationError(String),

    /// The resulting sink options were rejected.
    #[error("invalid sink options: {0}")]
    Sink(#[from] SinkError),
}

/// Parse duration string using humantime.
///
/// Supports various formats: `30s`, `1m`, `5m30s`, `1h`, `7d`, `100ms`, etc.
///
/// # Examples
///
/// ```
/// use logsink::config::parse_duration;
///
/// assert_eq!(parse_duration("30s").unwrap().as_secs(), 30);
/// assert_eq!(parse_duration("7d").unwrap().as_secs(), 7 * 86_400);
/// assert_eq!(parse_duration("1h30m").unwrap().as_secs(), 5400);
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("duration string is empty".to_string());
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Expand environment variables in a string.
/// Supports ${VAR} and ${VAR:-default} syntax.
pub fn expand_env_vars(input: &str) -> String {
    static ENV_VAR_REGEX: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();

    let regex = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("failed to compile env var regex")
    });

    regex
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var_name).unwrap_or_else(|_| default_value.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_retention_windows() {
        assert_eq!(parse_duration("24h").unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(604_800));
        assert_eq!(parse_duration(" 5s ").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("   ").is_err());
        assert!(parse_duration("forever").is_err());
        assert!(parse_duration("30").is_err());
    }

    #[test]
    fn test_expand_env_vars_passthrough() {
        assert_eq!(
            expand_env_vars("mysql://root@localhost/logs"),
            "mysql://root@localhost/logs"
        );
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        let result = expand_env_vars("${LOGSINK_TEST_MISSING_URL_9731:-sqlite://fallback.db}");
        assert_eq!(result, "sqlite://fallback.db");
    }

    #[test]
    fn test_expand_env_vars_missing_without_default() {
        assert_eq!(expand_env_vars("a${LOGSINK_TEST_MISSING_9732}b"), "ab");
    }

    #[test]
    fn test_expand_env_vars_from_env() {
        // SAFETY: the variable name is unique to this test.
        unsafe {
            std::env::set_var("LOGSINK_TEST_DB_HOST", "db.internal");
        }
        let result = expand_env_vars("mysql://app@${LOGSINK_TEST_DB_HOST}/logs");
        assert_eq!(result, "mysql://app@db.internal/logs");
        // SAFETY: cleanup of the variable set above.
        unsafe {
            std::env::remove_var("LOGSINK_TEST_DB_HOST");
        }
    }
}
