#![forbid(unsafe_code)]

//! Environment-driven configuration.
//!
//! Every setting has a default, so an empty environment yields a usable
//! [`Config`]. Unparseable values keep the default and are reported as
//! [`ConfigError`]s instead of aborting startup.
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `ROSTER_API_URL` | `base_url` | `http://localhost:8080/api` |
//! | `ROSTER_STALE_MS` | `stale_time` | 30 s |
//! | `ROSTER_GC_MS` | `gc_time` | 5 min |
//! | `ROSTER_ROW_HEIGHT` | `row_height` | 64 px |
//! | `ROSTER_OVERSCAN` | `overscan` | 5 |

use std::env;
use std::fmt;
use std::time::Duration;

pub const ENV_API_URL: &str = "ROSTER_API_URL";
pub const ENV_STALE_MS: &str = "ROSTER_STALE_MS";
pub const ENV_GC_MS: &str = "ROSTER_GC_MS";
pub const ENV_ROW_HEIGHT: &str = "ROSTER_ROW_HEIGHT";
pub const ENV_OVERSCAN: &str = "ROSTER_OVERSCAN";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(30);
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_ROW_HEIGHT: f64 = 64.0;
pub const DEFAULT_OVERSCAN: usize = 5;

/// Runtime configuration for the client, cache, and list window.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base address of the remote service, without trailing slash.
    pub base_url: String,
    /// How long a successful load is served without refetching.
    pub stale_time: Duration,
    /// How long unobserved cached data survives.
    pub gc_time: Duration,
    /// Estimated row height in pixels.
    pub row_height: f64,
    /// Rows materialized beyond each edge of the viewport.
    pub overscan: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            stale_time: DEFAULT_STALE_TIME,
            gc_time: DEFAULT_GC_TIME,
            row_height: DEFAULT_ROW_HEIGHT,
            overscan: DEFAULT_OVERSCAN,
        }
    }
}

/// Configuration parse diagnostics (env + validation).
#[derive(Debug, Clone)]
pub struct ConfigParse {
    pub config: Config,
    pub errors: Vec<ConfigError>,
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Defaults with an explicit service address (browser hosts pass it in).
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            ..Self::default()
        }
    }

    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> Config {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> ConfigParse {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Parse config through a custom variable lookup.
    pub fn from_env_with<F>(mut get: F) -> ConfigParse
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Config::default();
        let mut errors = Vec::new();

        if let Some(value) = get(ENV_API_URL) {
            let trimmed = normalize_base_url(&value);
            if is_http_url(&trimmed) {
                config.base_url = trimmed;
            } else {
                errors.push(ConfigError::new(
                    "base_url",
                    value,
                    "expected http:// or https:// address",
                ));
            }
        }

        if let Some(value) = get(ENV_STALE_MS) {
            match parse_u64(&value) {
                Some(ms) => config.stale_time = Duration::from_millis(ms),
                None => errors.push(ConfigError::new(
                    "stale_time",
                    value,
                    "expected milliseconds",
                )),
            }
        }

        if let Some(value) = get(ENV_GC_MS) {
            match parse_u64(&value) {
                Some(ms) => config.gc_time = Duration::from_millis(ms),
                None => errors.push(ConfigError::new("gc_time", value, "expected milliseconds")),
            }
        }

        if let Some(value) = get(ENV_ROW_HEIGHT) {
            match parse_positive_f64(&value) {
                Some(px) => config.row_height = px,
                None => errors.push(ConfigError::new(
                    "row_height",
                    value,
                    "expected positive number of pixels",
                )),
            }
        }

        if let Some(value) = get(ENV_OVERSCAN) {
            match value.trim().parse::<usize>() {
                Ok(n) => config.overscan = n,
                Err(_) => errors.push(ConfigError::new(
                    "overscan",
                    value,
                    "expected non-negative integer",
                )),
            }
        }

        ConfigParse { config, errors }
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();
        if !is_http_url(&self.base_url) {
            errors.push(ConfigError::new(
                "base_url",
                self.base_url.clone(),
                "expected http:// or https:// address",
            ));
        }
        if !(self.row_height.is_finite() && self.row_height > 0.0) {
            errors.push(ConfigError::new(
                "row_height",
                self.row_height.to_string(),
                "must be positive",
            ));
        }
        if self.gc_time < self.stale_time {
            errors.push(ConfigError::new(
                "gc_time",
                format!("{}ms", self.gc_time.as_millis()),
                "must not be shorter than stale_time",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn normalize_base_url(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("http://")
        .or_else(|| value.strip_prefix("https://"));
    matches!(rest, Some(host) if !host.is_empty())
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn parse_positive_f64(value: &str) -> Option<f64> {
    let parsed = value.trim().parse::<f64>().ok()?;
    (parsed.is_finite() && parsed > 0.0).then_some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(vars: &[(&str, &str)]) -> ConfigParse {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_env_with(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_env_gives_defaults() {
        let parsed = parse(&[]);
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.config, Config::default());
        assert!(parsed.config.validate().is_ok());
    }

    #[test]
    fn overrides_apply() {
        let parsed = parse(&[
            (ENV_API_URL, "https://crm.example.com/api/"),
            (ENV_STALE_MS, "1000"),
            (ENV_GC_MS, "2000"),
            (ENV_ROW_HEIGHT, "48"),
            (ENV_OVERSCAN, "2"),
        ]);
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.config.base_url, "https://crm.example.com/api");
        assert_eq!(parsed.config.stale_time, Duration::from_secs(1));
        assert_eq!(parsed.config.gc_time, Duration::from_secs(2));
        assert_eq!(parsed.config.row_height, 48.0);
        assert_eq!(parsed.config.overscan, 2);
    }

    #[test]
    fn bad_values_keep_defaults_and_report() {
        let parsed = parse(&[
            (ENV_API_URL, "ftp://nope"),
            (ENV_STALE_MS, "soon"),
            (ENV_ROW_HEIGHT, "-3"),
            (ENV_OVERSCAN, "many"),
        ]);
        assert_eq!(parsed.config, Config::default());
        let fields: Vec<_> = parsed.errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["base_url", "stale_time", "row_height", "overscan"]);
    }

    #[test]
    fn validate_reports_all_violations() {
        let config = Config {
            base_url: "localhost".into(),
            row_height: 0.0,
            gc_time: Duration::from_secs(1),
            ..Config::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].to_string().starts_with("base_url=localhost"));
    }

    #[test]
    fn with_base_url_trims_slashes() {
        assert_eq!(
            Config::with_base_url("http://host:8080/api//").base_url,
            "http://host:8080/api"
        );
    }
}
