//! Export configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ATVENU_API_KEY` - atVenu API key (sent as `x-api-key`)
//!
//! ## Optional
//! - `ATVENU_ENDPOINT` - GraphQL endpoint (default: <https://api.atvenu.com/>)
//! - `ATVENU_MAX_IN_FLIGHT` - Concurrent HTTP requests (default: 4, `1` runs sequentially)
//! - `ATVENU_MAX_ATTEMPTS` - Attempts per request including the first (default: 3)
//! - `ATVENU_INITIAL_BACKOFF_MS` - First retry delay, doubled per retry (default: 300)
//! - `ATVENU_TIMEOUT_SECS` - Per-request HTTP timeout (default: 30)
//! - `ATVENU_PAGE_SIZE` - `first:` argument for paginated connections (default: 200)

use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::retry::RetryPolicy;

const DEFAULT_ENDPOINT: &str = "https://api.atvenu.com/";
const DEFAULT_MAX_IN_FLIGHT: &str = "4";
const DEFAULT_MAX_ATTEMPTS: &str = "3";
const DEFAULT_INITIAL_BACKOFF_MS: &str = "300";
const DEFAULT_TIMEOUT_SECS: &str = "30";
const DEFAULT_PAGE_SIZE: &str = "200";

/// The API rejects larger `first:` values.
const MAX_PAGE_SIZE: u32 = 500;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Settings the API client needs, independent of how it talks HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Upper bound on concurrently in-flight requests.
    pub max_in_flight: usize,
    /// Retry policy for transport failures.
    pub retry: RetryPolicy,
    /// Page size requested from paginated connections.
    pub page_size: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_in_flight: 4,
            retry: RetryPolicy::default(),
            page_size: 200,
        }
    }
}

/// atVenu export configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ExportConfig {
    /// atVenu API key
    pub api_key: SecretString,
    /// GraphQL endpoint
    pub endpoint: Url,
    /// HTTP request timeout
    pub timeout: Duration,
    /// Client concurrency, retry and paging settings
    pub client: ClientOptions,
}

impl std::fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportConfig")
            .field("api_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.timeout)
            .field("client", &self.client)
            .finish()
    }
}

impl ExportConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// the API key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source.
    ///
    /// # Errors
    ///
    /// Same as [`ExportConfig::from_env`].
    pub fn from_source<F>(source: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = get_required(&source, "ATVENU_API_KEY")?;
        validate_api_key(&api_key, "ATVENU_API_KEY")?;

        let endpoint_raw = get_or_default(&source, "ATVENU_ENDPOINT", DEFAULT_ENDPOINT);
        let endpoint = Url::parse(&endpoint_raw).map_err(|e| {
            ConfigError::InvalidEnvVar("ATVENU_ENDPOINT".to_string(), e.to_string())
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "ATVENU_ENDPOINT".to_string(),
                format!("unsupported scheme '{}'", endpoint.scheme()),
            ));
        }

        let max_in_flight: usize =
            parse_positive(&source, "ATVENU_MAX_IN_FLIGHT", DEFAULT_MAX_IN_FLIGHT)?;
        let max_attempts: u32 =
            parse_positive(&source, "ATVENU_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;
        let initial_backoff_ms: u64 = parse_var(
            &source,
            "ATVENU_INITIAL_BACKOFF_MS",
            DEFAULT_INITIAL_BACKOFF_MS,
        )?;
        let timeout_secs: u64 = parse_positive(&source, "ATVENU_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let page_size: u32 = parse_positive(&source, "ATVENU_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidEnvVar(
                "ATVENU_PAGE_SIZE".to_string(),
                format!("must be at most {MAX_PAGE_SIZE} (got {page_size})"),
            ));
        }

        Ok(Self {
            api_key: SecretString::from(api_key),
            endpoint,
            timeout: Duration::from_secs(timeout_secs),
            client: ClientOptions {
                max_in_flight,
                retry: RetryPolicy {
                    max_attempts,
                    initial_backoff: Duration::from_millis(initial_backoff_ms),
                    ..RetryPolicy::default()
                },
                page_size,
            },
        })
    }

    /// API key for the `x-api-key` header.
    #[must_use]
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required variable.
fn get_required<F>(source: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    source(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a variable with a default value.
fn get_or_default<F>(source: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    source(key).unwrap_or_else(|| default.to_string())
}

fn parse_var<F, T>(source: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_or_default(source, key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a variable that must be at least one.
fn parse_positive<F, T>(source: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + From<u8>,
    T::Err: std::fmt::Display,
{
    let value: T = parse_var(source, key, default)?;
    if value < T::from(1) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(value)
}

/// Reject keys that are obviously copied from a template.
fn validate_api_key(key: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = key.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    if key.chars().any(char::is_whitespace) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            "must not contain whitespace".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const KEY: &str = "k3y_9fQ2xLmP7vR4tZ8w";

    fn load(vars: &[(&str, &str)]) -> Result<ExportConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ExportConfig::from_source(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("ATVENU_API_KEY", KEY)]).unwrap();
        assert_eq!(config.endpoint.as_str(), "https://api.atvenu.com/");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.client.max_in_flight, 4);
        assert_eq!(config.client.page_size, 200);
        assert_eq!(config.client.retry.max_attempts, 3);
        assert_eq!(config.client.retry.initial_backoff, Duration::from_millis(300));
        assert_eq!(config.api_key(), KEY);
    }

    #[test]
    fn test_missing_api_key() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "ATVENU_API_KEY"));
        assert_eq!(err.to_string(), "Missing environment variable: ATVENU_API_KEY");
    }

    #[test]
    fn test_placeholder_api_key_rejected() {
        let err = load(&[("ATVENU_API_KEY", "your-api-key")]).unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(..)));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("ATVENU_API_KEY", KEY),
            ("ATVENU_ENDPOINT", "http://localhost:4000/graphql"),
            ("ATVENU_MAX_IN_FLIGHT", "1"),
            ("ATVENU_MAX_ATTEMPTS", "5"),
            ("ATVENU_INITIAL_BACKOFF_MS", "10"),
            ("ATVENU_PAGE_SIZE", "50"),
        ])
        .unwrap();
        assert_eq!(config.endpoint.as_str(), "http://localhost:4000/graphql");
        assert_eq!(config.client.max_in_flight, 1);
        assert_eq!(config.client.retry.max_attempts, 5);
        assert_eq!(config.client.retry.initial_backoff, Duration::from_millis(10));
        assert_eq!(config.client.page_size, 50);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = load(&[("ATVENU_API_KEY", KEY), ("ATVENU_MAX_IN_FLIGHT", "0")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid environment variable ATVENU_MAX_IN_FLIGHT: must be at least 1"
        );
    }

    #[test]
    fn test_unparseable_number_rejected() {
        let err = load(&[("ATVENU_API_KEY", KEY), ("ATVENU_PAGE_SIZE", "lots")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "ATVENU_PAGE_SIZE"));
    }

    #[test]
    fn test_page_size_cap() {
        let err = load(&[("ATVENU_API_KEY", KEY), ("ATVENU_PAGE_SIZE", "1000")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(..)));
    }

    #[test]
    fn test_bad_endpoint_scheme() {
        let err = load(&[("ATVENU_API_KEY", KEY), ("ATVENU_ENDPOINT", "ftp://api.atvenu.com")])
            .unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = load(&[("ATVENU_API_KEY", KEY)]).unwrap();
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(KEY));
    }
}
