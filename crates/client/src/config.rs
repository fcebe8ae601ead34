//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SHOPKEEP_API_URL` - Backend base URL (default: `http://localhost:3000`)
//! - `SHOPKEEP_SESSION_FILE` - Where the session token is persisted
//!   (default: `$HOME/.shopkeep/session.json`)
//! - `SHOPKEEP_CACHE_TTL_SECS` - How long list queries stay cached (default: 300)
//! - `SHOPKEEP_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const SESSION_DIR: &str = ".shopkeep";
const SESSION_FILE: &str = "session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Shopkeep client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the storefront backend
    pub api_url: Url,
    /// File holding the persisted session token
    pub session_file: PathBuf,
    /// Time-to-live for cached list queries
    pub cache_ttl: Duration,
    /// Timeout applied to every backend request
    pub request_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Build a configuration with defaults for everything but the backend
    /// URL and the session file.
    #[must_use]
    pub const fn new(api_url: Url, session_file: PathBuf) -> Self {
        Self {
            api_url,
            session_file,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = parse_api_url(
            "SHOPKEEP_API_URL",
            &lookup("SHOPKEEP_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        )?;

        let session_file = lookup("SHOPKEEP_SESSION_FILE").map_or_else(
            || default_session_file(lookup("HOME").or_else(|| lookup("USERPROFILE"))),
            PathBuf::from,
        );

        let cache_ttl = parse_secs(
            "SHOPKEEP_CACHE_TTL_SECS",
            lookup("SHOPKEEP_CACHE_TTL_SECS"),
            DEFAULT_CACHE_TTL_SECS,
        )?;
        let request_timeout = parse_secs(
            "SHOPKEEP_REQUEST_TIMEOUT_SECS",
            lookup("SHOPKEEP_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        Ok(Self {
            api_url,
            session_file,
            cache_ttl,
            request_timeout,
            sentry_dsn: lookup("SENTRY_DSN").filter(|v| !v.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT").filter(|v| !v.is_empty()),
        })
    }

    /// Override the backend URL (e.g. from a command-line flag).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the value is not an http(s) URL.
    pub fn with_api_url(mut self, value: &str) -> Result<Self, ConfigError> {
        self.api_url = parse_api_url("--api-url", value)?;
        Ok(self)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and validate the backend base URL.
fn parse_api_url(name: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            name.to_string(),
            format!("unsupported scheme '{}', expected http or https", url.scheme()),
        ));
    }

    Ok(url)
}

/// Parse a whole number of seconds, falling back to a default when unset.
fn parse_secs(name: &str, value: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    value.map_or(Ok(Duration::from_secs(default)), |v| {
        v.trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))
    })
}

/// `~/.shopkeep/session.json`, or a path relative to the working directory
/// when no home directory is known.
fn default_session_file(home: Option<String>) -> PathBuf {
    home.map_or_else(PathBuf::new, PathBuf::from)
        .join(SESSION_DIR)
        .join(SESSION_FILE)
}
