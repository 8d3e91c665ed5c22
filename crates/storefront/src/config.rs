//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `BESTIE_API_URL` - Backend base URL (default: <https://merabestie-backend.onrender.com>)
//! - `BESTIE_STORAGE_DIR` - Directory for the local cart and session (default: .bestie)
//! - `BESTIE_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)
//! - `BESTIE_CATALOG_CACHE_TTL_SECS` - Product catalog cache TTL in seconds (default: 300)
//! - `BESTIE_CURRENCY_PREFIX` - Prefix used when displaying amounts (default: Rs.)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "https://merabestie-backend.onrender.com";
const DEFAULT_STORAGE_DIR: &str = ".bestie";
const DEFAULT_TIMEOUT_SECS: &str = "30";
const DEFAULT_CATALOG_TTL_SECS: &str = "300";
const DEFAULT_CURRENCY_PREFIX: &str = "Rs.";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend API configuration
    pub backend: BackendConfig,
    /// Directory holding the guest cart, recently viewed list and session
    pub storage_dir: PathBuf,
    /// Prefix used when displaying amounts
    pub currency_prefix: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Backend API configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// How long the product catalog stays cached
    pub catalog_ttl: Duration,
}

impl BackendConfig {
    /// Configuration pointing at `base_url` with default timings.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(30),
            catalog_ttl: Duration::from_secs(300),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get_or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let base_url = parse_base_url(
            "BESTIE_API_URL",
            &get_or_default("BESTIE_API_URL", DEFAULT_API_URL),
        )?;
        let timeout = parse_secs(
            "BESTIE_HTTP_TIMEOUT_SECS",
            &get_or_default("BESTIE_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
        )?;
        let catalog_ttl = parse_secs(
            "BESTIE_CATALOG_CACHE_TTL_SECS",
            &get_or_default("BESTIE_CATALOG_CACHE_TTL_SECS", DEFAULT_CATALOG_TTL_SECS),
        )?;

        let storage_dir = PathBuf::from(get_or_default("BESTIE_STORAGE_DIR", DEFAULT_STORAGE_DIR));
        if storage_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "BESTIE_STORAGE_DIR".to_string(),
                "must not be empty".to_string(),
            ));
        }

        Ok(Self {
            backend: BackendConfig {
                base_url,
                timeout,
                catalog_ttl,
            },
            storage_dir,
            currency_prefix: get_or_default("BESTIE_CURRENCY_PREFIX", DEFAULT_CURRENCY_PREFIX),
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an http(s) base URL.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected an http(s) URL, got '{value}'"),
        ));
    }
    Ok(url)
}

/// Parse a positive number of seconds.
fn parse_secs(key: &str, value: &str) -> Result<Duration, ConfigError> {
    let secs = value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}
