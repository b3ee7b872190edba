//! Portal configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `COUGARPOST_API_URL` - Backend API root (http or https)
//!
//! ## Optional
//! - `COUGARPOST_STATE_DIR` - Where the session is persisted (default: .cougarpost)
//! - `COUGARPOST_RATE_TABLE` - `customer` or `clerk` for every role (default: by role)
//! - `COUGARPOST_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::pricing::RateTableKind;

const DEFAULT_STATE_DIR: &str = ".cougarpost";
const DEFAULT_TIMEOUT_SECS: &str = "10";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Portal configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Backend API settings
    pub api: ApiConfig,
    /// Directory holding the persisted session
    pub state_dir: PathBuf,
    /// Rate table forced on every package quote; `None` picks it by role
    pub rate_table: Option<RateTableKind>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Backend API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API root, e.g. `https://cougarpost.example/api`
    pub base_url: Url,
    /// Timeout applied to every request
    pub timeout: Duration,
}

impl PortalConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        Ok(Self {
            api: ApiConfig {
                base_url: env.api_url("COUGARPOST_API_URL")?,
                timeout: env.timeout("COUGARPOST_HTTP_TIMEOUT_SECS")?,
            },
            state_dir: PathBuf::from(env.or_default("COUGARPOST_STATE_DIR", DEFAULT_STATE_DIR)),
            rate_table: env
                .optional("COUGARPOST_RATE_TABLE")
                .map(|value| value.trim().parse())
                .transpose()
                .map_err(|e| ConfigError::InvalidEnvVar("COUGARPOST_RATE_TABLE".to_string(), e))?,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable, treating blank as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn api_url(&self, key: &str) -> Result<Url, ConfigError> {
        let url = Url::parse(self.required(key)?.trim())
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("scheme must be http or https (got {})", url.scheme()),
            ));
        }
        Ok(url)
    }

    fn timeout(&self, key: &str) -> Result<Duration, ConfigError> {
        let secs = self
            .or_default(key, DEFAULT_TIMEOUT_SECS)
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
}
