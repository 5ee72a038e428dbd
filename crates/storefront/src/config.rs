//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_CURRENCY` - Display currency for totals (default: USD)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance traces sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

use bazaar_core::CurrencyCode;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Currency basket totals are displayed in
    pub currency: CurrencyCode,
    /// Error tracking configuration
    pub sentry: SentryConfig,
}

/// Sentry error tracking configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SentryConfig {
    /// DSN; `None` disables Sentry entirely
    pub dsn: Option<String>,
    /// Environment tag attached to events
    pub environment: Option<String>,
    /// Fraction of errors sent
    pub sample_rate: f32,
    /// Fraction of transactions traced
    pub traces_sample_rate: f32,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            sample_rate: 1.0,
            traces_sample_rate: 0.0,
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
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let database_url = env
            .optional("STOREFRONT_DATABASE_URL")
            .or_else(|| env.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("STOREFRONT_DATABASE_URL".to_string()))?;
        let host = env.parse_or("STOREFRONT_HOST", "127.0.0.1")?;
        let port = env.parse_or("STOREFRONT_PORT", "3000")?;
        let base_url = env.required("STOREFRONT_BASE_URL")?;
        let currency = env.parse_or("STOREFRONT_CURRENCY", "USD")?;

        let sentry = SentryConfig {
            dsn: env.optional("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            environment: env.optional("SENTRY_ENVIRONMENT"),
            sample_rate: env.parse_or("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: env.parse_or("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            currency,
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must be marked `Secure`.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse a variable, using `default` when it is unset.
    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.optional(key).unwrap_or_else(|| default.to_string());
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| map.get(key).cloned())
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("STOREFRONT_DATABASE_URL", "postgres://localhost/bazaar"),
        ("STOREFRONT_BASE_URL", "http://localhost:3000"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(MINIMAL).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.currency, CurrencyCode::USD);
        assert_eq!(config.sentry, SentryConfig::default());
        assert!(!config.secure_cookies());
    }

    #[test]
    fn test_missing_base_url() {
        let err = load(&[("STOREFRONT_DATABASE_URL", "postgres://localhost/bazaar")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "STOREFRONT_BASE_URL"));
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[
            ("DATABASE_URL", "postgres://fly/bazaar"),
            ("STOREFRONT_BASE_URL", "https://shop.example.com"),
        ])
        .unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fly/bazaar");
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_missing_database_url() {
        let err = load(&[("STOREFRONT_BASE_URL", "http://localhost:3000")]).unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingEnvVar(ref key) if key == "STOREFRONT_DATABASE_URL")
        );
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("STOREFRONT_PORT", "seventy"));
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_currency_and_sentry() {
        let mut vars = MINIMAL.to_vec();
        vars.extend([
            ("STOREFRONT_CURRENCY", "eur"),
            ("SENTRY_DSN", "https://key@o0.ingest.sentry.io/1"),
            ("SENTRY_ENVIRONMENT", "staging"),
            ("SENTRY_TRACES_SAMPLE_RATE", "0.25"),
        ]);
        let config = load(&vars).unwrap();
        assert_eq!(config.currency, CurrencyCode::EUR);
        assert_eq!(config.sentry.environment.as_deref(), Some("staging"));
        assert!(config.sentry.dsn.is_some());
        assert!((config.sentry.traces_sample_rate - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_sentry_dsn_disables() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("SENTRY_DSN", ""));
        assert!(load(&vars).unwrap().sentry.dsn.is_none());
    }

    #[test]
    fn test_database_url_not_in_debug() {
        let config = load(MINIMAL).unwrap();
        assert!(!format!("{config:?}").contains("postgres://localhost/bazaar"));
    }
}
