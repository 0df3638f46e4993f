//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPFLOOR_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`). Not needed when `SHOPFLOOR_STORE=memory`.
//!
//! ## Optional
//! - `SHOPFLOOR_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOPFLOOR_PORT` - Listen port (default: 3001)
//! - `SHOPFLOOR_BASE_URL` - Public URL (default: <http://localhost:3001>)
//! - `SHOPFLOOR_STORE` - `postgres` or `memory` (default: postgres)
//! - `SHOPFLOOR_LOG_FORMAT` - `text` or `json` (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0 to 1.0 (default: 0.0)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which store backs the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store '{other}' (expected postgres or memory)")),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected text or json)")),
        }
    }
}

/// Sentry error tracking settings.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

/// API application configuration.
///
/// Implements `Debug` manually to redact the database URL.
#[derive(Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, used to decide whether cookies are `Secure`
    pub base_url: String,
    pub store: StoreBackend,
    pub log_format: LogFormat,
    pub sentry: SentryConfig,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("store", &self.store)
            .field("log_format", &self.log_format)
            .field("sentry", &self.sentry)
            .finish()
    }
}

impl ApiConfig {
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

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let store: StoreBackend = env.parse_or("SHOPFLOOR_STORE", StoreBackend::default())?;
        let database_url = env
            .get("SHOPFLOOR_DATABASE_URL")
            // Fallback to generic DATABASE_URL (set by most Postgres hosts)
            .or_else(|| env.get("DATABASE_URL"))
            .map(SecretString::from);
        if store == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar(
                "SHOPFLOOR_DATABASE_URL".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            host: env.parse_or("SHOPFLOOR_HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?,
            port: env.parse_or("SHOPFLOOR_PORT", 3001)?,
            base_url: env
                .get("SHOPFLOOR_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3001".to_owned()),
            store,
            log_format: env.parse_or("SHOPFLOOR_LOG_FORMAT", LogFormat::default())?,
            sentry: SentryConfig {
                dsn: env.get("SENTRY_DSN"),
                environment: env.get("SENTRY_ENVIRONMENT"),
                sample_rate: env.rate("SENTRY_SAMPLE_RATE", 1.0)?,
                traces_sample_rate: env.rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
            },
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` flag.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get a variable, treating empty values as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
        })
    }

    fn rate(&self, key: &str, default: f32) -> Result<f32, ConfigError> {
        let rate: f32 = self.parse_or(key, default)?;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::InvalidEnvVar(
                key.to_owned(),
                format!("must be between 0.0 and 1.0 (got {rate})"),
            ));
        }
        Ok(rate)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ApiConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_database_url() {
        let config = load(&[("SHOPFLOOR_DATABASE_URL", "postgres://localhost/shop")]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3001");
        assert_eq!(config.store, StoreBackend::Postgres);
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(!config.secure_cookies());
        assert!((config.sentry.sample_rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://fallback/shop")]).unwrap();
        assert_eq!(
            config.database_url.unwrap().expose_secret(),
            "postgres://fallback/shop"
        );
    }

    #[test]
    fn test_database_url_required_for_postgres_only() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingEnvVar(_))));

        let config = load(&[("SHOPFLOOR_STORE", "memory")]).unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_invalid_values() {
        let base = ("SHOPFLOOR_STORE", "memory");
        assert!(matches!(
            load(&[base, ("SHOPFLOOR_PORT", "eighty")]),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "SHOPFLOOR_PORT"
        ));
        assert!(load(&[base, ("SHOPFLOOR_LOG_FORMAT", "xml")]).is_err());
        assert!(load(&[base, ("SENTRY_SAMPLE_RATE", "1.5")]).is_err());
        assert!(load(&[("SHOPFLOOR_STORE", "redis")]).is_err());
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config =
            load(&[("SHOPFLOOR_DATABASE_URL", "postgres://user:hunter2@db/shop")]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_https_base_url_enables_secure_cookies() {
        let config = load(&[
            ("SHOPFLOOR_STORE", "memory"),
            ("SHOPFLOOR_BASE_URL", "https://shop.example.com"),
        ])
        .unwrap();
        assert!(config.secure_cookies());
    }
}
