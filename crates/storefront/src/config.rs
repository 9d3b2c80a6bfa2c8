//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: <http://localhost:3000>)
//! - `STOREFRONT_DB_MAX_CONNECTIONS` - Pool size (default: 20)
//! - `STOREFRONT_DB_ACQUIRE_TIMEOUT_SECS` - Pool acquire timeout (default: 2)
//! - `STOREFRONT_DB_IDLE_TIMEOUT_SECS` - Idle connection timeout (default: 30)
//! - `STOREFRONT_CHECKOUT_MAX_ATTEMPTS` - Checkout attempts on serialization conflicts (default: 10)
//! - `STOREFRONT_CORS_ORIGINS` - Comma-separated allowed origins (default: any origin)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Checkout attempts when `STOREFRONT_CHECKOUT_MAX_ATTEMPTS` is unset.
pub const DEFAULT_CHECKOUT_MAX_ATTEMPTS: u32 = 10;

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
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Store connection settings
    pub database: DatabaseConfig,
    /// Attempts per checkout when the store reports a serialization conflict
    pub checkout_max_attempts: u32,
    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// `PostgreSQL` connection pool settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub url: SecretString,
    /// Maximum pooled connections
    pub max_connections: u32,
    /// How long a request waits for a free connection
    pub acquire_timeout: Duration,
    /// How long an unused connection stays open
    pub idle_timeout: Duration,
}

impl DatabaseConfig {
    /// Pool settings with the defaults used by the storefront.
    #[must_use]
    pub const fn with_url(url: SecretString) -> Self {
        Self {
            url,
            max_connections: 20,
            acquire_timeout: Duration::from_secs(2),
            idle_timeout: Duration::from_secs(30),
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

        let host = parse_env_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:3000");

        let database = DatabaseConfig {
            max_connections: parse_env_or_default("STOREFRONT_DB_MAX_CONNECTIONS", "20")?,
            acquire_timeout: Duration::from_secs(parse_env_or_default(
                "STOREFRONT_DB_ACQUIRE_TIMEOUT_SECS",
                "2",
            )?),
            idle_timeout: Duration::from_secs(parse_env_or_default(
                "STOREFRONT_DB_IDLE_TIMEOUT_SECS",
                "30",
            )?),
            ..DatabaseConfig::with_url(get_database_url("STOREFRONT_DATABASE_URL")?)
        };

        let checkout_max_attempts = parse_env_or_default::<u32>(
            "STOREFRONT_CHECKOUT_MAX_ATTEMPTS",
            &DEFAULT_CHECKOUT_MAX_ATTEMPTS.to_string(),
        )?;
        if checkout_max_attempts == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_CHECKOUT_MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let cors_origins = get_optional_env("STOREFRONT_CORS_ORIGINS")
            .map(|raw| parse_origin_list(&raw))
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            base_url,
            database,
            checkout_max_attempts,
            cors_origins,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Split a comma-separated origin list, dropping blanks and trailing slashes.
fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            database: DatabaseConfig::with_url(SecretString::from("postgres://localhost/tienda")),
            checkout_max_attempts: DEFAULT_CHECKOUT_MAX_ATTEMPTS,
            cors_origins: Vec::new(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_secure_follows_scheme() {
        let mut config = test_config();
        assert!(!config.is_secure());

        config.base_url = "https://tienda.example.com".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_database_defaults_match_pool_settings() {
        let db = DatabaseConfig::with_url(SecretString::from("postgres://localhost/tienda"));
        assert_eq!(db.max_connections, 20);
        assert_eq!(db.acquire_timeout, Duration::from_secs(2));
        assert_eq!(db.idle_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_checkout_attempts_default_parses() {
        let attempts: u32 = parse_env_or_default(
            "TIENDA_TEST_SURELY_UNSET_ATTEMPTS_VARIABLE",
            &DEFAULT_CHECKOUT_MAX_ATTEMPTS.to_string(),
        )
        .unwrap();
        assert_eq!(attempts, 10);
    }

    #[test]
    fn test_database_url_is_redacted_in_debug() {
        let db = DatabaseConfig::with_url(SecretString::from("postgres://u:hunter2@db/tienda"));
        let debug_output = format!("{db:?}");
        assert!(!debug_output.contains("hunter2"));
    }

    #[test]
    fn test_parse_origin_list() {
        assert_eq!(
            parse_origin_list(" https://a.example.com/, ,http://localhost:5173"),
            vec![
                "https://a.example.com".to_string(),
                "http://localhost:5173".to_string()
            ]
        );
        assert!(parse_origin_list(" , ").is_empty());
    }

    #[test]
    fn test_parse_env_or_default_uses_default() {
        let value: u16 =
            parse_env_or_default("TIENDA_TEST_SURELY_UNSET_PORT_VARIABLE", "8080").unwrap();
        assert_eq!(value, 8080);
    }

    #[test]
    fn test_parse_env_or_default_reports_bad_default() {
        let err = parse_env_or_default::<u16>("TIENDA_TEST_SURELY_UNSET_VARIABLE", "abc")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "TIENDA_TEST_SURELY_UNSET_VARIABLE"));
    }
}
