//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_TOKEN_SECRET` - Token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `STOREFRONT_MONGODB_URI` - MongoDB connection string (fallback `MONGODB_URI`,
//!   default: `mongodb://localhost:27017`)
//! - `STOREFRONT_DATABASE` - Database name (default: Ecommerce)
//! - `STOREFRONT_STORE` - `mongo` or `memory` (default: mongo)
//! - `STOREFRONT_HOST` - Bind address (default: 0.0.0.0)
//! - `STOREFRONT_PORT` - Listen port (fallback `PORT`, default: 8000)
//! - `STOREFRONT_CART_TIMEOUT_SECS` - Cart and checkout deadline (default: 5)
//! - `STOREFRONT_ACCOUNT_TIMEOUT_SECS` - Catalog, address and account deadline (default: 100)
//! - `STOREFRONT_ACCESS_TOKEN_TTL_HOURS` - Access token lifetime (default: 24)
//! - `STOREFRONT_REFRESH_TOKEN_TTL_HOURS` - Refresh token lifetime (default: 168)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0-1.0 (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::services::Deadlines;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
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

/// Which document store backs the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    /// In-process store; data is lost on restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store '{other}', expected 'mongo' or 'memory'")),
        }
    }
}

/// Document store configuration.
///
/// Implements `Debug` manually because the URI may embed credentials.
#[derive(Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// MongoDB connection string
    pub uri: SecretString,
    /// Database name
    pub database: String,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("uri", &"[REDACTED]")
            .field("database", &self.database)
            .finish()
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Document store
    pub store: StoreConfig,
    /// Token signing secret
    pub token_secret: SecretString,
    /// Access token lifetime
    pub access_token_ttl: chrono::Duration,
    /// Refresh token lifetime
    pub refresh_token_ttl: chrono::Duration,
    /// Per-operation deadlines
    pub deadlines: Deadlines,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup(env: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(env);

        let host = env
            .or_default("STOREFRONT_HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = env
            .get("STOREFRONT_PORT")
            .or_else(|| env.get("PORT"))
            .unwrap_or_else(|| "8000".to_string())
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;

        let store = StoreConfig::from_env(&env)?;

        let token_secret = env.validated_secret("STOREFRONT_TOKEN_SECRET")?;
        validate_secret_length(&token_secret, "STOREFRONT_TOKEN_SECRET")?;

        let access_hours: i64 = env.positive("STOREFRONT_ACCESS_TOKEN_TTL_HOURS", 24)?;
        let refresh_hours: i64 = env.positive("STOREFRONT_REFRESH_TOKEN_TTL_HOURS", 168)?;

        let deadlines = Deadlines {
            cart: Duration::from_secs(env.positive("STOREFRONT_CART_TIMEOUT_SECS", 5)?),
            account: Duration::from_secs(env.positive("STOREFRONT_ACCOUNT_TIMEOUT_SECS", 100)?),
        };

        Ok(Self {
            host,
            port,
            store,
            token_secret,
            access_token_ttl: chrono::Duration::hours(access_hours),
            refresh_token_ttl: chrono::Duration::hours(refresh_hours),
            deadlines,
            sentry_dsn: env.get("SENTRY_DSN"),
            sentry_environment: env.get("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: env.rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl StoreConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let backend = env
            .or_default("STOREFRONT_STORE", "mongo")
            .parse::<StoreBackend>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_STORE".to_string(), e))?;

        // Fallback to generic MONGODB_URI (set by most hosted MongoDB add-ons)
        let uri = env
            .get("STOREFRONT_MONGODB_URI")
            .or_else(|| env.get("MONGODB_URI"))
            .unwrap_or_else(|| DEFAULT_MONGODB_URI.to_string());

        Ok(Self {
            backend,
            uri: SecretString::from(uri),
            database: env.or_default("STOREFRONT_DATABASE", "Ecommerce"),
        })
    }

    /// Load only the store settings, for tools that don't serve HTTP.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `STOREFRONT_STORE` is unknown.
    pub fn from_env_only() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_env(&Env(&|key| std::env::var(key).ok()))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with typed accessors.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable; empty values count as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a strictly positive integer with a default.
    fn positive<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + PartialOrd + Default,
        T::Err: std::fmt::Display,
    {
        let Some(raw) = self.get(key) else {
            return Ok(default);
        };
        let value = raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
        if value <= T::default() {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        Ok(value)
    }

    /// Parse a sampling rate in `0.0..=1.0` with a default.
    fn rate(&self, key: &str, default: f32) -> Result<f32, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(default);
        };
        let value = raw
            .trim()
            .parse::<f32>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(value)
    }

    /// Load and validate a secret.
    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }
}

/// Validate that a secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real secrets (random keys) have high entropy
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TOKEN_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%dE8";

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(&move |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("STOREFRONT_TOKEN_SECRET", TOKEN_SECRET)]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8000");
        assert_eq!(config.store.backend, StoreBackend::Mongo);
        assert_eq!(config.store.uri.expose_secret(), DEFAULT_MONGODB_URI);
        assert_eq!(config.store.database, "Ecommerce");
        assert_eq!(config.deadlines, Deadlines::default());
        assert_eq!(config.access_token_ttl, chrono::Duration::hours(24));
        assert_eq!(config.refresh_token_ttl, chrono::Duration::hours(168));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_fallback_variables() {
        let config = load(&[
            ("STOREFRONT_TOKEN_SECRET", TOKEN_SECRET),
            ("PORT", "9090"),
            ("MONGODB_URI", "mongodb://db:27017"),
            ("STOREFRONT_STORE", "memory"),
            ("STOREFRONT_CART_TIMEOUT_SECS", "2"),
        ])
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.store.uri.expose_secret(), "mongodb://db:27017");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.deadlines.cart, Duration::from_secs(2));
    }

    #[test]
    fn test_missing_token_secret() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        for (key, value) in [
            ("STOREFRONT_PORT", "http"),
            ("STOREFRONT_STORE", "postgres"),
            ("STOREFRONT_CART_TIMEOUT_SECS", "0"),
            ("SENTRY_SAMPLE_RATE", "1.5"),
        ] {
            let result = load(&[("STOREFRONT_TOKEN_SECRET", TOKEN_SECRET), (key, value)]);
            assert!(
                matches!(result, Err(ConfigError::InvalidEnvVar(ref k, _)) if k == key),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-token-secret-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_short_token_secret_rejected() {
        let result = load(&[("STOREFRONT_TOKEN_SECRET", "aB3$xY9!mK2@nL5#")]);
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_token_secret_length_boundary() {
        let at_minimum = &TOKEN_SECRET[..MIN_TOKEN_SECRET_LENGTH];
        assert!(load(&[("STOREFRONT_TOKEN_SECRET", at_minimum)]).is_ok());

        let one_short = &TOKEN_SECRET[..MIN_TOKEN_SECRET_LENGTH - 1];
        assert!(matches!(
            load(&[("STOREFRONT_TOKEN_SECRET", one_short)]),
            Err(ConfigError::InsecureSecret(_, _))
        ));
    }

    #[test]
    fn test_store_config_debug_redacts_uri() {
        let config = StoreConfig {
            backend: StoreBackend::Mongo,
            uri: SecretString::from("mongodb://admin:hunter2@db:27017"),
            database: "Ecommerce".to_string(),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2"));
    }
}
