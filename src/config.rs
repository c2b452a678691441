//! Environment-driven configuration for the `PostgreSQL` adapters.
//!
//! Values come from the process environment, optionally seeded from a
//! `.env` file in the working directory.

use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Environment variable holding the database connection URL.
pub const DATABASE_URL: &str = "DATABASE_URL";
/// Environment variable holding the pool size.
pub const DATABASE_MAX_CONNECTIONS: &str = "DATABASE_MAX_CONNECTIONS";
/// Environment variable holding the connection checkout timeout in seconds.
pub const DATABASE_CONNECT_TIMEOUT_SECS: &str = "DATABASE_CONNECT_TIMEOUT_SECS";

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Errors raised while reading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("{0} must be set")]
    Missing(&'static str),
    /// A numeric variable could not be parsed.
    #[error("{name} must be a positive integer, got {value:?}")]
    InvalidNumber {
        /// Variable name.
        name: &'static str,
        /// Raw value found.
        value: String,
    },
}

/// Connection settings for the `PostgreSQL` pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    database_url: String,
    max_connections: u32,
    connect_timeout: Duration,
}

impl PostgresConfig {
    /// Creates a configuration with default pool settings.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    /// Loads `.env` when present, then reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `DATABASE_URL` is missing or a numeric
    /// variable is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            debug!(error = %err, "no .env file loaded");
        }
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `DATABASE_URL` is missing or a numeric
    /// variable is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(DATABASE_URL)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing(DATABASE_URL))?;
        let max_connections =
            parse_positive(&lookup, DATABASE_MAX_CONNECTIONS, DEFAULT_MAX_CONNECTIONS)?;
        let timeout_secs = parse_positive(
            &lookup,
            DATABASE_CONNECT_TIMEOUT_SECS,
            DEFAULT_CONNECT_TIMEOUT_SECS,
        )?;

        Ok(Self {
            database_url,
            max_connections,
            connect_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Overrides the pool size.
    #[must_use]
    pub const fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Overrides the connection checkout timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Returns the database connection URL.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Returns the pool size.
    #[must_use]
    pub const fn max_connections(&self) -> u32 {
        self.max_connections
    }

    /// Returns the connection checkout timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

fn parse_positive<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd + From<u8>,
{
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };
    let invalid = || ConfigError::InvalidNumber {
        name,
        value: raw.clone(),
    };
    let parsed = raw.trim().parse::<T>().map_err(|_| invalid())?;
    if parsed < T::from(1) {
        return Err(invalid());
    }
    Ok(parsed)
}
