//! Configuration management for Eventdesk.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Without `DATABASE_URL` the engine runs on the in-memory repository.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default tracing filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,eventdesk=debug,sqlx=warn";

/// Invalid configuration detected by [`Config::validate`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A value is present but unusable.
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue {
        /// Environment variable name
        key: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storage configuration
    pub database: DatabaseConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// `PostgreSQL` configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL (`None` selects the in-memory repository)
    pub url: Option<String>,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections in the pool
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout: u64,
    /// Idle timeout in seconds (connections idle longer than this are closed)
    pub idle_timeout: u64,
    /// Run embedded migrations at startup
    pub run_migrations: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive string
    pub filter: String,
}

impl DatabaseConfig {
    /// Connection timeout as a [`Duration`].
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Idle timeout as a [`Duration`].
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }
}

fn parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key).and_then(|s| s.parse().ok()).unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unparsable numeric or boolean values fall back to their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
                max_connections: parsed(&lookup, "DATABASE_MAX_CONNECTIONS", 10),
                min_connections: parsed(&lookup, "DATABASE_MIN_CONNECTIONS", 1),
                connect_timeout: parsed(&lookup, "DATABASE_CONNECT_TIMEOUT", 30),
                idle_timeout: parsed(&lookup, "DATABASE_IDLE_TIMEOUT", 600),
                run_migrations: parsed(&lookup, "DATABASE_RUN_MIGRATIONS", true),
            },
            logging: LoggingConfig {
                filter: lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            },
        }
    }

    /// Whether a `PostgreSQL` backend is configured.
    #[must_use]
    pub const fn uses_postgres(&self) -> bool {
        self.database.url.is_some()
    }

    /// Check cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a non-postgres URL, a zero
    /// pool size or a minimum above the maximum.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.database.url {
            if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
                return Err(ConfigError::InvalidValue {
                    key: "DATABASE_URL",
                    reason: "expected a postgres:// or postgresql:// URL".to_string(),
                });
            }
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DATABASE_MAX_CONNECTIONS",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::InvalidValue {
                key: "DATABASE_MIN_CONNECTIONS",
                reason: format!(
                    "{} exceeds DATABASE_MAX_CONNECTIONS ({})",
                    self.database.min_connections, self.database.max_connections
                ),
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_select_in_memory() {
        let config = Config::default();
        assert!(!config.uses_postgres());
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reads_database_settings() {
        let config = config(&[
            ("DATABASE_URL", "postgres://localhost/eventdesk"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("DATABASE_RUN_MIGRATIONS", "false"),
            ("DATABASE_CONNECT_TIMEOUT", "not-a-number"),
        ]);
        assert!(config.uses_postgres());
        assert_eq!(config.database.max_connections, 4);
        assert!(!config.database.run_migrations);
        assert_eq!(config.database.connect_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn blank_url_means_in_memory() {
        assert!(!config(&[("DATABASE_URL", "  ")]).uses_postgres());
    }

    #[test]
    fn validate_rejects_inconsistent_pool() {
        let config = config(&[
            ("DATABASE_MAX_CONNECTIONS", "2"),
            ("DATABASE_MIN_CONNECTIONS", "5"),
        ]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                key: "DATABASE_MIN_CONNECTIONS",
                ..
            })
        ));
    }

    #[test]
    fn validate_rejects_foreign_scheme() {
        let config = config(&[("DATABASE_URL", "mysql://localhost/db")]);
        assert!(config.validate().is_err());
    }
}
