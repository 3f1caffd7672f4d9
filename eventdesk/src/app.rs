//! Application wiring: one environment shared by the three services.

use crate::catalog::Catalog;
use crate::config::{Config, ConfigError};
use crate::environment::RegistryEnvironment;
use crate::ledger::RegistrationLedger;
use crate::pricing::PricingBook;
use eventdesk_core::environment::{Clock, SystemClock};
use eventdesk_core::error::RegistryError;
use eventdesk_postgres::PostgresRepository;
use eventdesk_testing::InMemoryRepository;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use thiserror::Error;

/// Startup errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend unreachable or migration failed
    #[error("Storage error: {0}")]
    Storage(#[from] RegistryError),
}

/// The registration engine.
///
/// All three services share the same clock and repository, so a seat freed
/// through the ledger is immediately visible to the catalog.
#[derive(Clone, Debug)]
pub struct EventDesk {
    /// Categories and events
    pub catalog: Catalog,
    /// Ticket pricing
    pub pricing: PricingBook,
    /// Registrations
    pub ledger: RegistrationLedger,
}

impl EventDesk {
    /// Build the services over an environment.
    #[must_use]
    pub fn new(env: RegistryEnvironment) -> Self {
        Self {
            catalog: Catalog::new(env.clone()),
            pricing: PricingBook::new(env.clone()),
            ledger: RegistrationLedger::new(env),
        }
    }

    /// In-memory engine on the system clock.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(RegistryEnvironment::in_memory())
    }

    /// In-memory engine on the given clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::new(RegistryEnvironment::new(clock, Arc::new(InMemoryRepository::new())))
    }

    /// Build the engine described by `config`.
    ///
    /// With a database URL this connects a `PostgreSQL` pool (running the
    /// embedded migrations unless disabled); otherwise it falls back to the
    /// in-memory repository.
    ///
    /// # Errors
    ///
    /// [`AppError::Config`] for an invalid configuration,
    /// [`AppError::Storage`] if the database is unreachable or migrations fail.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        config.validate()?;

        let Some(url) = config.database.url.as_deref() else {
            tracing::info!("No DATABASE_URL set, using in-memory repository");
            return Ok(Self::in_memory());
        };

        let options = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .acquire_timeout(config.database.connect_timeout())
            .idle_timeout(Some(config.database.idle_timeout()));
        let repository = PostgresRepository::connect_with(url, options).await?;
        tracing::info!(
            max_connections = config.database.max_connections,
            "Connected to PostgreSQL"
        );

        if config.database.run_migrations {
            repository.migrate().await?;
            tracing::info!("Migrations applied");
        }

        Ok(Self::new(RegistryEnvironment::new(Arc::new(SystemClock), Arc::new(repository))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_without_url_is_in_memory() {
        let config = Config::from_lookup(|_| None);
        let desk = EventDesk::connect(&config).await;
        assert!(desk.is_ok());
    }

    #[tokio::test]
    async fn connect_rejects_invalid_config() {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("mysql://localhost/events".to_string()),
            _ => None,
        });
        assert!(matches!(EventDesk::connect(&config).await, Err(AppError::Config(_))));
    }
}
