//! Dependencies shared by the catalog, pricing book and ledger.

use eventdesk_core::environment::{Clock, SystemClock, truncate_micros};
use eventdesk_core::repository::Repository;
use eventdesk_core::{DateTime, Utc};
use eventdesk_testing::InMemoryRepository;
use std::sync::Arc;

/// Environment dependencies for the registration services
#[derive(Clone)]
pub struct RegistryEnvironment {
    /// Clock for every time-based rule
    pub clock: Arc<dyn Clock>,
    /// Storage backend
    pub repository: Arc<dyn Repository>,
}

impl RegistryEnvironment {
    /// Creates a new `RegistryEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, repository: Arc<dyn Repository>) -> Self {
        Self { clock, repository }
    }

    /// System clock over a fresh in-memory repository.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(InMemoryRepository::new()))
    }

    /// Current instant according to the injected clock, at storage precision.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        truncate_micros(self.clock.now())
    }
}

impl std::fmt::Debug for RegistryEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEnvironment")
            .field("now", &self.now())
            .finish_non_exhaustive()
    }
}
