//! Dependency injection container.
//!
//! Wires the repository adapters (in-memory or Turso, chosen by
//! `PersistenceConfig`) behind the trait objects the service layer depends
//! on.

use std::sync::Arc;

use crate::config::{Config, PersistenceConfigError};
use crate::infrastructure::persistence::{
    AlertRepository, InMemoryPersistence, MetricsRepository, PricingPackRepository,
    TursoPersistence,
};

/// Holds the repository trait objects shared across the orchestrator,
/// pricing pack builder, metrics calculator, and alerting services.
pub struct Container {
    pricing_packs: Arc<dyn PricingPackRepository>,
    metrics: Arc<dyn MetricsRepository>,
    alerts: Arc<dyn AlertRepository>,
}

impl Container {
    /// Wire a container from trait objects directly (tests, or a caller that
    /// already holds a concrete persistence backend).
    #[must_use]
    pub fn new(
        pricing_packs: Arc<dyn PricingPackRepository>,
        metrics: Arc<dyn MetricsRepository>,
        alerts: Arc<dyn AlertRepository>,
    ) -> Self {
        Self {
            pricing_packs,
            metrics,
            alerts,
        }
    }

    /// Build a container against an in-memory store. Used in tests and local
    /// development when `persistence.enabled` is false.
    #[must_use]
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryPersistence::new());
        Self::new(store.clone(), store.clone(), store)
    }

    /// Build a container against Turso, per `config.persistence`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub async fn from_config(config: &Config) -> Result<Self, PersistenceConfigError> {
        if !config.persistence.enabled {
            return Ok(Self::in_memory());
        }
        let database_url = config.persistence.resolve_database_url()?;
        let backend = TursoPersistence::new_local(&database_url)
            .await
            .map_err(|e| PersistenceConfigError::ConnectionFailed(e.to_string()))?;
        let backend = Arc::new(backend);
        Ok(Self::new(backend.clone(), backend.clone(), backend))
    }

    /// The pricing pack repository.
    #[must_use]
    pub fn pricing_packs(&self) -> Arc<dyn PricingPackRepository> {
        Arc::clone(&self.pricing_packs)
    }

    /// The metrics repository.
    #[must_use]
    pub fn metrics(&self) -> Arc<dyn MetricsRepository> {
        Arc::clone(&self.metrics)
    }

    /// The alert repository.
    #[must_use]
    pub fn alerts(&self) -> Arc<dyn AlertRepository> {
        Arc::clone(&self.alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_container_wires_all_three_repositories() {
        let container = Container::in_memory();
        let _ = container.pricing_packs();
        let _ = container.metrics();
        let _ = container.alerts();
    }
}
