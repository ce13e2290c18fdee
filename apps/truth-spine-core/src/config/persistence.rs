//! Turso persistence configuration.

use serde::{Deserialize, Serialize};

/// Turso persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Enable durable persistence (disable only for in-memory test runs).
    #[serde(default = "default_persistence_enabled")]
    pub enabled: bool,
    /// Turso database URL (local file path or `libsql://` remote URL).
    /// If not set, resolved from the `DATABASE_URL` environment variable.
    #[serde(default)]
    pub database_url: Option<String>,
    /// Snapshot interval in seconds (how often the ledger snapshot commit
    /// cursor is checkpointed).
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval_secs: u64,
    /// Maximum connection pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: default_persistence_enabled(),
            database_url: None,
            snapshot_interval_secs: default_snapshot_interval(),
            max_connections: default_max_connections(),
        }
    }
}

impl PersistenceConfig {
    /// Resolve the database URL.
    ///
    /// Priority:
    /// 1. Config file `database_url` if set
    /// 2. `DATABASE_URL` environment variable
    ///
    /// # Errors
    ///
    /// Returns an error if no database URL can be resolved.
    pub fn resolve_database_url(&self) -> Result<String, PersistenceConfigError> {
        if let Some(url) = &self.database_url
            && !url.is_empty()
        {
            return Ok(url.clone());
        }

        if let Ok(url) = std::env::var("DATABASE_URL")
            && !url.is_empty()
        {
            return Ok(url);
        }

        Err(PersistenceConfigError::MissingDatabaseUrl(
            "No database URL found. Set database_url in config or the DATABASE_URL environment variable.".to_string(),
        ))
    }
}

const fn default_persistence_enabled() -> bool {
    true
}

const fn default_snapshot_interval() -> u64 {
    60
}

const fn default_max_connections() -> u32 {
    5
}

/// Errors from persistence configuration.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceConfigError {
    /// Missing database URL.
    #[error("Missing database URL: {0}")]
    MissingDatabaseUrl(String),
    /// The database could not be opened or migrated.
    #[error("Failed to connect to persistence backend: {0}")]
    ConnectionFailed(String),
}
