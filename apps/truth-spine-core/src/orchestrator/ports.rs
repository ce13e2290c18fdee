//! Ports the orchestrator reads ledger and pre-warm state through.
//!
//! The ledger is opaque outside its parser: the core only ever sees
//! `(security, quantity, cost_per_unit, cost_currency)` holdings, a cash
//! balance per currency, and the ledger's commit hash.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ledger::LedgerSnapshot;
use crate::domain::shared::{PackId, PortfolioId};
use crate::reconciliation::DatabaseSnapshot;

/// Errors reading ledger or database-side state.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to parse ledger: {0}")]
    ParseFailure(String),
    #[error("database read failed: {0}")]
    DatabaseRead(String),
}

/// Supplies the ledger and database snapshots the reconciler compares.
#[async_trait]
pub trait LedgerPort: Send + Sync {
    /// Portfolios in scope for tonight's reconciliation.
    async fn portfolios(&self) -> Result<Vec<PortfolioId>, LedgerError>;

    /// The parsed ledger snapshot for one portfolio.
    async fn ledger_snapshot(&self, portfolio_id: &PortfolioId) -> Result<LedgerSnapshot, LedgerError>;

    /// The database-side position snapshot for one portfolio as of the
    /// given pack.
    async fn database_snapshot(&self, portfolio_id: &PortfolioId, pack_id: &PackId) -> Result<DatabaseSnapshot, LedgerError>;
}

/// Errors from a non-blocking pre-warm step.
#[derive(Debug, Error)]
#[error("prewarm failed: {0}")]
pub struct PrewarmError(pub String);

/// Populates the non-blocking, latency-improving caches: factor exposures
/// and quality ratings. Failure here degrades serving latency, never
/// correctness, so the orchestrator logs and continues.
#[async_trait]
pub trait PrewarmPort: Send + Sync {
    async fn prewarm_factor_exposures(&self, portfolio_id: &PortfolioId, pack_id: &PackId) -> Result<(), PrewarmError>;
    async fn prewarm_ratings(&self, portfolio_id: &PortfolioId, pack_id: &PackId) -> Result<(), PrewarmError>;
}

/// A pre-warm port that does nothing, for deployments without a factor
/// model or ratings provider wired up yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpPrewarm;

#[async_trait]
impl PrewarmPort for NoOpPrewarm {
    async fn prewarm_factor_exposures(&self, _portfolio_id: &PortfolioId, _pack_id: &PackId) -> Result<(), PrewarmError> {
        Ok(())
    }

    async fn prewarm_ratings(&self, _portfolio_id: &PortfolioId, _pack_id: &PackId) -> Result<(), PrewarmError> {
        Ok(())
    }
}
