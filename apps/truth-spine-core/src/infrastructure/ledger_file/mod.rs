//! File-based [`LedgerPort`](crate::orchestrator::LedgerPort) adapter.
//!
//! The ledger itself is opaque to the core (spec: "consumed through a
//! parser that yields, per account, a list of holdings plus a cash balance
//! per currency"). This adapter is that parser for local development and
//! tests: it reads a JSON manifest rather than talking to a real ledger
//! system, so the nightly pipeline can be exercised end-to-end without one.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::ledger::LedgerSnapshot;
use crate::domain::shared::{PackId, PortfolioId};
use crate::orchestrator::{LedgerError, LedgerPort};
use crate::reconciliation::DatabaseSnapshot;

/// One portfolio's ledger and database-side books, as recorded in the
/// manifest file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioBooks {
    pub portfolio_id: String,
    pub ledger: LedgerSnapshot,
    pub database: DatabaseSnapshot,
}

/// The on-disk shape: one entry per portfolio in scope for tonight's run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LedgerManifest {
    pub portfolios: Vec<PortfolioBooks>,
}

/// Reads a [`LedgerManifest`] from a JSON file and serves it through
/// [`LedgerPort`].
pub struct JsonLedgerSource {
    path: PathBuf,
}

impl JsonLedgerSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<LedgerManifest, LedgerError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| LedgerError::ParseFailure(format!("reading {}: {e}", self.path.display())))?;
        serde_json::from_str(&contents).map_err(|e| LedgerError::ParseFailure(format!("parsing {}: {e}", self.path.display())))
    }

    async fn entry(&self, portfolio_id: &PortfolioId) -> Result<PortfolioBooks, LedgerError> {
        let manifest = self.load().await?;
        manifest
            .portfolios
            .into_iter()
            .find(|p| p.portfolio_id == portfolio_id.as_str())
            .ok_or_else(|| LedgerError::ParseFailure(format!("no ledger entry for portfolio {portfolio_id}")))
    }
}

#[async_trait]
impl LedgerPort for JsonLedgerSource {
    async fn portfolios(&self) -> Result<Vec<PortfolioId>, LedgerError> {
        let manifest = self.load().await?;
        Ok(manifest.portfolios.into_iter().map(|p| PortfolioId::new(p.portfolio_id)).collect())
    }

    async fn ledger_snapshot(&self, portfolio_id: &PortfolioId) -> Result<LedgerSnapshot, LedgerError> {
        Ok(self.entry(portfolio_id).await?.ledger)
    }

    async fn database_snapshot(&self, portfolio_id: &PortfolioId, _pack_id: &PackId) -> Result<DatabaseSnapshot, LedgerError> {
        Ok(self.entry(portfolio_id).await?.database)
    }
}

/// A ledger port with no portfolios in scope, used when no manifest is
/// configured. Lets the nightly pipeline still run to completion (an empty
/// reconciliation universe is a legitimate, if unusual, deployment state)
/// rather than requiring a ledger source to exist before the pipeline can
/// be exercised at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyLedgerSource;

#[async_trait]
impl LedgerPort for EmptyLedgerSource {
    async fn portfolios(&self) -> Result<Vec<PortfolioId>, LedgerError> {
        Ok(Vec::new())
    }

    async fn ledger_snapshot(&self, portfolio_id: &PortfolioId) -> Result<LedgerSnapshot, LedgerError> {
        Err(LedgerError::ParseFailure(format!("no ledger source configured for {portfolio_id}")))
    }

    async fn database_snapshot(&self, portfolio_id: &PortfolioId, _pack_id: &PackId) -> Result<DatabaseSnapshot, LedgerError> {
        Err(LedgerError::ParseFailure(format!("no ledger source configured for {portfolio_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_manifest() -> LedgerManifest {
        LedgerManifest {
            portfolios: vec![PortfolioBooks {
                portfolio_id: "pf-1".to_string(),
                ledger: LedgerSnapshot {
                    commit_hash: "abc123".to_string(),
                    captured_at: Utc::now(),
                    holdings: vec![],
                    cash_balances: HashMap::new(),
                },
                database: DatabaseSnapshot { positions: vec![], cash_balances: vec![] },
            }],
        }
    }

    #[tokio::test]
    async fn reads_portfolios_and_snapshots_from_a_manifest_file() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("ledger-manifest-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, serde_json::to_vec(&sample_manifest()).unwrap()).await.unwrap();

        let source = JsonLedgerSource::new(path.clone());
        let portfolios = source.portfolios().await.unwrap();
        assert_eq!(portfolios, vec![PortfolioId::new("pf-1")]);

        let snapshot = source.ledger_snapshot(&PortfolioId::new("pf-1")).await.unwrap();
        assert_eq!(snapshot.commit_hash, "abc123");

        tokio::fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn empty_ledger_source_reports_no_portfolios() {
        let source = EmptyLedgerSource;
        assert!(source.portfolios().await.unwrap().is_empty());
    }
}
