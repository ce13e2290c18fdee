//! The nightly sacred-order pipeline.
//!
//! Grounded on `original_source/DawsOSP/backend/jobs/scheduler.py`'s
//! `run_nightly_job`: build the pack, reconcile every portfolio against it,
//! then only once both have passed compute metrics, pre-warm the
//! latency-improving caches, mark the pack servable, and evaluate alerts.
//! Steps 1, 2 and 6 are blocking — a failure there stops the pipeline with
//! the pack left un-promoted; steps 3, 4, 5 and 7 are best-effort and never
//! stop the run.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use super::metrics_step::DailyMetricsEngine;
use super::ports::{LedgerPort, PrewarmPort};
use super::report::{NightlyRunReport, StepReport};
use crate::alerting::AlertEvaluator;
use crate::domain::pricing_pack::FxRate;
use crate::domain::shared::{PackId, Symbol};
use crate::infrastructure::persistence::PricingPackRepository;
use crate::pricing::PricingPackBuilder;
use crate::reconciliation::{DatabaseSnapshot, ReconciliationStatus, Reconciler};

/// Wires every port the nightly pipeline needs and drives the seven sacred
/// steps in order.
pub struct NightlyOrchestrator {
    builder: Arc<PricingPackBuilder>,
    reconciler: Reconciler,
    ledger: Arc<dyn LedgerPort>,
    pack_repo: Arc<dyn PricingPackRepository>,
    metrics: DailyMetricsEngine,
    prewarm: Arc<dyn PrewarmPort>,
    alerts: Arc<AlertEvaluator>,
    securities: Vec<Symbol>,
    fx_pairs: Vec<(String, String)>,
    policy: String,
    base_ccy: String,
}

impl NightlyOrchestrator {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        builder: Arc<PricingPackBuilder>,
        reconciler: Reconciler,
        ledger: Arc<dyn LedgerPort>,
        pack_repo: Arc<dyn PricingPackRepository>,
        metrics: DailyMetricsEngine,
        prewarm: Arc<dyn PrewarmPort>,
        alerts: Arc<AlertEvaluator>,
        securities: Vec<Symbol>,
        fx_pairs: Vec<(String, String)>,
        policy: String,
        base_ccy: String,
    ) -> Self {
        Self {
            builder,
            reconciler,
            ledger,
            pack_repo,
            metrics,
            prewarm,
            alerts,
            securities,
            fx_pairs,
            policy,
            base_ccy,
        }
    }

    /// Run the full nightly pipeline for `asof_date`. `reason` forces a
    /// pricing pack rebuild (the restatement path); pass `None` for the
    /// normal nightly run.
    pub async fn run(&self, asof_date: NaiveDate, reason: Option<&str>) -> NightlyRunReport {
        let started_at = Utc::now();
        let mut steps = Vec::with_capacity(7);

        let pack_id = match self.step_build_pack(asof_date, reason).await {
            Ok((report, pack_id)) => {
                steps.push(report);
                pack_id
            }
            Err(report) => {
                steps.push(report);
                return self.finish(asof_date, started_at, steps, Some("build_pricing_pack"));
            }
        };

        let (reconcile_report, portfolio_snapshots, reconciled) = self.step_reconcile(asof_date, &pack_id).await;
        let reconcile_failed = !reconcile_report.success;
        steps.push(reconcile_report);
        if reconcile_failed {
            return self.finish(asof_date, started_at, steps, Some("reconcile_ledger"));
        }

        steps.push(self.step_compute_metrics(asof_date, &pack_id, &portfolio_snapshots).await);
        steps.push(self.step_prewarm_factor_exposures(asof_date, &pack_id, &reconciled).await);
        steps.push(self.step_prewarm_ratings(asof_date, &pack_id, &reconciled).await);

        let mark_fresh_report = self.step_mark_fresh(&pack_id).await;
        let mark_fresh_failed = !mark_fresh_report.success;
        steps.push(mark_fresh_report);
        if mark_fresh_failed {
            return self.finish(asof_date, started_at, steps, Some("mark_pack_fresh"));
        }

        steps.push(self.step_evaluate_alerts(asof_date).await);

        self.finish(asof_date, started_at, steps, None)
    }

    fn finish(
        &self,
        asof_date: NaiveDate,
        started_at: chrono::DateTime<Utc>,
        steps: Vec<StepReport>,
        blocked_at: Option<&'static str>,
    ) -> NightlyRunReport {
        let completed_at = Utc::now();
        let duration_ms = (completed_at - started_at).num_milliseconds().max(0) as u64;
        if let Some(step) = blocked_at {
            error!(%asof_date, blocked_at = step, "nightly pipeline blocked");
        } else {
            info!(%asof_date, duration_ms, "nightly pipeline completed");
        }
        #[allow(clippy::cast_precision_loss)]
        for step in &steps {
            let status = if step.success { "ok" } else { "failed" };
            crate::observability::record_step(step.name, status, step.duration_ms as f64 / 1000.0);
        }
        NightlyRunReport {
            run_date: asof_date,
            started_at,
            completed_at,
            duration_ms,
            success: blocked_at.is_none(),
            blocked_at,
            steps,
        }
    }

    async fn step_build_pack(&self, asof_date: NaiveDate, reason: Option<&str>) -> Result<(StepReport, PackId), StepReport> {
        let started = Utc::now();
        match self.builder.build(asof_date, &self.policy, &self.securities, &self.fx_pairs, reason).await {
            Ok(pack_id) => Ok((StepReport::ok("build_pricing_pack", elapsed_ms(started)), pack_id)),
            Err(err) => Err(StepReport::failed("build_pricing_pack", elapsed_ms(started), err.to_string())),
        }
    }

    async fn step_reconcile(
        &self,
        asof_date: NaiveDate,
        pack_id: &PackId,
    ) -> (StepReport, Vec<(crate::domain::shared::PortfolioId, DatabaseSnapshot)>, Vec<crate::domain::shared::PortfolioId>) {
        let started = Utc::now();
        let portfolios = match self.ledger.portfolios().await {
            Ok(portfolios) => portfolios,
            Err(err) => return (StepReport::failed("reconcile_ledger", elapsed_ms(started), err.to_string()), Vec::new(), Vec::new()),
        };

        let mut snapshots = Vec::with_capacity(portfolios.len());
        let mut reconciled = Vec::with_capacity(portfolios.len());
        let mut failures = Vec::new();

        for portfolio_id in portfolios {
            let ledger_snapshot = match self.ledger.ledger_snapshot(&portfolio_id).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    failures.push(format!("{portfolio_id}: ledger read failed: {err}"));
                    continue;
                }
            };
            let database_snapshot = match self.ledger.database_snapshot(&portfolio_id, pack_id).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    failures.push(format!("{portfolio_id}: database read failed: {err}"));
                    continue;
                }
            };
            let prices = self.pack_repo.prices_for(pack_id).await.unwrap_or_default();

            let report = self.reconciler.reconcile(
                portfolio_id.clone(),
                asof_date,
                pack_id.clone(),
                &ledger_snapshot,
                &database_snapshot,
                &prices,
            );
            if report.status == ReconciliationStatus::Fail {
                failures.push(format!("{portfolio_id}: {} discrepancies", report.discrepancies.len()));
            } else {
                reconciled.push(portfolio_id.clone());
            }
            snapshots.push((portfolio_id, database_snapshot));
        }

        crate::observability::record_reconciliation(if failures.is_empty() { "within_tolerance" } else { "discrepancy" }, failures.len());
        let step = if failures.is_empty() {
            StepReport::ok("reconcile_ledger", elapsed_ms(started))
        } else {
            StepReport::failed("reconcile_ledger", elapsed_ms(started), failures.join("; "))
        };
        (step, snapshots, reconciled)
    }

    async fn step_compute_metrics(
        &self,
        asof_date: NaiveDate,
        pack_id: &PackId,
        snapshots: &[(crate::domain::shared::PortfolioId, DatabaseSnapshot)],
    ) -> StepReport {
        let started = Utc::now();
        let fx_rates = self.pack_repo.fx_rates_for(pack_id).await.unwrap_or_default();
        let mut errors = Vec::new();

        for (portfolio_id, snapshot) in snapshots {
            let market_value = self.valuation_in_base_ccy(snapshot, &fx_rates);
            if let Err(err) = self
                .metrics
                .compute_and_store(portfolio_id.clone(), asof_date, pack_id.clone(), market_value)
                .await
            {
                warn!(%portfolio_id, error = %err, "metrics computation failed, continuing");
                errors.push(format!("{portfolio_id}: {err}"));
            }
        }

        if errors.is_empty() {
            StepReport::ok("compute_daily_metrics", elapsed_ms(started))
        } else {
            StepReport::failed("compute_daily_metrics", elapsed_ms(started), errors.join("; "))
        }
    }

    fn valuation_in_base_ccy(&self, snapshot: &DatabaseSnapshot, fx_rates: &[FxRate]) -> Decimal {
        let positions_value: Decimal = snapshot.positions.iter().map(|p| p.market_value_base_ccy).sum();
        let cash_value: Decimal = snapshot
            .cash_balances
            .iter()
            .filter_map(|balance| self.convert_to_base(balance.amount, &balance.currency, fx_rates))
            .sum();
        positions_value + cash_value
    }

    fn convert_to_base(&self, amount: Decimal, currency: &str, fx_rates: &[FxRate]) -> Option<Decimal> {
        if currency == self.base_ccy {
            return Some(amount);
        }
        if let Some(rate) = fx_rates.iter().find(|r| r.base_ccy == currency && r.quote_ccy == self.base_ccy) {
            return Some(amount * rate.rate);
        }
        if let Some(rate) = fx_rates.iter().find(|r| r.base_ccy == self.base_ccy && r.quote_ccy == currency) {
            if rate.rate != Decimal::ZERO {
                return Some(amount / rate.rate);
            }
        }
        warn!(%currency, base_ccy = %self.base_ccy, "no FX rate to convert cash balance, excluding from valuation");
        None
    }

    async fn step_prewarm_factor_exposures(
        &self,
        asof_date: NaiveDate,
        pack_id: &PackId,
        portfolios: &[crate::domain::shared::PortfolioId],
    ) -> StepReport {
        let started = Utc::now();
        let mut errors = Vec::new();
        for portfolio_id in portfolios {
            if let Err(err) = self.prewarm.prewarm_factor_exposures(portfolio_id, pack_id).await {
                warn!(%portfolio_id, %asof_date, error = %err, "factor exposure prewarm failed");
                errors.push(format!("{portfolio_id}: {err}"));
            }
        }
        if errors.is_empty() {
            StepReport::ok("prewarm_factor_exposures", elapsed_ms(started))
        } else {
            StepReport::failed("prewarm_factor_exposures", elapsed_ms(started), errors.join("; "))
        }
    }

    async fn step_prewarm_ratings(
        &self,
        asof_date: NaiveDate,
        pack_id: &PackId,
        portfolios: &[crate::domain::shared::PortfolioId],
    ) -> StepReport {
        let started = Utc::now();
        let mut errors = Vec::new();
        for portfolio_id in portfolios {
            if let Err(err) = self.prewarm.prewarm_ratings(portfolio_id, pack_id).await {
                warn!(%portfolio_id, %asof_date, error = %err, "ratings prewarm failed");
                errors.push(format!("{portfolio_id}: {err}"));
            }
        }
        let step = if errors.is_empty() {
            StepReport::ok("prewarm_ratings", elapsed_ms(started))
        } else {
            StepReport::failed("prewarm_ratings", elapsed_ms(started), errors.join("; "))
        };
        if step.success {
            if let Err(err) = self.pack_repo.mark_prewarmed(pack_id).await {
                warn!(error = %err, "failed to record prewarm completion");
            }
        }
        step
    }

    async fn step_mark_fresh(&self, pack_id: &PackId) -> StepReport {
        let started = Utc::now();
        match self.builder.mark_fresh(pack_id).await {
            Ok(()) => StepReport::ok("mark_pack_fresh", elapsed_ms(started)),
            Err(err) => StepReport::failed("mark_pack_fresh", elapsed_ms(started), err.to_string()),
        }
    }

    async fn step_evaluate_alerts(&self, asof_date: NaiveDate) -> StepReport {
        let started = Utc::now();
        match self.alerts.evaluate_all(asof_date).await {
            Ok(fired) => {
                info!(fired, "alert evaluation complete");
                StepReport::ok("evaluate_alerts", elapsed_ms(started))
            }
            Err(err) => StepReport::failed("evaluate_alerts", elapsed_ms(started), err.to_string()),
        }
    }
}

fn elapsed_ms(started: chrono::DateTime<Utc>) -> u64 {
    (Utc::now() - started).num_milliseconds().max(0) as u64
}
