//! Truth Spine Core — nightly entry point.
//!
//! Runs the sacred-order pipeline once for the given as-of date and exits.
//! Exit code `0` on `success = true`, `1` on any blocker failure, per the
//! platform's external-interface contract.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin truth-spine-core -- [YYYY-MM-DD]
//! ```
//!
//! Defaults to today (UTC) if no date is given.
//!
//! # Environment Variables
//!
//! - `TRUTH_SPINE_CONFIG`: path to the YAML config file (default: `config.yaml`)
//! - `TRUTH_SPINE_LEDGER_FILE`: path to a JSON ledger manifest (optional; no
//!   portfolios are reconciled if unset)
//! - `TRUTH_SPINE_SECURITIES`: comma-separated security ids to price tonight
//! - `TRUTH_SPINE_FX_PAIRS`: comma-separated `BASE:QUOTE` pairs to price tonight
//! - `PRIMARY_PROVIDER_API_KEY` / `SECONDARY_PROVIDER_API_KEY` / `FX_PROVIDER_API_KEY`
//! - `RUST_LOG`: log level (default: info)

use std::sync::Arc;

use chrono::NaiveDate;
use truth_spine_core::{
    AlertEvaluator, Container, DailyMetricsEngine, EmptyLedgerSource, InAppChannel,
    JsonLedgerSource, MetricsObservedValueSource, NightlyOrchestrator, NoOpPrewarm, Reconciler,
};
use truth_spine_core::config;
use truth_spine_core::orchestrator::LedgerPort;
use truth_spine_core::pricing::{HttpFxProvider, HttpPriceProvider, PricingPackBuilder};
use truth_spine_core::resilience::{CircuitBreaker, CircuitBreakerConfig, TokenBucket};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }

    let _telemetry_guard = truth_spine_core::telemetry::init_telemetry();

    tracing::info!("Starting Truth Spine nightly run");

    let config_path = std::env::var("TRUTH_SPINE_CONFIG").ok();
    let cfg = match config::load_config(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("failed to load config: {e}");
            std::process::exit(1);
        }
    };

    let asof_date = std::env::args()
        .nth(1)
        .and_then(|raw| NaiveDate::parse_from_str(&raw, "%Y-%m-%d").ok())
        .unwrap_or_else(|| chrono::Utc::now().date_naive());

    let container = match Container::from_config(&cfg).await {
        Ok(container) => container,
        Err(e) => {
            tracing::error!("failed to wire persistence: {e}");
            std::process::exit(1);
        }
    };

    let resilience = &cfg.resilience.default;
    let breaker_config = CircuitBreakerConfig {
        failure_threshold: resilience.failure_threshold,
        cooldown: std::time::Duration::from_secs(resilience.cooldown_secs),
    };
    let primary_breaker = Arc::new(CircuitBreaker::new("primary_price_provider", breaker_config.clone()));
    let secondary_breaker = Arc::new(CircuitBreaker::new("secondary_price_provider", breaker_config.clone()));
    let fx_breaker = Arc::new(CircuitBreaker::new("fx_provider", breaker_config));
    let refill_per_sec = (resilience.rate_limit / u32::try_from(resilience.rate_limit_window_secs.max(1)).unwrap_or(1)).max(1);
    let primary_limiter = Arc::new(TokenBucket::new(resilience.rate_limit, refill_per_sec));
    let secondary_limiter = Arc::new(TokenBucket::new(resilience.rate_limit, refill_per_sec));
    let fx_limiter = Arc::new(TokenBucket::new(resilience.rate_limit, refill_per_sec));

    let primary_provider = Arc::new(HttpPriceProvider::new(
        "primary",
        std::env::var("PRIMARY_PROVIDER_URL").unwrap_or_default(),
        std::env::var("PRIMARY_PROVIDER_API_KEY").unwrap_or_default(),
    ));
    let secondary_provider = Arc::new(HttpPriceProvider::new(
        "secondary",
        std::env::var("SECONDARY_PROVIDER_URL").unwrap_or_default(),
        std::env::var("SECONDARY_PROVIDER_API_KEY").unwrap_or_default(),
    ));
    let fx_provider = Arc::new(HttpFxProvider::new(
        "fx",
        std::env::var("FX_PROVIDER_URL").unwrap_or_default(),
        std::env::var("FX_PROVIDER_API_KEY").unwrap_or_default(),
    ));

    let builder = Arc::new(PricingPackBuilder::new(
        primary_provider,
        primary_breaker,
        primary_limiter,
        secondary_provider,
        secondary_breaker,
        secondary_limiter,
        fx_provider,
        fx_breaker,
        fx_limiter,
        container.pricing_packs(),
    ));

    let ledger: Arc<dyn LedgerPort> = match std::env::var("TRUTH_SPINE_LEDGER_FILE") {
        Ok(path) => Arc::new(JsonLedgerSource::new(path)),
        Err(_) => {
            tracing::warn!("TRUTH_SPINE_LEDGER_FILE not set; no portfolios will be reconciled tonight");
            Arc::new(EmptyLedgerSource)
        }
    };

    let metrics = DailyMetricsEngine::new(container.metrics(), rust_decimal_macros::dec!(0.04));

    let observed_values = Arc::new(MetricsObservedValueSource::new(container.metrics()));
    let in_app = Arc::new(InAppChannel::default());
    let alerts = Arc::new(AlertEvaluator::new(container.alerts(), observed_values, vec![in_app]));

    let securities = std::env::var("TRUTH_SPINE_SECURITIES")
        .unwrap_or_default()
        .split(',')
        .filter(|s| !s.is_empty())
        .map(truth_spine_core::Symbol::new)
        .collect::<Vec<_>>();
    let fx_pairs = std::env::var("TRUTH_SPINE_FX_PAIRS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|pair| pair.split_once(':'))
        .map(|(base, quote)| (base.to_string(), quote.to_string()))
        .collect::<Vec<_>>();

    let orchestrator = NightlyOrchestrator::new(
        builder,
        Reconciler::new(Default::default()),
        ledger,
        container.pricing_packs(),
        metrics,
        Arc::new(NoOpPrewarm),
        alerts,
        securities,
        fx_pairs,
        cfg.pricing_pack.policy.clone(),
        "USD".to_string(),
    );

    tracing::info!(%asof_date, "running nightly sacred-order pipeline");
    let report = orchestrator.run(asof_date, None).await;

    tracing::info!(
        success = report.success,
        duration_ms = report.duration_ms,
        blocked_at = ?report.blocked_at,
        "nightly run complete"
    );
    for step in &report.steps {
        if step.success {
            tracing::info!(step = %step.name, duration_ms = step.duration_ms, "step ok");
        } else {
            tracing::error!(step = %step.name, error = ?step.error, "step failed");
        }
    }

    std::process::exit(report.exit_code());
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv_from_ancestors() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}
