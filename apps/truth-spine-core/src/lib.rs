// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Truth Spine - Nightly Portfolio Analytics Core
//!
//! Deterministic nightly pricing-and-metrics pipeline, reconciliation, and
//! capability runtime backing the Truth Spine analytics platform.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic, zero infrastructure dependencies
//!   - `pricing_pack`: the immutable, content-addressed pricing pack aggregate
//!   - `ledger`: portfolios, lots, transactions, the external book snapshot
//!   - `metrics`: persisted daily value and performance/attribution rows
//!   - `alerting`: alert rules, notifications, DLQ jobs
//!
//! - **Service layer**: business logic over the domain, still free of any
//!   transport concern
//!   - `pricing`: provider clients and the pricing pack builder
//!   - `reconciliation`: ledger-vs-database comparison
//!   - `metrics` (crate root): return-series calculations over persisted history
//!   - `orchestrator`: the nightly sacred-order pipeline
//!   - `freshness`: the read-through gate guarding pattern execution
//!   - `capability` / `pattern`: the online capability runtime and pattern DAG executor
//!   - `alerting` (crate root): alert evaluation, delivery, DLQ replay
//!
//! - **Application**: thin, serializable DTOs for whatever adapter a
//!   deployment puts in front of this core
//!
//! - **Infrastructure**: adapters (implementations)
//!   - `persistence`: repository implementations (in-memory, Turso)
//!   - `config`: dependency injection container
//!
//! - **Cross-cutting**: `config` (YAML + env configuration), `observability`
//!   (Prometheus metrics), `resilience` (circuit breaker, token bucket,
//!   backoff), `error` (rich, gRPC-mappable error types)

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - DTOs for the adapter boundary.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Service layers
// =============================================================================

/// Rich, gRPC-mappable error types shared across the service layer.
pub mod error;

/// Cross-cutting configuration (YAML + environment).
pub mod config;

/// Prometheus metrics and logging setup.
pub mod observability;

/// Circuit breaker, token bucket, and retry backoff primitives.
pub mod resilience;

/// OpenTelemetry tracing setup for the nightly entry point.
pub mod telemetry;

/// Provider clients and the pricing pack builder.
pub mod pricing;

/// Ledger-vs-database reconciliation.
pub mod reconciliation;

/// Return-series metrics calculations.
pub mod metrics;

/// The nightly sacred-order pipeline.
pub mod orchestrator;

/// The freshness gate guarding pattern execution.
pub mod freshness;

/// Capability registration, routing, caching, retries, and provenance.
pub mod capability;

/// Declarative pattern DAG execution over capabilities.
pub mod pattern;

/// Alert evaluation, notification delivery, and DLQ replay.
pub mod alerting;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::alerting::{Alert, ComparisonOperator, Condition, ConditionError, DeliveryChannel, DlqJob, DlqStatus, Notification};
pub use domain::ledger::{CashFlow, Holding, LedgerSnapshot, Lot, Portfolio, Transaction, TransactionType};
pub use domain::metrics::{CurrencyAttribution, FactorExposure, PortfolioDailyValue, PortfolioMetrics};
pub use domain::pricing_pack::{FxRate, Pack, PackStatus, Price, SourcesManifest};
pub use domain::shared::{
    AlertId, CapabilityRequestId, DlqJobId, LotId, Money, NotificationId, PackId, PortfolioId,
    Quantity, RunId, Symbol, Timestamp,
};

// Application re-exports
pub use application::dto::{
    FieldViolation, FreshnessStatusDto, PatternExecutionResponseDto, ProvenanceBlock,
    ProvenanceTag, ServiceUnavailableDto, TraceEntry, ValidationErrorDto,
};

// Infrastructure re-exports
pub use infrastructure::config::Container;
pub use infrastructure::ledger_file::{EmptyLedgerSource, JsonLedgerSource, LedgerManifest, PortfolioBooks};
pub use infrastructure::persistence::{AlertRepository, InMemoryPersistence, MetricsRepository, PersistenceError, PricingPackRepository, TursoPersistence};

// Service-layer re-exports
pub use alerting::{AlertEvaluator, DeliveryError, DlqReplayer, InAppChannel, MetricsObservedValueSource, NotificationChannelPort, ObservedValueSource, SmtpEmailChannel};
pub use capability::{Capability, CapabilityError, CapabilityRegistry, CapabilityRuntime, ExecutionState, Provenance, RequestContext};
pub use freshness::FreshnessGate;
pub use orchestrator::{DailyMetricsEngine, LedgerError, LedgerPort, NightlyOrchestrator, NightlyRunReport, NoOpPrewarm, PrewarmError, PrewarmPort, StepReport};
pub use pattern::{PatternDefinition, PatternError, PatternExecutor, PatternStep};
pub use pricing::{BuilderError, FxProvider, FxQuote, HttpFxProvider, HttpPriceProvider, PriceProvider, PriceQuote, PricingPackBuilder, ProviderError};
pub use reconciliation::{DatabaseCashBalance, DatabasePosition, DatabaseSnapshot, Discrepancy, DiscrepancyType, Reconciler, ReconciliationConfig, ReconciliationError, ReconciliationReport, ReconciliationStatus};

// Error re-exports
pub use error::{Disposition, ErrorCode, TruthSpineError, ERROR_DOMAIN};
