//! Dispatches a single capability call: cache lookup, invocation with a
//! fixed retry schedule, and provenance stamping.
//!
//! The retry schedule here (3 attempts, fixed 1s/2s/4s delays) is
//! deliberately distinct from `resilience::backoff::delay_for_attempt`'s
//! jittered exponential backoff used for direct provider calls — this
//! runtime retries an *agent's* capability invocation, not a raw network
//! call, and the fixed schedule is what callers waiting on a pattern
//! response can reason about.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::warn;

use super::cache::RequestCache;
use super::context::{ExecutionState, RequestContext};
use super::error::CapabilityError;
use super::provenance::Provenance;
use super::registry::CapabilityRegistry;
use crate::error::Disposition;
use crate::observability;

/// Fixed backoff schedule for transient capability failures: 1s, then 2s,
/// then 4s, for a total of 3 attempts.
const RETRY_DELAYS: [Duration; 2] = [Duration::from_secs(1), Duration::from_secs(2)];

/// Default assumed freshness window for a successful capability result,
/// used when the capability itself does not report a tighter one.
const DEFAULT_TTL: Duration = Duration::from_secs(60);

pub struct CapabilityOutcome {
    pub value: Value,
    pub provenance: Provenance,
}

/// Routes a request's capability calls through the registry, with
/// request-scoped caching and retry/provenance handling.
pub struct CapabilityRuntime {
    registry: CapabilityRegistry,
    cache: Mutex<RequestCache>,
}

impl CapabilityRuntime {
    #[must_use]
    pub fn new(registry: CapabilityRegistry) -> Self {
        Self { registry, cache: Mutex::new(RequestCache::new()) }
    }

    /// Executes `name` with `args`, reusing a cached result from earlier in
    /// the same request if present.
    ///
    /// On retryable (`Disposition::Transient`) failure, retries up to twice
    /// more with the fixed delay schedule before giving up and tagging the
    /// result `error`. `development_mode` requests that exhaust retries get
    /// a `placeholder` tag instead, per the non-production escape hatch.
    pub async fn execute(
        &self,
        name: &str,
        ctx: &RequestContext,
        state: &ExecutionState,
        args: &HashMap<String, Value>,
    ) -> Result<CapabilityOutcome, CapabilityError> {
        let started = Instant::now();
        if let Some(cached) = self.cache.lock().unwrap().get(name, args) {
            observability::record_capability_invocation(name, "real", started.elapsed().as_secs_f64());
            return Ok(CapabilityOutcome {
                value: cached.clone(),
                provenance: Provenance::real(format!("capability:{name}#cache"), ctx.asof_date, DEFAULT_TTL),
            });
        }

        let capability = self.registry.get(name).ok_or_else(|| CapabilityError::Unknown(name.to_string()))?;

        let mut attempt = 0usize;
        loop {
            match capability.invoke(ctx, state, args).await {
                Ok(value) => {
                    self.cache.lock().unwrap().store(name, args, value.clone());
                    let provenance = Provenance::real(format!("capability:{name}"), ctx.asof_date, DEFAULT_TTL);
                    observability::record_capability_invocation(name, "real", started.elapsed().as_secs_f64());
                    return Ok(CapabilityOutcome { value, provenance });
                }
                Err(Disposition::Validation(e)) => {
                    observability::record_capability_invocation(name, "error", started.elapsed().as_secs_f64());
                    return Err(e);
                }
                Err(Disposition::Fatal(e)) => {
                    observability::record_capability_invocation(name, "error", started.elapsed().as_secs_f64());
                    return Err(e);
                }
                Err(Disposition::Transient(e)) => {
                    if attempt >= RETRY_DELAYS.len() {
                        warn!(capability = name, error = %e, "capability exhausted retries");
                        return if ctx.development_mode {
                            observability::record_capability_invocation(name, "placeholder", started.elapsed().as_secs_f64());
                            Ok(CapabilityOutcome {
                                value: Value::Null,
                                provenance: Provenance::placeholder(format!("capability:{name}"), ctx.asof_date),
                            })
                        } else {
                            observability::record_capability_invocation(name, "error", started.elapsed().as_secs_f64());
                            Err(e)
                        };
                    }
                    tokio::time::sleep(RETRY_DELAYS[attempt]).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::super::registry::Capability;

    struct FlakyOnce {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Capability for FlakyOnce {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn invoke(
            &self,
            _ctx: &RequestContext,
            _state: &ExecutionState,
            _args: &HashMap<String, Value>,
        ) -> Result<Value, Disposition<CapabilityError>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Disposition::Transient(CapabilityError::Upstream {
                    capability: "flaky".to_string(),
                    message: "timeout".to_string(),
                }))
            } else {
                Ok(Value::from("ok"))
            }
        }
    }

    struct AlwaysInvalid;

    #[async_trait]
    impl Capability for AlwaysInvalid {
        fn name(&self) -> &str {
            "bad_args"
        }

        async fn invoke(
            &self,
            _ctx: &RequestContext,
            _state: &ExecutionState,
            _args: &HashMap<String, Value>,
        ) -> Result<Value, Disposition<CapabilityError>> {
            Err(Disposition::Validation(CapabilityError::InvalidArguments {
                capability: "bad_args".to_string(),
                message: "missing field".to_string(),
            }))
        }
    }

    fn ctx(development_mode: bool) -> RequestContext {
        RequestContext {
            pricing_pack_id: crate::domain::shared::PackId::generate(),
            ledger_commit_hash: "abc123".to_string(),
            asof_date: NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            development_mode,
        }
    }

    #[tokio::test]
    async fn a_transient_failure_is_retried_and_then_succeeds() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(FlakyOnce { calls: AtomicUsize::new(0) })).unwrap();
        let runtime = CapabilityRuntime::new(registry);

        let outcome = runtime.execute("flaky", &ctx(false), &ExecutionState::new(), &HashMap::new()).await.unwrap();
        assert_eq!(outcome.value, Value::from("ok"));
        assert!(matches!(outcome.provenance.tag, super::super::provenance::ProvenanceTag::Real));
    }

    #[tokio::test]
    async fn validation_errors_are_never_retried() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(AlwaysInvalid)).unwrap();
        let runtime = CapabilityRuntime::new(registry);

        let err = runtime.execute("bad_args", &ctx(false), &ExecutionState::new(), &HashMap::new()).await.unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn unknown_capability_name_is_reported_before_any_invocation() {
        let runtime = CapabilityRuntime::new(CapabilityRegistry::new());
        let err = runtime.execute("missing", &ctx(false), &ExecutionState::new(), &HashMap::new()).await.unwrap_err();
        assert!(matches!(err, CapabilityError::Unknown(_)));
    }

    #[tokio::test]
    async fn second_call_with_identical_args_is_served_from_cache() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(FlakyOnce { calls: AtomicUsize::new(1) })).unwrap();
        let runtime = CapabilityRuntime::new(registry);

        let first = runtime.execute("flaky", &ctx(false), &ExecutionState::new(), &HashMap::new()).await.unwrap();
        let second = runtime.execute("flaky", &ctx(false), &ExecutionState::new(), &HashMap::new()).await.unwrap();
        assert_eq!(first.value, second.value);
    }
}
