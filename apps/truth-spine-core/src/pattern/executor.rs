//! Runs a [`PatternDefinition`] to completion, producing the response DTO
//! the adapter layer hands back to a client.

use std::collections::HashMap;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;

use super::definition::PatternDefinition;
use super::error::PatternError;
use super::template::{substitute, substitute_args};
use crate::application::dto::{PatternExecutionResponseDto, ProvenanceBlock, TraceEntry};
use crate::capability::{CapabilityRuntime, ExecutionState, RequestContext};
use crate::observability;

/// Whether a resolved condition value counts as truthy. `null`, `false`,
/// `0`, and `""` are falsy; everything else runs the step.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_none_or(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub struct PatternExecutor<'a> {
    runtime: &'a CapabilityRuntime,
}

impl<'a> PatternExecutor<'a> {
    #[must_use]
    pub fn new(runtime: &'a CapabilityRuntime) -> Self {
        Self { runtime }
    }

    pub async fn execute(
        &self,
        pattern: &PatternDefinition,
        ctx: &RequestContext,
        inputs: &HashMap<String, Value>,
    ) -> Result<PatternExecutionResponseDto, PatternError> {
        let pattern_started = Instant::now();
        let mut state = ExecutionState::new();
        let mut trace = Vec::with_capacity(pattern.steps.len());

        let result = self.execute_steps(pattern, ctx, inputs, &mut state, &mut trace).await;
        let status = if result.is_ok() { "ok" } else { "failed" };
        observability::record_pattern_execution(&pattern.id, status, pattern_started.elapsed().as_secs_f64());
        result?;

        let mut outputs = HashMap::with_capacity(pattern.outputs.len());
        for (name, template) in &pattern.outputs {
            let value = substitute(template, ctx, &state, inputs)
                .map_err(|source| PatternError::Template { step: name.clone(), source })?;
            outputs.insert(name.clone(), value);
        }

        Ok(PatternExecutionResponseDto {
            pattern_id: pattern.id.clone(),
            outputs,
            trace,
            provenance: ProvenanceBlock {
                pricing_pack_id: ctx.pricing_pack_id.clone(),
                ledger_commit_hash: ctx.ledger_commit_hash.clone(),
                asof_date: ctx.asof_date,
            },
            completed_at: Utc::now(),
        })
    }

    async fn execute_steps(
        &self,
        pattern: &PatternDefinition,
        ctx: &RequestContext,
        inputs: &HashMap<String, Value>,
        state: &mut ExecutionState,
        trace: &mut Vec<TraceEntry>,
    ) -> Result<(), PatternError> {
        for step in &pattern.steps {
            if let Some(condition) = &step.condition {
                let resolved = substitute(condition, ctx, state, inputs)
                    .map_err(|source| PatternError::Template { step: step.name.clone(), source })?;
                if !is_truthy(&resolved) {
                    continue;
                }
            }

            let args = substitute_args(&step.args, ctx, state, inputs)
                .map_err(|source| PatternError::Template { step: step.name.clone(), source })?;

            let started = Instant::now();
            let outcome = self
                .runtime
                .execute(&step.capability, ctx, state, &args)
                .await
                .map_err(|source| PatternError::Capability { step: step.name.clone(), source })?;
            let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            trace.push(TraceEntry { capability: step.capability.clone(), source: outcome.provenance.tag, duration_ms });
            state.insert(step.name.clone(), outcome.value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Capability, CapabilityError, CapabilityRegistry};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Arc;

    use super::super::definition::PatternStep;
    use crate::error::Disposition;

    struct MarketValue;

    #[async_trait]
    impl Capability for MarketValue {
        fn name(&self) -> &str {
            "market_value"
        }

        async fn invoke(
            &self,
            _ctx: &RequestContext,
            _state: &ExecutionState,
            _args: &HashMap<String, Value>,
        ) -> Result<Value, Disposition<CapabilityError>> {
            Ok(Value::from(100_000))
        }
    }

    struct Double;

    #[async_trait]
    impl Capability for Double {
        fn name(&self) -> &str {
            "double"
        }

        async fn invoke(
            &self,
            _ctx: &RequestContext,
            _state: &ExecutionState,
            args: &HashMap<String, Value>,
        ) -> Result<Value, Disposition<CapabilityError>> {
            let input = args.get("value").and_then(Value::as_i64).unwrap_or(0);
            Ok(Value::from(input * 2))
        }
    }

    fn ctx() -> RequestContext {
        RequestContext {
            pricing_pack_id: crate::domain::shared::PackId::generate(),
            ledger_commit_hash: "abc123".to_string(),
            asof_date: NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            development_mode: false,
        }
    }

    #[tokio::test]
    async fn a_two_step_pattern_threads_state_between_steps() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(MarketValue)).unwrap();
        registry.register(Arc::new(Double)).unwrap();
        let runtime = CapabilityRuntime::new(registry);
        let executor = PatternExecutor::new(&runtime);

        let pattern = PatternDefinition::new("portfolio_snapshot")
            .with_step(PatternStep::new("value", "market_value"))
            .with_step(PatternStep::new("doubled", "double").with_arg("value", Value::from("{{state.value}}")))
            .with_output("final_value", "{{state.doubled}}");

        let inputs = HashMap::new();
        let response = executor.execute(&pattern, &ctx(), &inputs).await.unwrap();

        assert_eq!(response.outputs["final_value"], Value::from(200_000));
        assert_eq!(response.trace.len(), 2);
        assert_eq!(response.provenance.ledger_commit_hash, "abc123");
    }

    #[tokio::test]
    async fn a_falsy_condition_skips_the_step_without_failing() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(Double)).unwrap();
        let runtime = CapabilityRuntime::new(registry);
        let executor = PatternExecutor::new(&runtime);

        let pattern = PatternDefinition::new("conditional")
            .with_step(PatternStep::new("doubled", "double").with_arg("value", Value::from(5)).with_condition("{{inputs.enabled}}"))
            .with_output("enabled_flag", "{{inputs.enabled}}");

        let mut inputs = HashMap::new();
        inputs.insert("enabled".to_string(), Value::from(false));
        let response = executor.execute(&pattern, &ctx(), &inputs).await.unwrap();

        assert!(response.trace.is_empty());
        assert_eq!(response.outputs["enabled_flag"], Value::from(false));
    }
}
