//! Capability registration and lookup.
//!
//! Agents register the capabilities they serve at startup. Overlap between
//! two agents claiming the same name is a configuration error, caught here
//! at registration rather than surfacing as a routing ambiguity at request
//! time.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::context::{ExecutionState, RequestContext};
use super::error::CapabilityError;
use crate::error::Disposition;

/// A single named operation an agent exposes to the pattern orchestrator.
///
/// `invoke` returns `Disposition::Transient` for failures the runtime should
/// retry (upstream timeouts, provider rate limits), `Disposition::Validation`
/// for bad arguments (never retried), and `Disposition::Fatal` for anything
/// else.
#[async_trait]
pub trait Capability: Send + Sync {
    fn name(&self) -> &str;

    async fn invoke(
        &self,
        ctx: &RequestContext,
        state: &ExecutionState,
        args: &HashMap<String, Value>,
    ) -> Result<Value, Disposition<CapabilityError>>;
}

/// The set of capabilities known to this process.
#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    capabilities: HashMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `capability` under its own `name()`. Errors if a capability
    /// with that name is already registered.
    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Result<(), CapabilityError> {
        let name = capability.name().to_string();
        if self.capabilities.contains_key(&name) {
            return Err(CapabilityError::DuplicateRegistration(name));
        }
        self.capabilities.insert(name, capability);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.capabilities.get(name).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct Echo;

    #[async_trait]
    impl Capability for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn invoke(
            &self,
            _ctx: &RequestContext,
            _state: &ExecutionState,
            args: &HashMap<String, Value>,
        ) -> Result<Value, Disposition<CapabilityError>> {
            Ok(Value::Object(args.clone().into_iter().collect()))
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
    async fn registering_the_same_name_twice_is_an_error() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(Echo)).unwrap();
        let err = registry.register(Arc::new(Echo)).unwrap_err();
        assert!(matches!(err, CapabilityError::DuplicateRegistration(name) if name == "echo"));
    }

    #[tokio::test]
    async fn registered_capability_is_invokable_via_lookup() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(Echo)).unwrap();

        let found = registry.get("echo").expect("registered");
        let state = ExecutionState::new();
        let mut args = HashMap::new();
        args.insert("x".to_string(), Value::from(1));
        let result = found.invoke(&ctx(), &state, &args).await.unwrap();
        assert_eq!(result["x"], Value::from(1));
    }

    #[test]
    fn unknown_capability_is_not_found() {
        let registry = CapabilityRegistry::new();
        assert!(registry.get("nonexistent").is_none());
    }
}
