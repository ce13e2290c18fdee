//! Per-request context and the execution-state mapping a pattern run
//! accumulates as its steps complete.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::Value;

use crate::domain::shared::PackId;

/// Pinned once at dispatch time by the freshness gate: every capability
/// invoked during this request reads through the same pack and ledger
/// commit.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub pricing_pack_id: PackId,
    pub ledger_commit_hash: String,
    pub asof_date: NaiveDate,
    /// Permits placeholder-provenance fallbacks. Never set in production.
    pub development_mode: bool,
}

/// The mapping a pattern run threads between steps: each step's named
/// outputs are inserted here under `state.<name>` and later steps may
/// reference them.
#[derive(Debug, Clone, Default)]
pub struct ExecutionState {
    values: HashMap<String, Value>,
}

impl ExecutionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}
