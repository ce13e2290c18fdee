//! Pattern execution response: outputs, a trace of what ran, and the
//! pricing-pack/ledger-commit pin every result is provenanced against.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::shared::PackId;

/// Where one capability's value actually came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvenanceTag {
    /// Read from an authoritative database or provider.
    Real,
    /// The upstream call failed or was rejected.
    Error,
    /// A development-mode stand-in value; never returned in production.
    Placeholder,
}

/// The pricing pack and ledger commit every capability result in a pattern
/// run is pinned to, set once at dispatch time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenanceBlock {
    pub pricing_pack_id: PackId,
    pub ledger_commit_hash: String,
    pub asof_date: chrono::NaiveDate,
}

/// A record of one step's execution, for the trace attached to the
/// response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub capability: String,
    pub source: ProvenanceTag,
    pub duration_ms: u64,
}

/// The full outcome of executing a pattern: its declared outputs plus
/// enough of a trace for the caller to judge trust in the numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternExecutionResponseDto {
    pub pattern_id: String,
    pub outputs: HashMap<String, Value>,
    pub trace: Vec<TraceEntry>,
    pub provenance: ProvenanceBlock,
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_entries_carry_their_own_provenance_tag() {
        let entry = TraceEntry { capability: "get_price".to_string(), source: ProvenanceTag::Real, duration_ms: 12 };
        assert_eq!(entry.source, ProvenanceTag::Real);
    }
}
