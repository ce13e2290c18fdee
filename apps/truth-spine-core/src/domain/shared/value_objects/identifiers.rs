//! Strongly-typed identifiers for domain entities.
//!
//! These prevent mixing up IDs from different contexts.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from a string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Generate a new unique identifier using UUID v4.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Get the inner string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_id!(PackId, "Unique identifier for a pricing pack.");
define_id!(
    PortfolioId,
    "Unique identifier for a portfolio tracked by the ledger."
);
define_id!(LotId, "Unique identifier for a tax lot.");
define_id!(AlertId, "Unique identifier for an alert rule.");
define_id!(
    NotificationId,
    "Unique identifier for a delivered or queued notification."
);
define_id!(DlqJobId, "Unique identifier for a dead-letter queue job.");
define_id!(
    CapabilityRequestId,
    "Unique identifier for a capability-dispatch request, used for request-scoped caching."
);
define_id!(RunId, "Unique identifier for a nightly orchestrator run.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_id_new_and_display() {
        let id = PackId::new("pack-2026-07-27");
        assert_eq!(id.as_str(), "pack-2026-07-27");
        assert_eq!(format!("{id}"), "pack-2026-07-27");
    }

    #[test]
    fn pack_id_generate_is_unique() {
        let id1 = PackId::generate();
        let id2 = PackId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn portfolio_id_equality() {
        let id1 = PortfolioId::new("port-1");
        let id2 = PortfolioId::new("port-1");
        let id3 = PortfolioId::new("port-2");
        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn lot_id_from_string() {
        let id: LotId = "lot-abc".into();
        assert_eq!(id.as_str(), "lot-abc");

        let id: LotId = String::from("lot-def").into();
        assert_eq!(id.as_str(), "lot-def");
    }

    #[test]
    fn alert_id_into_inner() {
        let id = AlertId::new("alert-1");
        let inner = id.into_inner();
        assert_eq!(inner, "alert-1");
    }

    #[test]
    fn notification_id_generate() {
        let id = NotificationId::generate();
        assert!(!id.as_str().is_empty());
    }

    #[test]
    fn dlq_job_id_new() {
        let id = DlqJobId::new("dlq-001");
        assert_eq!(id.as_str(), "dlq-001");
    }

    #[test]
    fn capability_request_id_generate_is_unique() {
        let a = CapabilityRequestId::generate();
        let b = CapabilityRequestId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn run_id_new() {
        let id = RunId::new("run-2026-07-28-0005");
        assert_eq!(id.as_str(), "run-2026-07-28-0005");
    }

    #[test]
    fn serde_roundtrip() {
        let id = PackId::new("pack-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"pack-1\"");

        let parsed: PackId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn hash_works_for_collections() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(PackId::new("pack-1"));
        set.insert(PackId::new("pack-2"));
        set.insert(PackId::new("pack-1")); // duplicate

        assert_eq!(set.len(), 2);
    }
}
