//! Request-scoped memoization: two steps in the same pattern run invoking
//! the same capability with the same arguments reuse the first result
//! rather than hitting the provider or database twice.
//!
//! Scoped to a single `RequestContext` lifetime; never shared across
//! requests, since two requests may be pinned to different pricing packs.

use std::collections::HashMap;

use serde_json::Value;

/// Deterministic cache key for a capability call: the capability name plus
/// its arguments serialized with sorted keys so argument order never causes
/// a spurious miss.
fn cache_key(capability: &str, args: &HashMap<String, Value>) -> String {
    let mut entries: Vec<(&String, &Value)> = args.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    let canonical = serde_json::to_string(&entries).unwrap_or_default();
    format!("{capability}:{canonical}")
}

#[derive(Default)]
pub struct RequestCache {
    entries: HashMap<String, Value>,
}

impl RequestCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, capability: &str, args: &HashMap<String, Value>) -> Option<&Value> {
        self.entries.get(&cache_key(capability, args))
    }

    pub fn store(&mut self, capability: &str, args: &HashMap<String, Value>, value: Value) {
        self.entries.insert(cache_key(capability, args), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_order_does_not_affect_the_cache_key() {
        let mut a = HashMap::new();
        a.insert("b".to_string(), Value::from(2));
        a.insert("a".to_string(), Value::from(1));

        let mut b = HashMap::new();
        b.insert("a".to_string(), Value::from(1));
        b.insert("b".to_string(), Value::from(2));

        assert_eq!(cache_key("factor_exposure", &a), cache_key("factor_exposure", &b));
    }

    #[test]
    fn stored_value_is_retrievable_under_the_same_args() {
        let mut cache = RequestCache::new();
        let mut args = HashMap::new();
        args.insert("symbol".to_string(), Value::from("AAPL"));

        cache.store("quote", &args, Value::from(42));
        assert_eq!(cache.get("quote", &args), Some(&Value::from(42)));
    }

    #[test]
    fn a_miss_on_different_arguments_returns_none() {
        let mut cache = RequestCache::new();
        let mut args = HashMap::new();
        args.insert("symbol".to_string(), Value::from("AAPL"));
        cache.store("quote", &args, Value::from(42));

        let mut other = HashMap::new();
        other.insert("symbol".to_string(), Value::from("MSFT"));
        assert!(cache.get("quote", &other).is_none());
    }
}
