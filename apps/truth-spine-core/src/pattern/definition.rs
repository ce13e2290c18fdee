//! The declarative shape of a pattern: a named, ordered list of capability
//! invocations plus a mapping describing which execution-state values
//! become the pattern's declared outputs.

use std::collections::HashMap;

use serde_json::Value;

/// One step in a pattern: invoke `capability` with `args` (subject to
/// template substitution) and store the result under `name` in the
/// execution state.
#[derive(Debug, Clone)]
pub struct PatternStep {
    pub name: String,
    pub capability: String,
    pub args: HashMap<String, Value>,
    /// If present, a template string evaluated before the step runs; a
    /// falsy result (`false`, `null`, `0`, `""`) skips the step without
    /// failing the pattern.
    pub condition: Option<String>,
}

impl PatternStep {
    #[must_use]
    pub fn new(name: impl Into<String>, capability: impl Into<String>) -> Self {
        Self { name: name.into(), capability: capability.into(), args: HashMap::new(), condition: None }
    }

    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.args.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// A named DAG whose nodes are capability invocations. The current
/// contract runs `steps` serially in declared order.
#[derive(Debug, Clone)]
pub struct PatternDefinition {
    pub id: String,
    pub steps: Vec<PatternStep>,
    /// Output name -> template string resolved once all steps complete.
    pub outputs: HashMap<String, String>,
}

impl PatternDefinition {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), steps: Vec::new(), outputs: HashMap::new() }
    }

    #[must_use]
    pub fn with_step(mut self, step: PatternStep) -> Self {
        self.steps.push(step);
        self
    }

    #[must_use]
    pub fn with_output(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.outputs.insert(name.into(), template.into());
        self
    }
}
