//! Textual substitution grammar for pattern step arguments: `{{state.X}}`,
//! `{{ctx.Y}}`, `{{inputs.Z}}`.
//!
//! Deliberately not regex-over-JSON: the restricted grammar is parsed once
//! into a small token sequence, so a malformed reference is caught at
//! pattern-load time rather than failing deep inside a capability call.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::capability::{ExecutionState, RequestContext};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Reference {
    State(String),
    Ctx(String),
    Inputs(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Ref(Reference),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unterminated template expression in {0:?}")]
    Unterminated(String),
    #[error("unknown reference scope {0:?}, expected state/ctx/inputs")]
    UnknownScope(String),
    #[error("reference {scope}.{field} has no value in this context")]
    MissingValue { scope: String, field: String },
}

/// Parses a raw string into literal/reference tokens. `{{scope.field}}`
/// opens a reference; anything else is literal text.
fn tokenize(raw: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut rest = raw;
    while let Some(start) = rest.find("{{") {
        if start > 0 {
            tokens.push(Token::Literal(rest[..start].to_string()));
        }
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            return Err(TemplateError::Unterminated(raw.to_string()));
        };
        let expr = after_open[..end].trim();
        let (scope, field) = expr.split_once('.').unwrap_or((expr, ""));
        let reference = match scope {
            "state" => Reference::State(field.to_string()),
            "ctx" => Reference::Ctx(field.to_string()),
            "inputs" => Reference::Inputs(field.to_string()),
            other => return Err(TemplateError::UnknownScope(other.to_string())),
        };
        tokens.push(Token::Ref(reference));
        rest = &after_open[end + 2..];
    }
    if !rest.is_empty() {
        tokens.push(Token::Literal(rest.to_string()));
    }
    Ok(tokens)
}

fn resolve(
    reference: &Reference,
    ctx: &RequestContext,
    state: &ExecutionState,
    inputs: &HashMap<String, Value>,
) -> Result<Value, TemplateError> {
    match reference {
        Reference::State(field) => state
            .get(field)
            .cloned()
            .ok_or_else(|| TemplateError::MissingValue { scope: "state".to_string(), field: field.clone() }),
        Reference::Inputs(field) => inputs
            .get(field)
            .cloned()
            .ok_or_else(|| TemplateError::MissingValue { scope: "inputs".to_string(), field: field.clone() }),
        Reference::Ctx(field) => match field.as_str() {
            "pricing_pack_id" => Ok(Value::from(ctx.pricing_pack_id.as_str().to_string())),
            "ledger_commit_hash" => Ok(Value::from(ctx.ledger_commit_hash.clone())),
            "asof_date" => Ok(Value::from(ctx.asof_date.to_string())),
            other => Err(TemplateError::MissingValue { scope: "ctx".to_string(), field: other.to_string() }),
        },
    }
}

fn value_to_interpolated_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Substitutes every `{{scope.field}}` occurrence in `raw`.
///
/// A template that is *exactly* one reference (no surrounding literal text)
/// returns the referenced value verbatim, preserving its JSON type. A
/// template mixing literal text and references is flattened to a string.
pub fn substitute(
    raw: &str,
    ctx: &RequestContext,
    state: &ExecutionState,
    inputs: &HashMap<String, Value>,
) -> Result<Value, TemplateError> {
    let tokens = tokenize(raw)?;
    if let [Token::Ref(reference)] = tokens.as_slice() {
        return resolve(reference, ctx, state, inputs);
    }

    let mut out = String::new();
    for token in &tokens {
        match token {
            Token::Literal(text) => out.push_str(text),
            Token::Ref(reference) => out.push_str(&value_to_interpolated_string(&resolve(reference, ctx, state, inputs)?)),
        }
    }
    Ok(Value::from(out))
}

/// Applies [`substitute`] to every value in `args`, leaving non-string
/// values (numbers, bools, already-resolved objects) untouched.
pub fn substitute_args(
    args: &HashMap<String, Value>,
    ctx: &RequestContext,
    state: &ExecutionState,
    inputs: &HashMap<String, Value>,
) -> Result<HashMap<String, Value>, TemplateError> {
    args.iter()
        .map(|(key, value)| {
            let resolved = match value {
                Value::String(raw) => substitute(raw, ctx, state, inputs)?,
                other => other.clone(),
            };
            Ok((key.clone(), resolved))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ctx() -> RequestContext {
        RequestContext {
            pricing_pack_id: crate::domain::shared::PackId::generate(),
            ledger_commit_hash: "abc123".to_string(),
            asof_date: NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            development_mode: false,
        }
    }

    #[test]
    fn a_bare_reference_preserves_its_value_type() {
        let mut state = ExecutionState::new();
        state.insert("total_value", Value::from(12345));
        let inputs = HashMap::new();

        let result = substitute("{{state.total_value}}", &ctx(), &state, &inputs).unwrap();
        assert_eq!(result, Value::from(12345));
    }

    #[test]
    fn mixed_literal_and_reference_text_becomes_a_string() {
        let mut state = ExecutionState::new();
        state.insert("symbol", Value::from("AAPL"));
        let inputs = HashMap::new();

        let result = substitute("security:{{state.symbol}}", &ctx(), &state, &inputs).unwrap();
        assert_eq!(result, Value::from("security:AAPL"));
    }

    #[test]
    fn ctx_fields_resolve_from_the_request_context() {
        let state = ExecutionState::new();
        let inputs = HashMap::new();
        let result = substitute("{{ctx.asof_date}}", &ctx(), &state, &inputs).unwrap();
        assert_eq!(result, Value::from("2026-07-27"));
    }

    #[test]
    fn inputs_fields_resolve_from_the_request_inputs() {
        let state = ExecutionState::new();
        let mut inputs = HashMap::new();
        inputs.insert("portfolio_id".to_string(), Value::from("p-1"));
        let result = substitute("{{inputs.portfolio_id}}", &ctx(), &state, &inputs).unwrap();
        assert_eq!(result, Value::from("p-1"));
    }

    #[test]
    fn an_unknown_scope_is_rejected_at_parse_time() {
        let state = ExecutionState::new();
        let inputs = HashMap::new();
        let err = substitute("{{bogus.field}}", &ctx(), &state, &inputs).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownScope(_)));
    }

    #[test]
    fn a_missing_state_reference_is_reported() {
        let state = ExecutionState::new();
        let inputs = HashMap::new();
        let err = substitute("{{state.nope}}", &ctx(), &state, &inputs).unwrap_err();
        assert!(matches!(err, TemplateError::MissingValue { .. }));
    }
}
