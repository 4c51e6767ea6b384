//! Oracle proposal and its lenient JSON decoding.

use crate::error::{OracleError, OracleResult};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use surge_core::Decision;

/// A proposed price. Untrusted until validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleDecision {
    /// `None` when the oracle returned something that is not a number.
    pub new_price: Option<Decimal>,
    pub reasoning: String,
    /// `None` when the label was missing or unrecognised.
    pub decision: Option<Decision>,
}

impl OracleDecision {
    pub fn new(new_price: Decimal, decision: Decision, reasoning: impl Into<String>) -> Self {
        Self {
            new_price: Some(new_price),
            reasoning: reasoning.into(),
            decision: Some(decision),
        }
    }

    /// Decode a `{newPrice, reasoning, decision}` object.
    ///
    /// Accepts camelCase or snake_case keys and numeric strings. A
    /// non-numeric price decodes to `None` rather than failing, so the
    /// validator can substitute the current price. Anything that is not a
    /// JSON object is malformed.
    pub fn from_json_value(value: &Value) -> OracleResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| OracleError::Malformed(format!("expected object, got {value}")))?;

        let raw_price = obj.get("newPrice").or_else(|| obj.get("new_price"));
        let new_price = raw_price.and_then(decode_price);

        let reasoning = obj
            .get("reasoning")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let decision = obj
            .get("decision")
            .and_then(Value::as_str)
            .and_then(|s| Decision::from_str(s).ok());

        Ok(Self {
            new_price,
            reasoning,
            decision,
        })
    }

    /// Decode from model text, tolerating markdown code fences.
    pub fn from_text(text: &str) -> OracleResult<Self> {
        let body = strip_code_fence(text);
        let value: Value = serde_json::from_str(body)
            .map_err(|e| OracleError::Malformed(format!("invalid JSON: {e}")))?;
        Self::from_json_value(&value)
    }
}

fn decode_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(Decimal::from_f64))
            .map(|d| d.normalize()),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
