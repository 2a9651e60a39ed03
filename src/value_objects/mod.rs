//! Value objects shared by the adapter, the dispatcher and the engine contract

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Concept name to concept value, carried by a decision
pub type ConceptMap = HashMap<String, String>;

/// Kind of change an incremental unit represents within an update message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UpdateType {
    /// The unit is new information
    Add,
    /// A previously added unit is withdrawn
    Revoke,
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateType::Add => write!(f, "add"),
            UpdateType::Revoke => write!(f, "revoke"),
        }
    }
}

/// A value in the engine's domain.
///
/// Belief nodes are numeric or string valued, so upstream payload values are
/// normalized into this shape before they are assigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum StateValue {
    /// Boolean value
    Boolean(bool),
    /// Numeric value; integers are widened to floating point
    Double(f64),
    /// Textual value
    Text(String),
    /// Explicit absence of a value
    None,
    /// Any other structured payload, passed through unchanged
    Structured(serde_json::Value),
}

impl StateValue {
    /// Normalize a raw payload value.
    ///
    /// - a string made only of digits becomes a `Double` (`"42"` -> `42.0`)
    /// - integers become a `Double` (`7` -> `7.0`)
    /// - a sequence becomes its elements joined by single spaces
    /// - floats and other strings pass through
    ///
    /// Only ASCII digits count as integer text, so `"٣"` stays textual.
    /// Booleans are not integers here and keep their own `Boolean` variant.
    pub fn normalize(raw: &serde_json::Value) -> Self {
        use serde_json::Value;

        match raw {
            Value::String(s) if is_integer_text(s) => s
                .parse::<f64>()
                .map(StateValue::Double)
                .unwrap_or_else(|_| StateValue::Text(s.clone())),
            Value::String(s) => StateValue::Text(s.clone()),
            Value::Number(n) => n
                .as_f64()
                .map(StateValue::Double)
                .unwrap_or_else(|| StateValue::Structured(raw.clone())),
            Value::Array(tokens) => StateValue::Text(join_tokens(tokens)),
            Value::Bool(b) => StateValue::Boolean(*b),
            Value::Null => StateValue::None,
            Value::Object(_) => StateValue::Structured(raw.clone()),
        }
    }

    /// Numeric view of the value, if it is one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StateValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Textual view of the value, if it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StateValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Debug keeps the trailing ".0" on whole numbers
            StateValue::Double(d) => write!(f, "{d:?}"),
            StateValue::Text(s) => f.write_str(s),
            StateValue::Boolean(b) => write!(f, "{b}"),
            StateValue::None => f.write_str("None"),
            StateValue::Structured(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        StateValue::Text(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        StateValue::Text(value)
    }
}

impl From<f64> for StateValue {
    fn from(value: f64) -> Self {
        StateValue::Double(value)
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        StateValue::Boolean(value)
    }
}

fn is_integer_text(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn join_tokens(tokens: &[serde_json::Value]) -> String {
    tokens
        .iter()
        .map(|token| match token {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
