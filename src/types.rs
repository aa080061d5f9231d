//! Runtime value categories and their ancestry.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Category of a JSON value, used for type checks and for type-keyed
/// mapping dispatch.
///
/// `Integer` is a refinement of `Number`; every type refines `Any`.
/// Booleans are never integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Any,
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl ValueType {
    /// The most specific type of `value`.
    pub fn of(value: &Value) -> ValueType {
        match value {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => ValueType::Integer,
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
        }
    }

    /// This type followed by every type it refines, most specific first.
    pub fn ancestry(self) -> &'static [ValueType] {
        match self {
            ValueType::Any => &[ValueType::Any],
            ValueType::Null => &[ValueType::Null, ValueType::Any],
            ValueType::Boolean => &[ValueType::Boolean, ValueType::Any],
            ValueType::Integer => &[ValueType::Integer, ValueType::Number, ValueType::Any],
            ValueType::Number => &[ValueType::Number, ValueType::Any],
            ValueType::String => &[ValueType::String, ValueType::Any],
            ValueType::Array => &[ValueType::Array, ValueType::Any],
            ValueType::Object => &[ValueType::Object, ValueType::Any],
        }
    }

    /// Whether `value` is an instance of this type.
    pub fn matches(self, value: &Value) -> bool {
        ValueType::of(value).ancestry().contains(&self)
    }

    /// JSON Schema `type` token, `None` for [`ValueType::Any`].
    pub fn json_name(self) -> Option<&'static str> {
        match self {
            ValueType::Any => None,
            ValueType::Null => Some("null"),
            ValueType::Boolean => Some("boolean"),
            ValueType::Integer => Some("integer"),
            ValueType::Number => Some("number"),
            ValueType::String => Some("string"),
            ValueType::Array => Some("array"),
            ValueType::Object => Some("object"),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_name().unwrap_or("any"))
    }
}

/// Integers compare exactly; a float on either side compares as `f64`.
fn numbers_equal(a: &Number, b: &Number) -> bool {
    if a.is_f64() || b.is_f64() {
        return a.as_f64() == b.as_f64();
    }
    match (a.as_i64(), b.as_i64()) {
        (Some(a), Some(b)) => a == b,
        _ => a.as_u64().is_some() && a.as_u64() == b.as_u64(),
    }
}

/// Literal equality used by comparable schemas.
///
/// Integer 42 equals float 42.0; object key order is irrelevant;
/// arrays compare element-wise by position and length.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|bv| values_equal(v, bv)))
        }
        (a, b) => a == b,
    }
}

/// Text used when a value becomes a mapping key or fills an error template:
/// strings verbatim, everything else as compact JSON.
pub(crate) fn key_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
