//! Bindable values for predicate parameters
//!
//! A `Value` is what a comparison is made against. It is bound as a typed
//! PostgreSQL parameter when rendered to SQL and compared against serialized
//! record fields when evaluated in memory.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use uuid::Uuid;

/// A typed comparison value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Maps to BOOLEAN
    Bool(bool),
    /// Maps to BIGINT (narrower integer columns compare fine against it)
    Int(i64),
    /// Maps to DOUBLE PRECISION
    Float(f64),
    /// Maps to TEXT
    Text(String),
    /// Maps to NUMERIC
    Decimal(Decimal),
    /// Maps to TIMESTAMP WITH TIME ZONE
    Timestamp(DateTime<Utc>),
    /// Maps to UUID
    Uuid(Uuid),
}

impl Value {
    /// Order a serialized record field relative to this value
    /// (`Less` means the field sorts before the value).
    ///
    /// Returns `None` when the field is null, missing or of an incomparable
    /// type, which corresponds to SQL's unknown result.
    pub fn compare_json(&self, json: &serde_json::Value) -> Option<Ordering> {
        match self {
            Value::Bool(b) => json.as_bool().map(|other| other.cmp(b)),
            Value::Int(i) => match json.as_i64() {
                Some(other) => Some(other.cmp(i)),
                None => json.as_f64()?.partial_cmp(&(*i as f64)),
            },
            Value::Float(f) => json.as_f64()?.partial_cmp(f),
            Value::Text(s) => json.as_str().map(|other| other.cmp(s.as_str())),
            Value::Decimal(d) => json_to_decimal(json).map(|other| other.cmp(d)),
            Value::Timestamp(t) => {
                let other = DateTime::parse_from_rfc3339(json.as_str()?).ok()?;
                Some(other.with_timezone(&Utc).cmp(t))
            }
            Value::Uuid(u) => {
                let other = Uuid::parse_str(json.as_str()?).ok()?;
                Some(other.cmp(u))
            }
        }
    }

    /// Whether a serialized record field equals this value
    pub fn matches_json(&self, json: &serde_json::Value) -> Option<bool> {
        self.compare_json(json).map(|ord| ord == Ordering::Equal)
    }

    /// JSON form of the value, used when tracing bound parameters
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Decimal(d) => serde_json::Value::String(d.to_string()),
            Value::Timestamp(t) => serde_json::Value::String(t.to_rfc3339()),
            Value::Uuid(u) => serde_json::Value::String(u.to_string()),
        }
    }
}

fn json_to_decimal(json: &serde_json::Value) -> Option<Decimal> {
    match json {
        serde_json::Value::String(s) => Decimal::from_str(s).ok(),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Decimal::from(i)),
            None => Decimal::from_f64(n.as_f64()?),
        },
        _ => None,
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::Int(value.into())
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}
