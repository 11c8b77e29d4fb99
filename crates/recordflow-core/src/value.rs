//! The value taxonomy admissible inside a [`Record`](crate::record::Record) field.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value as Json;

use crate::json_string::JsonString;
use crate::key::KeyValue;
use crate::record::Record;
use crate::sequence::{Sequence, SequenceElement};

/// One field's value. Exactly one of the variants below; there is no
/// separate "null" variant because absence is modelled by the field not
/// being present in the record at all.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Time(DateTime<Utc>),
    /// An opaque string already known to hold a valid JSON document.
    Json(JsonString),
    Record(Record),
    /// A lazy, single-pass, homogeneous sub-sequence.
    Sequence(Sequence),
}

impl Value {
    /// Project this value into the hashable key subset of the taxonomy.
    /// Returns `None` for sub-sequence values, which are never hashable
    /// (see the design note on grouping/joining by sub-sequence fields).
    pub fn as_key(&self) -> Option<KeyValue> {
        match self {
            Value::String(s) => Some(KeyValue::String(s.clone())),
            Value::Int(i) => Some(KeyValue::Int(*i)),
            Value::Float(f) => Some(KeyValue::Float(f.to_bits())),
            Value::Bool(b) => Some(KeyValue::Bool(*b)),
            Value::Time(t) => Some(KeyValue::Time(t.timestamp_nanos_opt().unwrap_or(i64::MIN))),
            Value::Json(j) => Some(KeyValue::Json(j.as_str().to_string())),
            Value::Record(r) => r.as_key_fields(),
            Value::Sequence(_) => None,
        }
    }

    /// Render this value as a `serde_json::Value`, draining any sub-sequence
    /// in the process. Nested records and sequences recurse.
    pub fn to_json(&self) -> Json {
        match self {
            Value::String(s) => Json::String(s.clone()),
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => Json::from(*f),
            Value::Bool(b) => Json::Bool(*b),
            Value::Time(t) => Json::String(t.to_rfc3339()),
            Value::Json(j) => j.parse().unwrap_or(Json::Null),
            Value::Record(r) => r.to_json(),
            Value::Sequence(seq) => {
                Json::Array(seq.materialize().into_iter().map(|e| e.to_json()).collect())
            }
        }
    }

    /// True if this value is an (absent-safe) numeric: int64 or float64.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Numeric-agnostic conversion to f64, used by aggregators. Returns
    /// `None` for non-numeric values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Time(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Json(j) => write!(f, "{}", j.as_str()),
            Value::Record(_) => write!(f, "<record>"),
            Value::Sequence(_) => write!(f, "<sequence>"),
        }
    }
}

/// Sub-sequences are treated as opaque: two sub-sequence values are never
/// considered equal here. `Record`'s own `PartialEq` skips such fields
/// entirely rather than relying on this fallback (see §9 of the design).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a.as_str() == b.as_str(),
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Sequence(_), Value::Sequence(_)) => false,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}
impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Time(t)
    }
}
impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}
impl From<Sequence> for Value {
    fn from(s: Sequence) -> Self {
        Value::Sequence(s)
    }
}

/// Numeric-agnostic, fallible conversion out of a [`Value`], backing
/// `Record::get`/`Record::get_or`. Implemented for the scalar kinds and
/// for `Record` itself; deliberately not for `Sequence`, which is taken
/// by value via `Record::take_sequence` instead since reading it consumes it.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Json(j) => Some(j.as_str().to_string()),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Time(t) => Some(*t),
            Value::String(s) => DateTime::parse_from_rfc3339(s).ok().map(|t| t.with_timezone(&Utc)),
            _ => None,
        }
    }
}

impl FromValue for JsonString {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Json(j) => Some(j.clone()),
            _ => None,
        }
    }
}

impl FromValue for Record {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Record(r) => Some(r.clone()),
            _ => None,
        }
    }
}

impl SequenceElement {
    fn to_json(&self) -> Json {
        match self {
            SequenceElement::String(s) => Json::String(s.clone()),
            SequenceElement::Int(i) => Json::from(*i),
            SequenceElement::Float(f) => Json::from(*f),
            SequenceElement::Bool(b) => Json::Bool(*b),
            SequenceElement::Record(r) => r.to_json(),
        }
    }
}
