//! The Frozen record and its mutable builder counterpart.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::json_string::JsonString;
use crate::key::KeyValue;
use crate::sequence::Sequence;
use crate::value::{FromValue, Value};

/// An immutable, cheaply-cloneable mapping from field name to value, with
/// field-insertion order preserved for iteration and codec output.
///
/// Cloning a `Record` clones an `Arc`, not the field map; two clones share
/// storage until one is reopened as a builder, at which point
/// [`Record::into_builder`] copies-on-write (it only clones the map when the
/// `Arc` is actually shared).
#[derive(Debug, Clone)]
pub struct Record {
    fields: Arc<IndexMap<String, Value>>,
}

impl Record {
    /// Start building a new record.
    pub fn builder() -> RecordBuilder {
        RecordBuilder::new()
    }

    pub(crate) fn from_map(fields: IndexMap<String, Value>) -> Self {
        Record { fields: Arc::new(fields) }
    }

    /// Reopen this record as a mutable builder, seeded with its current
    /// fields. Copy-on-write: if this is the only handle to the underlying
    /// map, reuses it in place; otherwise clones it.
    pub fn into_builder(self) -> RecordBuilder {
        let fields = match Arc::try_unwrap(self.fields) {
            Ok(map) => map,
            Err(shared) => (*shared).clone(),
        };
        RecordBuilder { fields }
    }

    pub fn get_value(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Typed, numeric-agnostic accessor. Returns `None` on a missing field
    /// or a type mismatch; never panics.
    pub fn get<T: FromValue>(&self, name: &str) -> Option<T> {
        self.fields.get(name).and_then(FromValue::from_value)
    }

    /// Like [`Record::get`] but falls back to `default` instead of `None`.
    pub fn get_or<T: FromValue>(&self, name: &str, default: T) -> T {
        self.get(name).unwrap_or(default)
    }

    /// Take the sub-sequence stored at `name`, if any. Cloning a `Sequence`
    /// shares its single-pass cursor, so calling this twice for the same
    /// field yields two handles onto the same remaining elements.
    pub fn take_sequence(&self, name: &str) -> Option<Sequence> {
        match self.fields.get(name) {
            Some(Value::Sequence(seq)) => Some(seq.clone()),
            _ => None,
        }
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build the key tuple for the given field names, in the order given.
    /// Returns `None` — and the caller should skip the record — if any
    /// named field holds a sub-sequence value, which has no key
    /// representation (see the design note on grouping by sub-sequences).
    /// A missing field contributes a placeholder that only matches other
    /// records missing the same field.
    pub fn key_tuple(&self, field_names: &[String]) -> Option<Vec<KeyValue>> {
        field_names
            .iter()
            .map(|name| match self.fields.get(name) {
                Some(value) => value.as_key(),
                None => Some(KeyValue::Absent(name.clone())),
            })
            .collect()
    }

    /// Key-projection of every field, used when this record is nested
    /// inside another and that parent is itself being keyed. Returns `None`
    /// if any field is a sub-sequence.
    pub(crate) fn as_key_fields(&self) -> Option<KeyValue> {
        let mut out = Vec::with_capacity(self.fields.len());
        for (name, value) in self.fields.iter() {
            out.push((name.clone(), value.as_key()?));
        }
        Some(KeyValue::Record(out))
    }

    /// Render this record as a `serde_json::Value` object, draining any
    /// sub-sequence fields in the process.
    pub fn to_json(&self) -> Json {
        let mut map = serde_json::Map::with_capacity(self.fields.len());
        for (name, value) in self.fields.iter() {
            map.insert(name.clone(), value.to_json());
        }
        Json::Object(map)
    }
}

/// Structural equality over the hashable subset of the taxonomy. Fields
/// whose value is a sub-sequence (on either side) are skipped rather than
/// compared, per the re-architected contract in the design notes: sub-
/// sequence equality is undefined, so it is excluded from record equality
/// rather than given an arbitrary answer.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        // A length mismatch can be entirely accounted for by skipped
        // sequence fields, so don't use it to bail out early.
        let mut names: Vec<&String> = self.fields.keys().chain(other.fields.keys()).collect();
        names.sort();
        names.dedup();
        names.into_iter().all(|name| {
            match (self.fields.get(name), other.fields.get(name)) {
                (Some(Value::Sequence(_)), _) | (_, Some(Value::Sequence(_))) => true,
                (a, b) => a == b,
            }
        })
    }
}

/// A mutable, short-lived accumulator for a record's fields. Construct with
/// [`Record::builder`], set fields with the fluent `set_*` methods, and
/// call [`RecordBuilder::freeze`] exactly once to obtain the `Record`.
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    fields: IndexMap<String, Value>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        RecordBuilder { fields: IndexMap::new() }
    }

    /// Set a field to any value convertible into [`Value`]. Re-setting an
    /// existing name replaces its value in place without moving its
    /// position in the insertion order.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn set_string(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, Value::String(value.into()))
    }

    pub fn set_int(self, name: impl Into<String>, value: i64) -> Self {
        self.set(name, Value::Int(value))
    }

    pub fn set_float(self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, Value::Float(value))
    }

    pub fn set_bool(self, name: impl Into<String>, value: bool) -> Self {
        self.set(name, Value::Bool(value))
    }

    pub fn set_time(self, name: impl Into<String>, value: DateTime<Utc>) -> Self {
        self.set(name, Value::Time(value))
    }

    pub fn set_json(self, name: impl Into<String>, value: JsonString) -> Self {
        self.set(name, Value::Json(value))
    }

    pub fn set_record(self, name: impl Into<String>, value: Record) -> Self {
        self.set(name, Value::Record(value))
    }

    pub fn set_sequence(self, name: impl Into<String>, value: Sequence) -> Self {
        self.set(name, Value::Sequence(value))
    }

    /// Remove a field if present, without disturbing the order of the rest.
    pub fn remove(mut self, name: &str) -> Self {
        self.fields.shift_remove(name);
        self
    }

    /// Finalize the builder into an immutable, shareable `Record`.
    pub fn freeze(self) -> Record {
        Record::from_map(self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_setting_a_field_preserves_position() {
        let r = Record::builder()
            .set_string("a", "1")
            .set_string("b", "2")
            .set_string("a", "3")
            .freeze();
        let names: Vec<&String> = r.field_names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(r.get::<String>("a").as_deref(), Some("3"));
    }

    #[test]
    fn equality_ignores_sequence_fields() {
        use crate::sequence::{Sequence, SequenceElement};
        let a = Record::builder()
            .set_string("name", "x")
            .set_sequence("tags", Sequence::from_vec(vec![SequenceElement::Int(1)]))
            .freeze();
        let b = Record::builder()
            .set_string("name", "x")
            .set_sequence("tags", Sequence::from_vec(vec![SequenceElement::Int(2)]))
            .freeze();
        assert_eq!(a, b);
    }

    #[test]
    fn key_tuple_skips_sequence_valued_fields() {
        use crate::sequence::Sequence;
        let r = Record::builder()
            .set_string("region", "N")
            .set_sequence("tags", Sequence::from_vec(vec![]))
            .freeze();
        assert!(r.key_tuple(&["region".to_string()]).is_some());
        assert!(r.key_tuple(&["tags".to_string()]).is_none());
    }

    #[test]
    fn numeric_agnostic_get() {
        let r = Record::builder().set_float("amount", 42.0).freeze();
        assert_eq!(r.get::<i64>("amount"), Some(42));
        assert_eq!(r.get_or::<i64>("missing", -1), -1);
    }
}
