//! group-by and the record-specific field-timeout operator.

use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::key::KeyValue;
use crate::record::Record;
use crate::sequence::{Sequence, SequenceElement};

use super::time_field;

/// Partitions records by key-tuple, emitting one record per distinct key in
/// first-seen order. Buffers the entire input on the first pull (required:
/// a group's membership isn't known until its last member has arrived), but
/// does no work before that first pull.
pub struct GroupBy<I: Iterator<Item = Record>> {
    inner: Option<I>,
    key_fields: Vec<String>,
    output_field: String,
    output: Option<std::vec::IntoIter<Record>>,
}

impl<I: Iterator<Item = Record>> GroupBy<I> {
    pub(crate) fn new(inner: I, key_fields: Vec<String>, output_field: String) -> Self {
        GroupBy { inner: Some(inner), key_fields, output_field, output: None }
    }

    fn run(&mut self) -> std::vec::IntoIter<Record> {
        let inner = self.inner.take().expect("GroupBy polled after completion");
        // key tuple -> (key field values, members)
        let mut groups: IndexMap<Vec<KeyValue>, (Vec<(String, KeyValue)>, Vec<Record>)> =
            IndexMap::new();
        for record in inner {
            let Some(key) = record.key_tuple(&self.key_fields) else {
                continue; // sub-sequence-valued key field: skip, per contract
            };
            let entry = groups.entry(key.clone()).or_insert_with(|| {
                let named: Vec<(String, KeyValue)> =
                    self.key_fields.iter().cloned().zip(key.iter().cloned()).collect();
                (named, Vec::new())
            });
            entry.1.push(record);
        }

        let mut out = Vec::with_capacity(groups.len());
        for (_, (named_key, members)) in groups {
            let mut builder = Record::builder();
            for (name, key_value) in named_key {
                builder = set_key_field(builder, &name, key_value);
            }
            let elements: Vec<SequenceElement> =
                members.into_iter().map(SequenceElement::Record).collect();
            builder = builder.set_sequence(self.output_field.clone(), Sequence::from_vec(elements));
            out.push(builder.freeze());
        }
        out.into_iter()
    }
}

fn set_key_field(
    builder: crate::record::RecordBuilder,
    name: &str,
    key_value: KeyValue,
) -> crate::record::RecordBuilder {
    match key_value {
        KeyValue::String(s) => builder.set_string(name, s),
        KeyValue::Int(i) => builder.set_int(name, i),
        KeyValue::Float(bits) => builder.set_float(name, f64::from_bits(bits)),
        KeyValue::Bool(b) => builder.set_bool(name, b),
        KeyValue::Time(nanos) => {
            let secs = nanos.div_euclid(1_000_000_000);
            let nsub = nanos.rem_euclid(1_000_000_000) as u32;
            let time = DateTime::<Utc>::from_timestamp(secs, nsub)
                .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).unwrap());
            builder.set_time(name, time)
        }
        KeyValue::Json(s) => builder.set_json(name, crate::json_string::JsonString::new(s)),
        KeyValue::Absent(_) => builder,
        KeyValue::Record(_) => builder, // nested-record keys are not re-materialized as a field
    }
}

impl<I: Iterator<Item = Record>> Iterator for GroupBy<I> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.output.is_none() {
            self.output = Some(self.run());
        }
        self.output.as_mut().unwrap().next()
    }
}

/// Stops the stream once the current record's time-valued `field` has
/// drifted from the first-seen value by more than `max_drift`. Records
/// missing `field` pass through unaffected.
pub struct FieldTimeout<I> {
    inner: I,
    field: String,
    max_drift: Duration,
    first_seen: Option<DateTime<Utc>>,
    done: bool,
}

impl<I> FieldTimeout<I> {
    pub(crate) fn new(inner: I, field: String, max_drift: Duration) -> Self {
        FieldTimeout { inner, field, max_drift, first_seen: None, done: false }
    }
}

impl<I: Iterator<Item = Record>> Iterator for FieldTimeout<I> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.done {
            return None;
        }
        let record = self.inner.next()?;
        let Some(current) = time_field(&record, &self.field) else {
            return Some(record);
        };
        let first = *self.first_seen.get_or_insert(current);
        let drift = (current - first).to_std().unwrap_or(Duration::ZERO);
        if drift > self.max_drift {
            self.done = true;
            return None;
        }
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::RecordIteratorExt;

    fn rec(region: &str, amount: i64) -> Record {
        Record::builder().set_string("region", region).set_int("amount", amount).freeze()
    }

    #[test]
    fn group_by_preserves_first_seen_order() {
        let input = vec![rec("N", 1200), rec("S", 800), rec("N", 900), rec("E", 1100), rec("S", 1300)];
        let groups: Vec<Record> = input.into_iter().group_by(["region"], "sales_data").collect();
        let regions: Vec<String> = groups.iter().map(|r| r.get::<String>("region").unwrap()).collect();
        assert_eq!(regions, vec!["N", "S", "E"]);
    }
}
