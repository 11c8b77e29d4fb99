//! materialize / materialize-json: collapse a field's content into a
//! deterministic string, the idiomatic pre-step to grouping by sub-sequence
//! or nested-record content.

use crate::record::Record;
use crate::value::Value;

/// Joins a sub-sequence field's elements with `separator` into a new string
/// field. No-op (field left absent) if the source field isn't a sequence.
pub struct Materialize<I> {
    inner: I,
    field: String,
    output_field: String,
    separator: String,
}

impl<I> Materialize<I> {
    pub(crate) fn new(inner: I, field: String, output_field: String, separator: String) -> Self {
        Materialize { inner, field, output_field, separator }
    }
}

impl<I: Iterator<Item = Record>> Iterator for Materialize<I> {
    type Item = Record;
    fn next(&mut self) -> Option<Record> {
        let record = self.inner.next()?;
        let Some(seq) = record.take_sequence(&self.field) else {
            return Some(record);
        };
        let joined = seq
            .materialize()
            .into_iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(&self.separator);
        Some(record.into_builder().set_string(self.output_field.clone(), joined).freeze())
    }
}

/// Renders any field as a compact JSON document, applicable to scalars,
/// nested records, and sub-sequences alike.
pub struct MaterializeJson<I> {
    inner: I,
    field: String,
    output_field: String,
}

impl<I> MaterializeJson<I> {
    pub(crate) fn new(inner: I, field: String, output_field: String) -> Self {
        MaterializeJson { inner, field, output_field }
    }
}

impl<I: Iterator<Item = Record>> Iterator for MaterializeJson<I> {
    type Item = Record;
    fn next(&mut self) -> Option<Record> {
        let record = self.inner.next()?;
        let Some(value) = record.get_value(&self.field).cloned() else {
            return Some(record);
        };
        let json = value.to_json().to_string();
        Some(record.into_builder().set_string(self.output_field.clone(), json).freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::RecordIteratorExt;
    use crate::sequence::{Sequence, SequenceElement};

    #[test]
    fn materialize_json_then_group_matches_the_worked_scenario() {
        let tagged = |tags: Vec<&str>| {
            Record::builder()
                .set_sequence(
                    "tags",
                    Sequence::from_vec(tags.into_iter().map(|t| SequenceElement::String(t.into())).collect()),
                )
                .freeze()
        };
        let input = vec![
            tagged(vec!["urgent", "work"]),
            tagged(vec!["urgent", "work"]),
            tagged(vec!["personal"]),
        ];
        let out: Vec<Record> = input
            .into_iter()
            .materialize_json("tags", "k")
            .group_by(["k"], "members")
            .aggregate("members", vec![("count".to_string(), crate::iter::AggSpec::count())])
            .collect();
        let mut sizes: Vec<i64> = out.iter().map(|r| r.get::<i64>("count").unwrap()).collect();
        sizes.sort();
        assert_eq!(sizes, vec![1, 2]);
    }
}
