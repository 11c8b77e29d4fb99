//! dot-flatten and cross-flatten: pairwise vs Cartesian expansion of a
//! record's sub-sequence fields, with depth-first nested-record inlining
//! applied first in both cases.

use crate::record::{Record, RecordBuilder};
use crate::sequence::SequenceElement;
use crate::value::Value;

fn inline_nested(record: &Record, separator: &str) -> Record {
    let mut builder = Record::builder();
    for (name, value) in record.iter() {
        match value {
            Value::Record(nested) => {
                let inlined = inline_nested(nested, separator);
                for (sub_name, sub_value) in inlined.iter() {
                    builder = builder.set(format!("{name}{separator}{sub_name}"), sub_value.clone());
                }
            }
            other => {
                builder = builder.set(name.clone(), other.clone());
            }
        }
    }
    builder.freeze()
}

fn auto_select_sequence_fields(record: &Record) -> Vec<String> {
    record
        .iter()
        .filter_map(|(name, value)| matches!(value, Value::Sequence(_)).then(|| name.clone()))
        .collect()
}

fn element_into_value(element: SequenceElement) -> Value {
    match element {
        SequenceElement::String(s) => Value::String(s),
        SequenceElement::Int(i) => Value::Int(i),
        SequenceElement::Float(f) => Value::Float(f),
        SequenceElement::Bool(b) => Value::Bool(b),
        SequenceElement::Record(r) => Value::Record(r),
    }
}

fn materialize_named_fields(record: &Record, field_names: &[String]) -> Vec<(String, Vec<SequenceElement>)> {
    field_names
        .iter()
        .filter_map(|name| record.take_sequence(name).map(|seq| (name.clone(), seq.materialize())))
        .collect()
}

fn expand_dot(record: Record, separator: &str, fields: &[String]) -> Vec<Record> {
    let inlined = inline_nested(&record, separator);
    let field_names = if fields.is_empty() { auto_select_sequence_fields(&inlined) } else { fields.to_vec() };
    let materialized = materialize_named_fields(&inlined, &field_names);
    if materialized.is_empty() {
        return vec![inlined];
    }
    let len = materialized.iter().map(|(_, v)| v.len()).min().unwrap_or(0);
    (0..len)
        .map(|i| {
            let mut builder: RecordBuilder = inlined.clone().into_builder();
            for (name, elements) in &materialized {
                builder = builder.set(name.clone(), element_into_value(elements[i].clone()));
            }
            builder.freeze()
        })
        .collect()
}

fn expand_cross(record: Record, separator: &str, fields: &[String]) -> Vec<Record> {
    let inlined = inline_nested(&record, separator);
    let field_names = if fields.is_empty() { auto_select_sequence_fields(&inlined) } else { fields.to_vec() };
    let materialized = materialize_named_fields(&inlined, &field_names);
    if materialized.is_empty() {
        return vec![inlined];
    }

    // Cartesian product of index tuples, one tuple per output record.
    let mut index_tuples: Vec<Vec<usize>> = vec![vec![]];
    for (_, elements) in &materialized {
        let mut next = Vec::with_capacity(index_tuples.len() * elements.len());
        for prefix in &index_tuples {
            for i in 0..elements.len() {
                let mut t = prefix.clone();
                t.push(i);
                next.push(t);
            }
        }
        index_tuples = next;
    }

    index_tuples
        .into_iter()
        .map(|indices| {
            let mut builder: RecordBuilder = inlined.clone().into_builder();
            for (tuple_idx, (name, elements)) in materialized.iter().enumerate() {
                let i = indices[tuple_idx];
                builder = builder.set(name.clone(), element_into_value(elements[i].clone()));
            }
            builder.freeze()
        })
        .collect()
}

/// See [`crate::iter::RecordIteratorExt::dot_flatten`].
pub struct DotFlatten<I> {
    inner: I,
    separator: String,
    fields: Vec<String>,
    pending: std::vec::IntoIter<Record>,
}

impl<I> DotFlatten<I> {
    pub(crate) fn new(inner: I, separator: String, fields: Vec<String>) -> Self {
        DotFlatten { inner, separator, fields, pending: Vec::new().into_iter() }
    }
}

impl<I: Iterator<Item = Record>> Iterator for DotFlatten<I> {
    type Item = Record;
    fn next(&mut self) -> Option<Record> {
        loop {
            if let Some(r) = self.pending.next() {
                return Some(r);
            }
            let record = self.inner.next()?;
            self.pending = expand_dot(record, &self.separator, &self.fields).into_iter();
        }
    }
}

/// See [`crate::iter::RecordIteratorExt::cross_flatten`].
pub struct CrossFlatten<I> {
    inner: I,
    separator: String,
    fields: Vec<String>,
    pending: std::vec::IntoIter<Record>,
}

impl<I> CrossFlatten<I> {
    pub(crate) fn new(inner: I, separator: String, fields: Vec<String>) -> Self {
        CrossFlatten { inner, separator, fields, pending: Vec::new().into_iter() }
    }
}

impl<I: Iterator<Item = Record>> Iterator for CrossFlatten<I> {
    type Item = Record;
    fn next(&mut self) -> Option<Record> {
        loop {
            if let Some(r) = self.pending.next() {
                return Some(r);
            }
            let record = self.inner.next()?;
            self.pending = expand_cross(record, &self.separator, &self.fields).into_iter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::RecordIteratorExt;
    use crate::sequence::Sequence;

    fn tshirt() -> Record {
        Record::builder()
            .set_string("name", "T-Shirt")
            .set_float("base_price", 19.99)
            .set_sequence(
                "colors",
                Sequence::from_vec(vec![
                    SequenceElement::String("red".into()),
                    SequenceElement::String("blue".into()),
                ]),
            )
            .set_sequence(
                "sizes",
                Sequence::from_vec(vec![
                    SequenceElement::String("small".into()),
                    SequenceElement::String("large".into()),
                ]),
            )
            .freeze()
    }

    #[test]
    fn dot_flatten_pairs_elements() {
        let out: Vec<Record> =
            vec![tshirt()].into_iter().dot_flatten(".", vec!["colors".into(), "sizes".into()]).collect();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get::<String>("colors").as_deref(), Some("red"));
        assert_eq!(out[0].get::<String>("sizes").as_deref(), Some("small"));
        assert_eq!(out[1].get::<String>("colors").as_deref(), Some("blue"));
        assert_eq!(out[1].get::<String>("sizes").as_deref(), Some("large"));
    }

    #[test]
    fn cross_flatten_produces_the_cartesian_product() {
        let out: Vec<Record> =
            vec![tshirt()].into_iter().cross_flatten(".", vec!["colors".into(), "sizes".into()]).collect();
        assert_eq!(out.len(), 4);
    }
}
