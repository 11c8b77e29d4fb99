//! JSON-lines (one object per line) reader/writer.

use std::io::{BufRead, Write};

use recordflow_core::record::Record;
use recordflow_core::sequence::{Sequence, SequenceElement};
use recordflow_core::value::Value;
use recordflow_core::Error;

fn json_to_sequence_element(value: &serde_json::Value) -> SequenceElement {
    match value {
        serde_json::Value::Bool(b) => SequenceElement::Bool(*b),
        serde_json::Value::Number(n) => SequenceElement::Float(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => SequenceElement::String(s.clone()),
        serde_json::Value::Object(map) => SequenceElement::Record(json_object_to_record(map)),
        // Arrays-of-arrays and null have no representation in the element
        // taxonomy; fall back to their compact JSON text rather than drop them.
        other => SequenceElement::String(other.to_string()),
    }
}

fn json_to_value(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        // The JSON codec collapses int and float to one numeric type on read;
        // consumers use the numeric-agnostic typed accessors.
        serde_json::Value::Number(n) => Some(Value::Float(n.as_f64().unwrap_or(0.0))),
        serde_json::Value::String(s) => Some(Value::String(s.clone())),
        serde_json::Value::Array(items) => {
            Some(Value::Sequence(Sequence::from_vec(items.iter().map(json_to_sequence_element).collect())))
        }
        serde_json::Value::Object(map) => Some(Value::Record(json_object_to_record(map))),
    }
}

fn json_object_to_record(map: &serde_json::Map<String, serde_json::Value>) -> Record {
    let mut builder = Record::builder();
    for (key, value) in map {
        if let Some(v) = json_to_value(value) {
            builder = builder.set(key.clone(), v);
        }
    }
    builder.freeze()
}

/// An error-aware iterator over JSONL records. Each record is augmented
/// with a `_line_number` field, 1-based.
pub struct JsonReader<R> {
    lines: std::io::Lines<R>,
    line_number: u64,
}

pub fn read_json<R: BufRead>(reader: R) -> JsonReader<R> {
    JsonReader { lines: reader.lines(), line_number: 0 }
}

impl<R: BufRead> Iterator for JsonReader<R> {
    type Item = Result<Record, Error>;

    fn next(&mut self) -> Option<Result<Record, Error>> {
        loop {
            let line = match self.lines.next()? {
                Ok(l) => l,
                Err(e) => return Some(Err(Error::Io(e))),
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            let parsed: serde_json::Value = match serde_json::from_str(&line) {
                Ok(v) => v,
                Err(e) => return Some(Err(Error::codec(e.to_string(), Some(self.line_number)))),
            };
            let serde_json::Value::Object(map) = parsed else {
                return Some(Err(Error::codec("expected one JSON object per line", Some(self.line_number))));
            };
            let record = json_object_to_record(&map)
                .into_builder()
                .set_int("_line_number", self.line_number as i64)
                .freeze();
            return Some(Ok(record));
        }
    }
}

/// Writes `records` as JSONL: one compact JSON object per line. Sub-sequence
/// fields become JSON arrays (fully drained); nested records become
/// objects; JSON-tagged strings are emitted as their parsed structure,
/// never re-escaped; times as RFC-3339 strings.
pub fn write_json<W: Write>(records: impl Iterator<Item = Record>, mut writer: W) -> Result<(), Error> {
    for record in records {
        writeln!(writer, "{}", record.to_json()).map_err(Error::Io)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_nested_objects_and_arrays_with_line_numbers() {
        let input = "{\"name\":\"x\",\"tags\":[\"a\",\"b\"],\"meta\":{\"k\":1}}\n";
        let records: Vec<Record> = read_json(input.as_bytes()).collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.get::<String>("name").as_deref(), Some("x"));
        assert_eq!(r.get::<i64>("_line_number"), Some(1));
        let nested = r.get::<Record>("meta").unwrap();
        assert_eq!(nested.get::<f64>("k"), Some(1.0));
    }

    #[test]
    fn writer_emits_one_compact_object_per_line() {
        let record = Record::builder().set_string("name", "x").set_int("amount", 5).freeze();
        let mut buf = Vec::new();
        write_json(vec![record].into_iter(), &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("\"name\":\"x\""));
    }
}
