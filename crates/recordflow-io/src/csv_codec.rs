//! CSV reader/writer, tied to the data model's parse heuristic and
//! sub-sequence/nested-record materialization rules.

use std::io::{Read, Write};

use chrono::{DateTime, Utc};

use recordflow_core::record::Record;
use recordflow_core::sequence::{Sequence, SequenceElement};
use recordflow_core::value::Value;
use recordflow_core::Error;

/// Reader options. The list separator is distinct from the column
/// delimiter so a value can itself look like a small list inside one cell
/// (e.g. `"red;blue"` in a comma-delimited file).
#[derive(Debug, Clone)]
pub struct CsvReaderConfig {
    pub delimiter: u8,
    pub list_separator: char,
    pub trim: bool,
}

impl Default for CsvReaderConfig {
    fn default() -> Self {
        CsvReaderConfig { delimiter: b',', list_separator: ';', trim: true }
    }
}

/// What the writer does when a record carries a field absent from the
/// header established by the first record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewFieldPolicy {
    Ignore,
    Error,
}

#[derive(Debug, Clone)]
pub struct CsvWriterConfig {
    pub delimiter: u8,
    pub list_separator: char,
    pub on_new_field: NewFieldPolicy,
}

impl Default for CsvWriterConfig {
    fn default() -> Self {
        CsvWriterConfig { delimiter: b',', list_separator: ';', on_new_field: NewFieldPolicy::Ignore }
    }
}

/// An error-aware iterator over CSV rows. The header row is required and
/// consumed at construction; each subsequent record is augmented with a
/// `_line_number` field, 1-based, counting the header as line 1.
pub struct CsvReader<R> {
    inner: csv::Reader<R>,
    headers: Vec<String>,
    list_separator: char,
    next_line: u64,
}

pub fn read_csv<R: Read>(reader: R, config: CsvReaderConfig) -> Result<CsvReader<R>, Error> {
    let mut inner = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .trim(if config.trim { csv::Trim::All } else { csv::Trim::None })
        .from_reader(reader);
    let headers: Vec<String> = inner
        .headers()
        .map_err(|e| Error::codec(e.to_string(), Some(1)))?
        .iter()
        .map(str::to_string)
        .collect();
    Ok(CsvReader { inner, headers, list_separator: config.list_separator, next_line: 2 })
}

impl<R: Read> Iterator for CsvReader<R> {
    type Item = Result<Record, Error>;

    fn next(&mut self) -> Option<Result<Record, Error>> {
        let mut row = csv::StringRecord::new();
        match self.inner.read_record(&mut row) {
            Ok(true) => {
                let line = self.next_line;
                self.next_line += 1;
                let mut builder = Record::builder();
                for (name, cell) in self.headers.iter().zip(row.iter()) {
                    builder = builder.set(name.clone(), parse_cell(cell, self.list_separator));
                }
                builder = builder.set_int("_line_number", line as i64);
                Some(Ok(builder.freeze()))
            }
            Ok(false) => None,
            Err(e) => Some(Err(Error::codec(e.to_string(), Some(self.next_line)))),
        }
    }
}

fn parse_cell(raw: &str, list_separator: char) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Int(i);
    }
    if !raw.is_empty() {
        if let Ok(f) = raw.parse::<f64>() {
            return Value::Float(f);
        }
    }
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Value::Time(t.with_timezone(&Utc));
    }
    if raw.contains(list_separator) {
        let elements: Vec<SequenceElement> =
            raw.split(list_separator).map(|s| SequenceElement::String(s.trim().to_string())).collect();
        return Value::Sequence(Sequence::from_vec(elements));
    }
    Value::String(raw.to_string())
}

/// Writes `records` as CSV. The header is the union of field names in the
/// insertion order of the first record; later records missing a field emit
/// an empty cell. Sub-sequence fields are materialized as a
/// delimiter-joined string; nested records as a compact JSON document.
pub fn write_csv<W: Write>(
    records: impl Iterator<Item = Record>,
    writer: W,
    config: CsvWriterConfig,
) -> Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new().delimiter(config.delimiter).from_writer(writer);
    let mut header: Option<Vec<String>> = None;

    for record in records {
        let field_names = match &header {
            Some(h) => h.clone(),
            None => {
                let names: Vec<String> = record.field_names().cloned().collect();
                wtr.write_record(&names).map_err(|e| Error::codec(e.to_string(), None))?;
                header = Some(names.clone());
                names
            }
        };

        if config.on_new_field == NewFieldPolicy::Error {
            for name in record.field_names() {
                if !field_names.contains(name) {
                    return Err(Error::codec(format!("field '{name}' not present in CSV header"), None));
                }
            }
        }

        let row: Vec<String> =
            field_names.iter().map(|name| render_cell(&record, name, config.list_separator)).collect();
        wtr.write_record(&row).map_err(|e| Error::codec(e.to_string(), None))?;
    }
    wtr.flush().map_err(Error::Io)
}

fn render_cell(record: &Record, name: &str, list_separator: char) -> String {
    match record.get_value(name) {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Int(i)) => i.to_string(),
        Some(Value::Float(f)) => f.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Time(t)) => t.to_rfc3339(),
        Some(Value::Json(j)) => j.as_str().to_string(),
        Some(Value::Record(r)) => r.to_json().to_string(),
        Some(Value::Sequence(seq)) => seq
            .materialize()
            .into_iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(&list_separator.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_header_and_heuristic_types_with_line_numbers() {
        let csv = "region,amount,active\nN,1200,true\nS,800,false\n";
        let records: Vec<Record> = read_csv(csv.as_bytes(), CsvReaderConfig::default())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get::<String>("region").as_deref(), Some("N"));
        assert_eq!(records[0].get::<i64>("amount"), Some(1200));
        assert_eq!(records[0].get::<bool>("active"), Some(true));
        assert_eq!(records[0].get::<i64>("_line_number"), Some(2));
        assert_eq!(records[1].get::<i64>("_line_number"), Some(3));
    }

    #[test]
    fn round_trips_scalars_through_csv() {
        let record = Record::builder().set_string("name", "x").set_int("amount", 10).freeze();
        let mut buf = Vec::new();
        write_csv(vec![record].into_iter(), &mut buf, CsvWriterConfig::default()).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.starts_with("name,amount\n"));
        assert!(out.contains("x,10"));
    }
}
