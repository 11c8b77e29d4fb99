//! Canonical CSV and JSON-lines codecs for [`recordflow_core::Record`]s.
//!
//! Both codecs are thin adapters from a `std::io` reader/writer to the
//! iterator-based operator algebra in `recordflow-core`: `read_csv` and
//! `read_json` return `Iterator<Item = Result<Record, Error>>`, ready to
//! compose with `unsafe_`/`ignore_errors` or any other operator.

pub mod csv_codec;
pub mod json_codec;

pub use csv_codec::{read_csv, write_csv, CsvReader, CsvReaderConfig, CsvWriterConfig, NewFieldPolicy};
pub use json_codec::{read_json, write_json, JsonReader};

pub use recordflow_core::Error;
