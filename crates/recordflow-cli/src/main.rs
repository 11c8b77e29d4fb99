//! `recordflow` demo binary: stdin -> codec -> group_by + aggregate ->
//! codec -> stdout. Arg/env handling, logging, and framing here are
//! ambient to the demo; they are not part of the engine's contract in
//! `recordflow-core`.

mod config;
mod log;

use std::io;

use recordflow_core::iter::{AggSpec, RecordIteratorExt};
use recordflow_core::{Error, Record};
use recordflow_io::{read_csv, read_json, write_csv, write_json, CsvReaderConfig, CsvWriterConfig};

use config::{Config, Format};
use log::Log;

fn main() {
    let log = Log::new("recordflow");
    let config = Config::from_env();
    log.initializing();

    let stdin = io::stdin();
    let records: Vec<Record> = match config.input_format {
        Format::Csv => {
            let reader =
                read_csv(stdin.lock(), CsvReaderConfig::default()).expect("stdin is not valid CSV (no header row?)");
            collect_records(reader, &log)
        }
        Format::Json => collect_records(read_json(stdin.lock()), &log),
    };
    log.print(&format!("read {} record(s)", records.len()));

    let output: Vec<Record> = records
        .into_iter()
        .group_by([config.group_by_field.clone()], "members")
        .aggregate(
            "members",
            vec![
                ("total".to_string(), AggSpec::sum(config.sum_field.clone())),
                ("count".to_string(), AggSpec::count()),
            ],
        )
        .collect();
    log.print(&format!("emitting {} group(s)", output.len()));

    let stdout = io::stdout();
    let handle = stdout.lock();
    match config.output_format {
        Format::Csv => write_csv(output.into_iter(), handle, CsvWriterConfig::default())
            .expect("failed to write CSV to stdout"),
        Format::Json => write_json(output.into_iter(), handle).expect("failed to write JSON to stdout"),
    }
    log.print("done");
}

/// Skips malformed lines rather than aborting the whole run, logging a
/// count at the end — the non-error-channel codec behavior from the error
/// handling design.
fn collect_records(iter: impl Iterator<Item = Result<Record, Error>>, log: &Log) -> Vec<Record> {
    let mut skipped = 0u64;
    let mut out = Vec::new();
    for item in iter {
        match item {
            Ok(record) => out.push(record),
            Err(e) => {
                skipped += 1;
                log.print(&format!("skipping malformed record: {e}"));
            }
        }
    }
    if skipped > 0 {
        log.print(&format!("skipped {skipped} malformed record(s) total"));
    }
    out
}
