//! Environment-driven configuration for the demo binary.

use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
}

impl Format {
    fn from_env(var: &str, default: Format) -> Format {
        match env::var(var) {
            Ok(v) if v.eq_ignore_ascii_case("json") => Format::Json,
            Ok(v) if v.eq_ignore_ascii_case("csv") => Format::Csv,
            Ok(v) => panic!("{var}: unrecognized format '{v}', expected 'csv' or 'json'"),
            Err(_) => default,
        }
    }
}

/// Configuration for the `recordflow` demo binary, read once at startup.
/// Fields are sourced entirely from environment variables so the binary
/// needs no argument parser; missing values fall back to sane defaults,
/// malformed ones panic immediately rather than running with a guess.
pub struct Config {
    pub input_format: Format,
    pub output_format: Format,
    pub group_by_field: String,
    pub sum_field: String,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            input_format: Format::from_env("RECORDFLOW_INPUT_FORMAT", Format::Csv),
            output_format: Format::from_env("RECORDFLOW_OUTPUT_FORMAT", Format::Json),
            group_by_field: env::var("RECORDFLOW_GROUP_BY").unwrap_or_else(|_| "region".to_string()),
            sum_field: env::var("RECORDFLOW_SUM_FIELD").unwrap_or_else(|_| "amount".to_string()),
        }
    }
}
