//! The error taxonomy shared by every recordflow crate.
//!
//! Only the variants that §7 of the design actually needs surface here.
//! Type-coercion failures (`Record::get`) deliberately do NOT produce an
//! `Error`: they return `None`, as specified, and never panic.

use std::fmt;

/// Errors that can travel through an error-aware record stream, or be
/// returned from a fallible constructor (`read_csv`, `read_json`, ...).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying I/O failure opening or reading a source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed CSV or JSON line, with the line number if known.
    #[error("codec error at line {line:?}: {message}")]
    Codec { message: String, line: Option<u64> },

    /// A caller-supplied predicate or map function failed inside
    /// `filter_safe`/`map_safe`.
    #[error("predicate/map error: {0}")]
    Predicate(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Catch-all for conditions that don't warrant their own variant.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Construct a codec error, optionally tagged with the 1-based input line.
    pub fn codec(message: impl Into<String>, line: Option<u64>) -> Self {
        Error::Codec { message: message.into(), line }
    }

    /// Wrap a caller's fallible predicate/map error for `filter_safe`/`map_safe`.
    pub fn predicate<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Predicate(Box::new(err))
    }

    /// Construct an ad hoc error from a displayable message.
    pub fn other(message: impl fmt::Display) -> Self {
        Error::Other(message.to_string())
    }
}
