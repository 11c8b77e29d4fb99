//! A string value known to carry a valid JSON document, preserved verbatim
//! by the JSON codec so it is never re-escaped or double-encoded.

use std::fmt;

use serde_json::Value as Json;

/// An opaque, immutable wrapper around a UTF-8 string that is expected to
/// contain a JSON document. Construction does not validate; call
/// [`JsonString::is_valid`] or [`JsonString::parse`] to check/use the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonString(String);

impl JsonString {
    /// Wrap a raw string without validating it.
    pub fn new(raw: impl Into<String>) -> Self {
        JsonString(raw.into())
    }

    /// Build a `JsonString` by serializing a `serde_json::Value`.
    pub fn from_json(value: &Json) -> Self {
        JsonString(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// True if the wrapped text parses as JSON.
    pub fn is_valid(&self) -> bool {
        serde_json::from_str::<Json>(&self.0).is_ok()
    }

    /// Parse the wrapped text, returning `None` if it is not valid JSON.
    pub fn parse(&self) -> Option<Json> {
        serde_json::from_str(&self.0).ok()
    }

    /// Pretty-print the wrapped JSON, falling back to the raw text if it
    /// does not parse.
    pub fn pretty(&self) -> String {
        match self.parse() {
            Some(v) => serde_json::to_string_pretty(&v).unwrap_or_else(|_| self.0.clone()),
            None => self.0.clone(),
        }
    }
}

impl fmt::Display for JsonString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
