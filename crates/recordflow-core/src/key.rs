//! The hashable projection of [`Value`](crate::value::Value) used as group-by
//! and join keys. Sub-sequence values have no `KeyValue` representation:
//! `Value::as_key` returns `None` for them, and operators that build key
//! tuples skip the affected record (see the design note on grouping by
//! sub-sequence content).

/// A hashable value drawn from the taxonomy's key-eligible subset.
///
/// Floats compare/hash on their raw bit pattern rather than numeric value,
/// which is the usual trick for giving `f64` a total `Eq`/`Hash` impl; it
/// means `0.0` and `-0.0` are distinct keys, which is acceptable for the
/// grouping/joining use case this type exists for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    String(String),
    Int(i64),
    Float(u64),
    Bool(bool),
    /// Nanoseconds since the Unix epoch.
    Time(i64),
    /// Raw text of a JSON-tagged string, compared byte-for-byte.
    Json(String),
    /// A nested record's fields, recursively keyed, in field order.
    Record(Vec<(String, KeyValue)>),
    /// Placeholder for a key field that was absent from the record. Only
    /// equal to another `Absent` for the same field name.
    Absent(String),
}
