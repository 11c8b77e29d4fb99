//! aggregate: reduces the sub-sequence field produced by `group_by` into
//! one summary field per aggregator.

use std::sync::Arc;

use crate::record::{Record, RecordBuilder};
use crate::sequence::SequenceElement;
use crate::value::Value;

/// A fold-with-finalizer reduction over a group's member records. User
/// aggregators implement this directly; the built-ins (`count`, `sum`, ...)
/// are ordinary implementations of the same trait.
pub trait Aggregator: Send + Sync {
    /// Start a fresh accumulation for one group.
    fn start(&self) -> Box<dyn AggregatorState>;
}

/// Per-group accumulator produced by an [`Aggregator`].
pub trait AggregatorState {
    fn accumulate(&mut self, record: &Record);
    fn finish(self: Box<Self>) -> Value;
}

/// A named, reusable aggregator specification. Construct with the
/// associated functions (`AggSpec::count()`, `AggSpec::sum("amount")`, ...)
/// or wrap a user type implementing [`Aggregator`] with [`AggSpec::custom`].
#[derive(Clone)]
pub struct AggSpec(Arc<dyn Aggregator>);

impl AggSpec {
    pub fn custom(aggregator: Arc<dyn Aggregator>) -> Self {
        AggSpec(aggregator)
    }

    pub fn count() -> Self {
        AggSpec(Arc::new(CountAgg))
    }
    pub fn sum(field: impl Into<String>) -> Self {
        AggSpec(Arc::new(SumAgg { field: field.into() }))
    }
    pub fn avg(field: impl Into<String>) -> Self {
        AggSpec(Arc::new(AvgAgg { field: field.into() }))
    }
    pub fn min(field: impl Into<String>) -> Self {
        AggSpec(Arc::new(MinMaxAgg { field: field.into(), want_max: false }))
    }
    pub fn max(field: impl Into<String>) -> Self {
        AggSpec(Arc::new(MinMaxAgg { field: field.into(), want_max: true }))
    }
    pub fn first(field: impl Into<String>) -> Self {
        AggSpec(Arc::new(FirstLastAgg { field: field.into(), want_last: false }))
    }
    pub fn last(field: impl Into<String>) -> Self {
        AggSpec(Arc::new(FirstLastAgg { field: field.into(), want_last: true }))
    }
    pub fn collect(field: impl Into<String>) -> Self {
        AggSpec(Arc::new(CollectAgg { field: field.into() }))
    }
}

struct CountAgg;
impl Aggregator for CountAgg {
    fn start(&self) -> Box<dyn AggregatorState> {
        Box::new(CountState(0))
    }
}
struct CountState(i64);
impl AggregatorState for CountState {
    fn accumulate(&mut self, _record: &Record) {
        self.0 += 1;
    }
    fn finish(self: Box<Self>) -> Value {
        Value::Int(self.0)
    }
}

struct SumAgg {
    field: String,
}
impl Aggregator for SumAgg {
    fn start(&self) -> Box<dyn AggregatorState> {
        Box::new(SumState { field: self.field.clone(), total: 0.0 })
    }
}
struct SumState {
    field: String,
    total: f64,
}
impl AggregatorState for SumState {
    fn accumulate(&mut self, record: &Record) {
        if let Some(v) = record.get_value(&self.field).and_then(Value::as_f64) {
            self.total += v;
        }
    }
    fn finish(self: Box<Self>) -> Value {
        Value::Float(self.total)
    }
}

struct AvgAgg {
    field: String,
}
impl Aggregator for AvgAgg {
    fn start(&self) -> Box<dyn AggregatorState> {
        Box::new(AvgState { field: self.field.clone(), total: 0.0, count: 0 })
    }
}
struct AvgState {
    field: String,
    total: f64,
    count: u64,
}
impl AggregatorState for AvgState {
    fn accumulate(&mut self, record: &Record) {
        if let Some(v) = record.get_value(&self.field).and_then(Value::as_f64) {
            self.total += v;
            self.count += 1;
        }
    }
    fn finish(self: Box<Self>) -> Value {
        if self.count == 0 {
            Value::Float(0.0)
        } else {
            Value::Float(self.total / self.count as f64)
        }
    }
}

struct MinMaxAgg {
    field: String,
    want_max: bool,
}
impl Aggregator for MinMaxAgg {
    fn start(&self) -> Box<dyn AggregatorState> {
        Box::new(MinMaxState { field: self.field.clone(), want_max: self.want_max, best: None })
    }
}
struct MinMaxState {
    field: String,
    want_max: bool,
    best: Option<Value>,
}
impl AggregatorState for MinMaxState {
    fn accumulate(&mut self, record: &Record) {
        let Some(candidate) = record.get_value(&self.field) else { return };
        let Some(candidate_num) = candidate.as_f64() else { return };
        let replace = match &self.best {
            None => true,
            Some(current) => match current.as_f64() {
                Some(current_num) => {
                    if self.want_max {
                        candidate_num > current_num
                    } else {
                        candidate_num < current_num
                    }
                }
                None => true,
            },
        };
        if replace {
            self.best = Some(candidate.clone());
        }
    }
    fn finish(self: Box<Self>) -> Value {
        self.best.unwrap_or(Value::Float(0.0))
    }
}

struct FirstLastAgg {
    field: String,
    want_last: bool,
}
impl Aggregator for FirstLastAgg {
    fn start(&self) -> Box<dyn AggregatorState> {
        Box::new(FirstLastState { field: self.field.clone(), want_last: self.want_last, value: None })
    }
}
struct FirstLastState {
    field: String,
    want_last: bool,
    value: Option<Value>,
}
impl AggregatorState for FirstLastState {
    fn accumulate(&mut self, record: &Record) {
        let Some(candidate) = record.get_value(&self.field) else { return };
        if self.value.is_none() || self.want_last {
            self.value = Some(candidate.clone());
        }
    }
    fn finish(self: Box<Self>) -> Value {
        self.value.unwrap_or(Value::Float(0.0))
    }
}

struct CollectAgg {
    field: String,
}
impl Aggregator for CollectAgg {
    fn start(&self) -> Box<dyn AggregatorState> {
        Box::new(CollectState { field: self.field.clone(), values: Vec::new() })
    }
}
struct CollectState {
    field: String,
    values: Vec<Value>,
}
impl AggregatorState for CollectState {
    fn accumulate(&mut self, record: &Record) {
        if let Some(v) = record.get_value(&self.field) {
            self.values.push(v.clone());
        }
    }
    fn finish(self: Box<Self>) -> Value {
        let elements: Vec<SequenceElement> = self
            .values
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(SequenceElement::String(s)),
                Value::Int(i) => Some(SequenceElement::Int(i)),
                Value::Float(f) => Some(SequenceElement::Float(f)),
                Value::Bool(b) => Some(SequenceElement::Bool(b)),
                Value::Record(r) => Some(SequenceElement::Record(r)),
                _ => None,
            })
            .collect();
        Value::Sequence(crate::sequence::Sequence::from_vec(elements))
    }
}

/// Reduces the sub-sequence field at `source_field` into one output field
/// per aggregator, removing the sub-sequence field. One output per input:
/// unlike `GroupBy`, this does not buffer — it assumes each input record is
/// already a whole group (typically freshly produced by `group_by`).
pub struct Aggregate<I> {
    inner: I,
    source_field: String,
    specs: Vec<(String, AggSpec)>,
}

impl<I> Aggregate<I> {
    pub(crate) fn new(inner: I, source_field: String, specs: Vec<(String, AggSpec)>) -> Self {
        Aggregate { inner, source_field, specs }
    }
}

impl<I: Iterator<Item = Record>> Iterator for Aggregate<I> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        let group = self.inner.next()?;
        let members: Vec<Record> = group
            .take_sequence(&self.source_field)
            .map(|seq| {
                seq.materialize()
                    .into_iter()
                    .filter_map(|e| match e {
                        SequenceElement::Record(r) => Some(r),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut builder: RecordBuilder = group.into_builder().remove(&self.source_field);
        for (name, spec) in &self.specs {
            let mut state = spec.0.start();
            for member in &members {
                state.accumulate(member);
            }
            builder = builder.set(name.clone(), state.finish());
        }
        Some(builder.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::RecordIteratorExt;

    fn rec(region: &str, amount: i64) -> Record {
        Record::builder().set_string("region", region).set_int("amount", amount).freeze()
    }

    #[test]
    fn group_and_aggregate_matches_the_worked_scenario() {
        let input = vec![rec("N", 1200), rec("S", 800), rec("N", 900), rec("E", 1100), rec("S", 1300)];
        let out: Vec<Record> = input
            .into_iter()
            .group_by(["region"], "sales_data")
            .aggregate("sales_data", vec![
                ("total".to_string(), AggSpec::sum("amount")),
                ("count".to_string(), AggSpec::count()),
            ])
            .collect();

        let totals: Vec<(String, f64, i64)> = out
            .iter()
            .map(|r| {
                (
                    r.get::<String>("region").unwrap(),
                    r.get::<f64>("total").unwrap(),
                    r.get::<i64>("count").unwrap(),
                )
            })
            .collect();
        assert_eq!(
            totals,
            vec![
                ("N".to_string(), 2100.0, 2),
                ("S".to_string(), 2100.0, 2),
                ("E".to_string(), 1100.0, 1),
            ]
        );
    }
}
