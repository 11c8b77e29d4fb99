//! Streaming aggregations: per-record running reductions that need no
//! buffering and emit exactly one enriched record per input record.

use std::collections::VecDeque;

use indexmap::IndexMap;

use crate::record::Record;
use crate::value::Value;

/// Adds `running_sum`, `running_count`, `running_avg` over `field`.
pub struct RunningSum<I> {
    inner: I,
    field: String,
    total: f64,
    count: u64,
}

impl<I> RunningSum<I> {
    pub(crate) fn new(inner: I, field: String) -> Self {
        RunningSum { inner, field, total: 0.0, count: 0 }
    }
}

impl<I: Iterator<Item = Record>> Iterator for RunningSum<I> {
    type Item = Record;
    fn next(&mut self) -> Option<Record> {
        let record = self.inner.next()?;
        let Some(v) = record.get_value(&self.field).and_then(Value::as_f64) else {
            return Some(record);
        };
        self.total += v;
        self.count += 1;
        let avg = self.total / self.count as f64;
        Some(
            record
                .into_builder()
                .set_float("running_sum", self.total)
                .set_int("running_count", self.count as i64)
                .set_float("running_avg", avg)
                .freeze(),
        )
    }
}

/// Adds `moving_avg` (over the last `window` values of `field`) and
/// `window_size` (how many values the average is currently over).
pub struct RunningAverage<I> {
    inner: I,
    field: String,
    window: usize,
    recent: VecDeque<f64>,
}

impl<I> RunningAverage<I> {
    pub(crate) fn new(inner: I, field: String, window: usize) -> Self {
        assert!(window > 0, "running_average: window must be positive");
        RunningAverage { inner, field, window, recent: VecDeque::new() }
    }
}

impl<I: Iterator<Item = Record>> Iterator for RunningAverage<I> {
    type Item = Record;
    fn next(&mut self) -> Option<Record> {
        let record = self.inner.next()?;
        let Some(v) = record.get_value(&self.field).and_then(Value::as_f64) else {
            return Some(record);
        };
        self.recent.push_back(v);
        if self.recent.len() > self.window {
            self.recent.pop_front();
        }
        let avg = self.recent.iter().sum::<f64>() / self.recent.len() as f64;
        Some(
            record
                .into_builder()
                .set_float("moving_avg", avg)
                .set_int("window_size", self.recent.len() as i64)
                .freeze(),
        )
    }
}

/// Adds `ema`, the exponential moving average of `field` with smoothing
/// factor `alpha`, seeded by the first observed value.
pub struct Ema<I> {
    inner: I,
    field: String,
    alpha: f64,
    prev: Option<f64>,
}

impl<I> Ema<I> {
    pub(crate) fn new(inner: I, field: String, alpha: f64) -> Self {
        Ema { inner, field, alpha, prev: None }
    }
}

impl<I: Iterator<Item = Record>> Iterator for Ema<I> {
    type Item = Record;
    fn next(&mut self) -> Option<Record> {
        let record = self.inner.next()?;
        let Some(v) = record.get_value(&self.field).and_then(Value::as_f64) else {
            return Some(record);
        };
        let ema = match self.prev {
            None => v,
            Some(prev) => self.alpha * v + (1.0 - self.alpha) * prev,
        };
        self.prev = Some(ema);
        Some(record.into_builder().set_float("ema", ema).freeze())
    }
}

/// Adds `running_min`, `running_max`, `running_range` over `field`.
pub struct RunningMinMax<I> {
    inner: I,
    field: String,
    min: Option<f64>,
    max: Option<f64>,
}

impl<I> RunningMinMax<I> {
    pub(crate) fn new(inner: I, field: String) -> Self {
        RunningMinMax { inner, field, min: None, max: None }
    }
}

impl<I: Iterator<Item = Record>> Iterator for RunningMinMax<I> {
    type Item = Record;
    fn next(&mut self) -> Option<Record> {
        let record = self.inner.next()?;
        let Some(v) = record.get_value(&self.field).and_then(Value::as_f64) else {
            return Some(record);
        };
        self.min = Some(self.min.map_or(v, |m| m.min(v)));
        self.max = Some(self.max.map_or(v, |m| m.max(v)));
        let (min, max) = (self.min.unwrap(), self.max.unwrap());
        Some(
            record
                .into_builder()
                .set_float("running_min", min)
                .set_float("running_max", max)
                .set_float("running_range", max - min)
                .freeze(),
        )
    }
}

/// Adds `total_count`, `distinct_values`, and `distinct_counts` (a nested
/// record mapping each seen value's text form to its occurrence count) over
/// `field`.
pub struct RunningCount<I> {
    inner: I,
    field: String,
    total: i64,
    counts: IndexMap<String, i64>,
}

impl<I> RunningCount<I> {
    pub(crate) fn new(inner: I, field: String) -> Self {
        RunningCount { inner, field, total: 0, counts: IndexMap::new() }
    }
}

impl<I: Iterator<Item = Record>> Iterator for RunningCount<I> {
    type Item = Record;
    fn next(&mut self) -> Option<Record> {
        let record = self.inner.next()?;
        let Some(value) = record.get_value(&self.field) else {
            return Some(record);
        };
        self.total += 1;
        *self.counts.entry(value.to_string()).or_insert(0) += 1;

        let mut counts_builder = Record::builder();
        for (k, v) in &self.counts {
            counts_builder = counts_builder.set_int(k.clone(), *v);
        }
        Some(
            record
                .into_builder()
                .set_int("total_count", self.total)
                .set_int("distinct_values", self.counts.len() as i64)
                .set_record("distinct_counts", counts_builder.freeze())
                .freeze(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::RecordIteratorExt;

    fn rec(v: f64) -> Record {
        Record::builder().set_float("x", v).freeze()
    }

    #[test]
    fn running_sum_tracks_total_and_average() {
        let out: Vec<Record> = vec![rec(1.0), rec(2.0), rec(3.0)].into_iter().running_sum("x").collect();
        assert_eq!(out[2].get::<f64>("running_sum"), Some(6.0));
        assert_eq!(out[2].get::<f64>("running_avg"), Some(2.0));
        assert_eq!(out[2].get::<i64>("running_count"), Some(3));
    }

    #[test]
    fn ema_seeds_with_first_value() {
        let out: Vec<Record> = vec![rec(10.0), rec(20.0)].into_iter().ema("x", 0.5).collect();
        assert_eq!(out[0].get::<f64>("ema"), Some(10.0));
        assert_eq!(out[1].get::<f64>("ema"), Some(15.0));
    }
}
