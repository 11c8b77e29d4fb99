//! count/time windows and their sliding variants. All four change the item
//! type from `Record` to `Vec<Record>`: each output element is one batch.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::record::Record;

use super::time_field;

/// Non-overlapping batches of `size` records; the final batch may be
/// shorter.
pub struct CountWindow<I> {
    inner: I,
    size: usize,
}

impl<I> CountWindow<I> {
    pub(crate) fn new(inner: I, size: usize) -> Self {
        assert!(size > 0, "count_window: size must be positive");
        CountWindow { inner, size }
    }
}

impl<I: Iterator<Item = Record>> Iterator for CountWindow<I> {
    type Item = Vec<Record>;
    fn next(&mut self) -> Option<Vec<Record>> {
        let mut batch = Vec::with_capacity(self.size);
        for _ in 0..self.size {
            match self.inner.next() {
                Some(r) => batch.push(r),
                None => break,
            }
        }
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}

/// Batches of `size` records, advancing by `step`. With `step < size` the
/// batches overlap; with `step == size` this degenerates to
/// [`CountWindow`]; `step > size` skips records between batches.
pub struct SlidingCountWindow<I> {
    inner: I,
    size: usize,
    step: usize,
    buffer: VecDeque<Record>,
    started: bool,
}

impl<I> SlidingCountWindow<I> {
    pub(crate) fn new(inner: I, size: usize, step: usize) -> Self {
        assert!(size > 0, "sliding_count_window: size must be positive");
        assert!(step > 0, "sliding_count_window: step must be positive");
        SlidingCountWindow { inner, size, step, buffer: VecDeque::new(), started: false }
    }
}

impl<I: Iterator<Item = Record>> Iterator for SlidingCountWindow<I> {
    type Item = Vec<Record>;
    fn next(&mut self) -> Option<Vec<Record>> {
        if self.started {
            let drop = self.step.min(self.buffer.len());
            for _ in 0..drop {
                self.buffer.pop_front();
            }
            if self.step > self.size {
                for _ in 0..(self.step - self.size) {
                    self.inner.next()?;
                }
            }
        }
        while self.buffer.len() < self.size {
            match self.inner.next() {
                Some(r) => self.buffer.push_back(r),
                None => return None,
            }
        }
        self.started = true;
        Some(self.buffer.iter().cloned().collect())
    }
}

/// Tumbling batches of width `width`, bucketed on the time-valued `field`.
/// The first bucket starts at the first record's timestamp; later buckets
/// sit on the fixed grid that anchor implies. Records whose timestamp falls
/// before the current bucket's start are discarded as late arrivals.
/// Records missing `field` are attached to whichever bucket is currently open.
pub struct TimeWindow<I> {
    inner: I,
    field: String,
    width: chrono::Duration,
    bucket_start: Option<DateTime<Utc>>,
    buffer: Vec<Record>,
    carry: Option<Record>,
    done: bool,
}

impl<I> TimeWindow<I> {
    pub(crate) fn new(inner: I, field: String, width: chrono::Duration) -> Self {
        TimeWindow { inner, field, width, bucket_start: None, buffer: Vec::new(), carry: None, done: false }
    }
}

impl<I: Iterator<Item = Record>> Iterator for TimeWindow<I> {
    type Item = Vec<Record>;
    fn next(&mut self) -> Option<Vec<Record>> {
        if self.done {
            return None;
        }
        loop {
            let record = match self.carry.take() {
                Some(r) => r,
                None => match self.inner.next() {
                    Some(r) => r,
                    None => {
                        self.done = true;
                        return if self.buffer.is_empty() {
                            None
                        } else {
                            Some(std::mem::take(&mut self.buffer))
                        };
                    }
                },
            };
            let Some(ts) = time_field(&record, &self.field) else {
                self.buffer.push(record);
                continue;
            };
            let start = *self.bucket_start.get_or_insert(ts);
            if ts < start {
                continue; // late arrival: discard
            }
            if ts < start + self.width {
                self.buffer.push(record);
                continue;
            }
            let out = std::mem::take(&mut self.buffer);
            self.bucket_start = Some(start + self.width);
            self.carry = Some(record);
            if !out.is_empty() {
                return Some(out);
            }
            // the bucket we just closed was empty; keep advancing the grid
        }
    }
}

/// Overlapping time buckets of width `size`, advancing by `slide`, bucketed
/// on `field`. Assumes non-decreasing input timestamps. Computed eagerly on
/// the first pull (overlap means a record can belong to several windows, so
/// a full buffer is unavoidable), but not before.
pub struct SlidingTimeWindow<I: Iterator<Item = Record>> {
    inner: Option<I>,
    field: String,
    size: chrono::Duration,
    slide: chrono::Duration,
    output: Option<std::vec::IntoIter<Vec<Record>>>,
}

impl<I: Iterator<Item = Record>> SlidingTimeWindow<I> {
    pub(crate) fn new(inner: I, field: String, size: chrono::Duration, slide: chrono::Duration) -> Self {
        SlidingTimeWindow { inner: Some(inner), field, size, slide, output: None }
    }

    fn run(&mut self) -> std::vec::IntoIter<Vec<Record>> {
        let inner = self.inner.take().expect("SlidingTimeWindow polled after completion");
        let timed: Vec<(DateTime<Utc>, Record)> =
            inner.filter_map(|r| time_field(&r, &self.field).map(|ts| (ts, r))).collect();
        if timed.is_empty() {
            return Vec::new().into_iter();
        }
        let mut windows = Vec::new();
        let mut start = timed[0].0;
        loop {
            let end = start + self.size;
            let batch: Vec<Record> = timed
                .iter()
                .filter(|(ts, _)| *ts >= start && *ts < end)
                .map(|(_, r)| r.clone())
                .collect();
            if !batch.is_empty() {
                windows.push(batch);
            }
            let next_start = start + self.slide;
            if !timed.iter().any(|(ts, _)| *ts >= next_start) {
                break;
            }
            start = next_start;
        }
        windows.into_iter()
    }
}

impl<I: Iterator<Item = Record>> Iterator for SlidingTimeWindow<I> {
    type Item = Vec<Record>;
    fn next(&mut self) -> Option<Vec<Record>> {
        if self.output.is_none() {
            self.output = Some(self.run());
        }
        self.output.as_mut().unwrap().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::GenericIteratorExt as _;
    use crate::iter::RecordIteratorExt;

    fn rec(id: i64) -> Record {
        Record::builder().set_int("id", id).freeze()
    }

    #[test]
    fn count_window_splits_into_fixed_batches() {
        let out: Vec<Vec<Record>> = (1..=8).map(rec).collect::<Vec<_>>().into_iter().count_window(3).collect();
        let ids: Vec<Vec<i64>> =
            out.iter().map(|b| b.iter().map(|r| r.get::<i64>("id").unwrap()).collect()).collect();
        assert_eq!(ids, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8]]);
    }

    #[test]
    fn sliding_count_window_overlaps_by_step() {
        let out: Vec<Vec<Record>> =
            (1..=5).map(rec).collect::<Vec<_>>().into_iter().sliding_count_window(3, 1).collect();
        let ids: Vec<Vec<i64>> =
            out.iter().map(|b| b.iter().map(|r| r.get::<i64>("id").unwrap()).collect()).collect();
        assert_eq!(ids, vec![vec![1, 2, 3], vec![2, 3, 4], vec![3, 4, 5]]);
    }

    #[test]
    fn take_until_still_works_alongside_windowing() {
        // sanity check that GenericIteratorExt composes with windowed output
        let out: Vec<Vec<Record>> = (1..=8)
            .map(rec)
            .collect::<Vec<_>>()
            .into_iter()
            .count_window(3)
            .take_until(|batch| batch.len() < 3)
            .collect();
        assert_eq!(out.len(), 3);
    }
}
