//! The operator algebra, realized as extension traits over `std::iter::Iterator`.
//!
//! The abstract "pull iterator" (`S<T>`) and "value+error iterator" (`E<T>`)
//! protocols map directly onto `Iterator<Item = T>` and
//! `Iterator<Item = Result<T, Error>>`: both are already pull-based and lazy,
//! so no bespoke suspension machinery is needed. Operators that std already
//! provides for any item type (`filter`, `map`, `take`, `skip`, `take_while`,
//! `skip_while`, `chain`) are used directly rather than re-wrapped; this
//! module adds only the operators the spec needs beyond that: the ones
//! requiring buffering, keys, windows, fan-out, or error-channel bridging.
//!
//! Two extension traits cover everything record-shaped:
//! [`RecordIteratorExt`] for `Iterator<Item = Record>`, and
//! [`RecordResultIteratorExt`] for `Iterator<Item = Result<Record, Error>>`.
//! A third, generic trait, [`GenericIteratorExt`], supplies the handful of
//! operators (`distinct_by`, `sort_by`, `take_until`/`skip_until`, `timeout`)
//! that make sense for any item type, not just records.

mod aggregate;
mod errbridge;
mod flatten;
mod generic;
mod group;
mod join;
mod materialize;
mod running;
mod tee;
mod window;

pub use aggregate::{Aggregate, AggSpec, Aggregator, AggregatorState};
pub use errbridge::{FilterSafe, IgnoreErrors, MapSafe, Safe, UnsafeDemote};
pub use flatten::{CrossFlatten, DotFlatten};
pub use generic::{DistinctBy, GenericIteratorExt, SkipUntil, SortBy, TakeUntil, Timeout};
pub use group::{FieldTimeout, GroupBy};
pub use join::{FieldCollisionPolicy, Join, JoinKind};
pub use materialize::{Materialize, MaterializeJson};
pub use running::{Ema, RunningAverage, RunningCount, RunningMinMax, RunningSum};
pub use tee::{LazyTee, LazyTeeMode, Tee};
pub use window::{CountWindow, SlidingCountWindow, SlidingTimeWindow, TimeWindow};

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::Error;
use crate::record::Record;

/// Operators specific to streams of [`Record`]s.
pub trait RecordIteratorExt: Iterator<Item = Record> + Sized {
    /// Alias of [`Iterator::filter`] kept for symmetry with `map_rec` and
    /// for readability at call sites that chain many record operators.
    fn filter_rec<P>(self, pred: P) -> std::iter::Filter<Self, P>
    where
        P: FnMut(&Record) -> bool,
    {
        self.filter(pred)
    }

    /// Alias of [`Iterator::map`], specialized to `Record -> Record` pipelines.
    fn map_rec<F>(self, f: F) -> std::iter::Map<Self, F>
    where
        F: FnMut(Record) -> Record,
    {
        self.map(f)
    }

    /// Terminate the stream once the wall-clock time since the first pull
    /// of a time-valued field in `field` has drifted from its first-seen
    /// value by more than `max_drift`.
    fn field_timeout(self, field: impl Into<String>, max_drift: Duration) -> FieldTimeout<Self> {
        FieldTimeout::new(self, field.into(), max_drift)
    }

    /// Partition records by the value of `key_fields` and emit one record
    /// per distinct key-tuple, holding the matching records in arrival
    /// order under `output_field`. Records whose key fields include a
    /// sub-sequence value are skipped (see the design note on hashing
    /// sub-sequences).
    fn group_by(
        self,
        key_fields: impl IntoIterator<Item = impl Into<String>>,
        output_field: impl Into<String>,
    ) -> GroupBy<Self> {
        GroupBy::new(self, key_fields.into_iter().map(Into::into).collect(), output_field.into())
    }

    /// Reduce the sub-sequence at `source_field` (as produced by
    /// [`RecordIteratorExt::group_by`]) into one output field per entry in
    /// `specs`, removing the sub-sequence field from the output.
    fn aggregate(
        self,
        source_field: impl Into<String>,
        specs: Vec<(String, AggSpec)>,
    ) -> aggregate::Aggregate<Self> {
        aggregate::Aggregate::new(self, source_field.into(), specs)
    }

    /// Pairwise expansion: emit one record per tuple index across the
    /// named sub-sequence fields (or, if `fields` is empty, every top-level
    /// sequence field), truncated to the shortest sequence. Nested records
    /// are inlined depth-first with `separator` first.
    fn dot_flatten(
        self,
        separator: impl Into<String>,
        fields: Vec<String>,
    ) -> DotFlatten<Self> {
        DotFlatten::new(self, separator.into(), fields)
    }

    /// Cartesian-product expansion over the named sub-sequence fields (or
    /// every top-level sequence field if `fields` is empty).
    fn cross_flatten(
        self,
        separator: impl Into<String>,
        fields: Vec<String>,
    ) -> CrossFlatten<Self> {
        CrossFlatten::new(self, separator.into(), fields)
    }

    /// Materialize a sub-sequence field as a delimiter-joined string under
    /// `output_field`.
    fn materialize(
        self,
        field: impl Into<String>,
        output_field: impl Into<String>,
        separator: impl Into<String>,
    ) -> Materialize<Self> {
        Materialize::new(self, field.into(), output_field.into(), separator.into())
    }

    /// Materialize any field as a compact JSON document under `output_field`.
    fn materialize_json(
        self,
        field: impl Into<String>,
        output_field: impl Into<String>,
    ) -> MaterializeJson<Self> {
        MaterializeJson::new(self, field.into(), output_field.into())
    }

    /// Hash-join against `right`, keyed by `left_keys`/`right_keys`. The
    /// right side is buffered fully before the first output.
    fn join<R>(
        self,
        right: R,
        left_keys: Vec<String>,
        right_keys: Vec<String>,
        kind: JoinKind,
        collisions: FieldCollisionPolicy,
    ) -> Join<Self, R>
    where
        R: Iterator<Item = Record>,
    {
        Join::new(self, right, left_keys, right_keys, kind, collisions)
    }

    /// Non-overlapping batches of `size` records; the final batch may be
    /// shorter.
    fn count_window(self, size: usize) -> CountWindow<Self> {
        CountWindow::new(self, size)
    }

    /// Batches of `size`, advancing by `step` records.
    fn sliding_count_window(self, size: usize, step: usize) -> SlidingCountWindow<Self> {
        SlidingCountWindow::new(self, size, step)
    }

    /// Tumbling batches of width `bucket_width`, bucketed on the time-valued
    /// `field`, starting from the first record's timestamp. Records whose
    /// timestamp falls before the current bucket's start are discarded.
    fn time_window(
        self,
        field: impl Into<String>,
        bucket_width: chrono::Duration,
    ) -> TimeWindow<Self> {
        TimeWindow::new(self, field.into(), bucket_width)
    }

    /// Overlapping time buckets of width `size`, advancing by `slide`.
    fn sliding_time_window(
        self,
        field: impl Into<String>,
        size: chrono::Duration,
        slide: chrono::Duration,
    ) -> SlidingTimeWindow<Self> {
        SlidingTimeWindow::new(self, field.into(), size, slide)
    }

    /// Enrich each record with `running_sum`/`running_count`/`running_avg`
    /// over `field`.
    fn running_sum(self, field: impl Into<String>) -> RunningSum<Self> {
        RunningSum::new(self, field.into())
    }

    /// Enrich each record with `moving_avg`/`window_size` over the last
    /// `window` values of `field`.
    fn running_average(self, field: impl Into<String>, window: usize) -> RunningAverage<Self> {
        RunningAverage::new(self, field.into(), window)
    }

    /// Enrich each record with an exponential moving average `ema` of
    /// `field`, seeded by the first value.
    fn ema(self, field: impl Into<String>, alpha: f64) -> Ema<Self> {
        Ema::new(self, field.into(), alpha)
    }

    /// Enrich each record with `running_min`/`running_max`/`running_range`
    /// over `field`.
    fn running_min_max(self, field: impl Into<String>) -> RunningMinMax<Self> {
        RunningMinMax::new(self, field.into())
    }

    /// Enrich each record with `total_count`/`distinct_values`/
    /// `distinct_counts` over `field`.
    fn running_count(self, field: impl Into<String>) -> RunningCount<Self> {
        RunningCount::new(self, field.into())
    }

    /// Buffer the entire stream and return `n` independent iterators that
    /// each replay it in full.
    fn tee(self, n: usize) -> Vec<Tee> {
        tee::tee(self, n)
    }

    /// Share a single pass over the stream, driven by a background thread,
    /// across `n` consumers each reading from their own bounded buffer.
    fn lazy_tee(self, n: usize, capacity: usize, mode: LazyTeeMode) -> Vec<LazyTee>
    where
        Self: Send + 'static,
    {
        tee::lazy_tee(self, n, capacity, mode)
    }

    /// Promote to the error-aware shape, pairing every record with `Ok`.
    fn safe(self) -> Safe<Self> {
        Safe::new(self)
    }

    /// Filter on a fallible predicate, promoting to the error-aware shape:
    /// a predicate error becomes an error pair instead of propagating as an
    /// early return.
    fn filter_safe<P, E>(self, pred: P) -> errbridge::FilterSafe<Self, P>
    where
        P: FnMut(&Record) -> Result<bool, E>,
        E: std::error::Error + Send + Sync + 'static,
    {
        errbridge::FilterSafe::new(self, pred)
    }

    /// Map on a fallible function, promoting to the error-aware shape: a
    /// function error becomes an error pair.
    fn map_safe<F, E>(self, f: F) -> MapSafe<Self, F>
    where
        F: FnMut(Record) -> Result<Record, E>,
        E: std::error::Error + Send + Sync + 'static,
    {
        MapSafe::new(self, f)
    }
}

impl<I: Iterator<Item = Record>> RecordIteratorExt for I {}

/// Operators for the error-aware shape, `Iterator<Item = Result<Record, Error>>`.
pub trait RecordResultIteratorExt: Iterator<Item = Result<Record, Error>> + Sized {
    /// Demote to the value shape, treating the first error as fatal: the
    /// stream ends there, and the error is retrievable afterward via
    /// [`UnsafeDemote::last_error`], mirroring `std::io::Lines`.
    fn unsafe_(self) -> UnsafeDemote<Self> {
        UnsafeDemote::new(self)
    }

    /// Demote to the value shape, silently dropping error pairs.
    fn ignore_errors(self) -> IgnoreErrors<Self> {
        IgnoreErrors::new(self)
    }
}

impl<I: Iterator<Item = Result<Record, Error>>> RecordResultIteratorExt for I {}

pub(crate) fn time_field(record: &Record, field: &str) -> Option<DateTime<Utc>> {
    record.get::<DateTime<Utc>>(field)
}
