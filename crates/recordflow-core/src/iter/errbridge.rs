//! Conversions between the value shape (`Iterator<Item = Record>`) and the
//! value+error shape (`Iterator<Item = Result<Record, Error>>`).

use crate::error::Error;
use crate::record::Record;

/// Promotes `Iterator<Item = Record>` to the error-aware shape by pairing
/// every value with `Ok`. See [`crate::iter::RecordIteratorExt::safe`].
pub struct Safe<I> {
    inner: I,
}

impl<I> Safe<I> {
    pub(crate) fn new(inner: I) -> Self {
        Safe { inner }
    }
}

impl<I: Iterator<Item = Record>> Iterator for Safe<I> {
    type Item = Result<Record, Error>;
    fn next(&mut self) -> Option<Result<Record, Error>> {
        self.inner.next().map(Ok)
    }
}

/// Demotes the error-aware shape to the value shape by making the first
/// error fatal: the stream ends there. The error itself is not lost — call
/// [`UnsafeDemote::last_error`] afterward, the same pattern
/// `std::io::Lines` uses for its own fallible reads.
pub struct UnsafeDemote<I> {
    inner: I,
    last_error: Option<Error>,
}

impl<I> UnsafeDemote<I> {
    pub(crate) fn new(inner: I) -> Self {
        UnsafeDemote { inner, last_error: None }
    }

    /// The error that ended the stream, if any.
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }
}

impl<I: Iterator<Item = Result<Record, Error>>> Iterator for UnsafeDemote<I> {
    type Item = Record;
    fn next(&mut self) -> Option<Record> {
        if self.last_error.is_some() {
            return None;
        }
        match self.inner.next() {
            Some(Ok(record)) => Some(record),
            Some(Err(e)) => {
                self.last_error = Some(e);
                None
            }
            None => None,
        }
    }
}

/// Demotes the error-aware shape to the value shape by silently dropping
/// error pairs. The resulting value count may be less than the input count.
pub struct IgnoreErrors<I> {
    inner: I,
}

impl<I> IgnoreErrors<I> {
    pub(crate) fn new(inner: I) -> Self {
        IgnoreErrors { inner }
    }
}

impl<I: Iterator<Item = Result<Record, Error>>> Iterator for IgnoreErrors<I> {
    type Item = Record;
    fn next(&mut self) -> Option<Record> {
        for item in self.inner.by_ref() {
            if let Ok(record) = item {
                return Some(record);
            }
        }
        None
    }
}

/// See [`crate::iter::RecordIteratorExt::filter_safe`].
pub struct FilterSafe<I, P> {
    inner: I,
    pred: P,
}

impl<I, P> FilterSafe<I, P> {
    pub(crate) fn new(inner: I, pred: P) -> Self {
        FilterSafe { inner, pred }
    }
}

impl<I, P, E> Iterator for FilterSafe<I, P>
where
    I: Iterator<Item = Record>,
    P: FnMut(&Record) -> Result<bool, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = Result<Record, Error>;
    fn next(&mut self) -> Option<Result<Record, Error>> {
        loop {
            let record = self.inner.next()?;
            match (self.pred)(&record) {
                Ok(true) => return Some(Ok(record)),
                Ok(false) => continue,
                Err(e) => return Some(Err(Error::predicate(e))),
            }
        }
    }
}

/// See [`crate::iter::RecordIteratorExt::map_safe`].
pub struct MapSafe<I, F> {
    inner: I,
    f: F,
}

impl<I, F> MapSafe<I, F> {
    pub(crate) fn new(inner: I, f: F) -> Self {
        MapSafe { inner, f }
    }
}

impl<I, F, E> Iterator for MapSafe<I, F>
where
    I: Iterator<Item = Record>,
    F: FnMut(Record) -> Result<Record, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = Result<Record, Error>;
    fn next(&mut self) -> Option<Result<Record, Error>> {
        let record = self.inner.next()?;
        Some((self.f)(record).map_err(Error::predicate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::{RecordIteratorExt, RecordResultIteratorExt};

    fn rec(id: i64) -> Record {
        Record::builder().set_int("id", id).freeze()
    }

    #[test]
    fn ignore_errors_round_trips_a_clean_stream() {
        let input = vec![rec(1), rec(2), rec(3)];
        let out: Vec<Record> = input.clone().into_iter().safe().ignore_errors().collect();
        assert_eq!(out, input);
    }

    #[test]
    fn unsafe_round_trips_a_clean_stream_and_reports_no_error() {
        let input = vec![rec(1), rec(2)];
        let mut demoted = input.clone().into_iter().safe().unsafe_();
        let out: Vec<Record> = demoted.by_ref().collect();
        assert_eq!(out, input);
        assert!(demoted.last_error().is_none());
    }

    #[test]
    fn unsafe_stops_at_the_first_error_and_retains_it() {
        #[derive(Debug)]
        struct Boom;
        impl std::fmt::Display for Boom {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "boom")
            }
        }
        impl std::error::Error for Boom {}

        let input = vec![rec(1), rec(2), rec(3)];
        let mut demoted = input
            .into_iter()
            .map_safe(|r| if r.get::<i64>("id") == Some(2) { Err(Boom) } else { Ok(r) })
            .unsafe_();
        let out: Vec<Record> = demoted.by_ref().collect();
        assert_eq!(out.len(), 1);
        assert!(demoted.last_error().is_some());
    }
}
