//! Fan-out: `tee` buffers the whole stream for N independent replays;
//! `lazy_tee` shares a single pass across N consumers via a background
//! thread and one bounded channel per consumer, grounded in the teacher's
//! crossbeam-based `RecordFanner`.

use std::sync::Arc;

use crossbeam::channel::{bounded, Receiver, TrySendError};

use crate::record::Record;

/// One of the `n` replay handles returned by [`crate::iter::RecordIteratorExt::tee`].
pub struct Tee {
    records: Arc<Vec<Record>>,
    pos: usize,
}

impl Iterator for Tee {
    type Item = Record;
    fn next(&mut self) -> Option<Record> {
        let record = self.records.get(self.pos)?.clone();
        self.pos += 1;
        Some(record)
    }
}

pub(crate) fn tee<I: Iterator<Item = Record>>(inner: I, n: usize) -> Vec<Tee> {
    let records = Arc::new(inner.collect::<Vec<_>>());
    (0..n).map(|_| Tee { records: records.clone(), pos: 0 }).collect()
}

/// How `lazy_tee`'s producer behaves when a consumer's buffer is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LazyTeeMode {
    /// Block the producer (and therefore every other consumer) until the
    /// full consumer has room. The default per the spec.
    Strict,
    /// Drop the record for the full consumer only; everyone else still
    /// receives it.
    Lossy,
}

/// One of the `n` consumer handles returned by
/// [`crate::iter::RecordIteratorExt::lazy_tee`]. Reads from its own bounded
/// buffer, fed by a dedicated producer thread.
pub struct LazyTee {
    receiver: Receiver<Record>,
}

impl Iterator for LazyTee {
    type Item = Record;
    fn next(&mut self) -> Option<Record> {
        self.receiver.recv().ok()
    }
}

pub(crate) fn lazy_tee<I>(inner: I, n: usize, capacity: usize, mode: LazyTeeMode) -> Vec<LazyTee>
where
    I: Iterator<Item = Record> + Send + 'static,
{
    let mut senders = Vec::with_capacity(n);
    let mut consumers = Vec::with_capacity(n);
    for _ in 0..n {
        let (tx, rx) = bounded(capacity);
        senders.push(Some(tx));
        consumers.push(LazyTee { receiver: rx });
    }

    std::thread::spawn(move || {
        let mut upstream = inner;
        loop {
            if senders.iter().all(Option::is_none) {
                break; // every consumer has closed: stop driving upstream
            }
            let Some(record) = upstream.next() else { break };
            for slot in senders.iter_mut() {
                let Some(tx) = slot else { continue };
                let delivered = match mode {
                    LazyTeeMode::Strict => tx.send(record.clone()).is_ok(),
                    LazyTeeMode::Lossy => !matches!(
                        tx.try_send(record.clone()),
                        Err(TrySendError::Disconnected(_))
                    ),
                };
                if !delivered {
                    *slot = None;
                }
            }
        }
    });

    consumers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::RecordIteratorExt;

    fn rec(id: i64) -> Record {
        Record::builder().set_int("id", id).freeze()
    }

    #[test]
    fn tee_replays_identically_to_every_consumer() {
        let input = vec![rec(1), rec(2), rec(3)];
        let mut streams = input.into_iter().tee(2);
        let b = streams.pop().unwrap();
        let a = streams.pop().unwrap();
        let a_ids: Vec<i64> = a.map(|r| r.get::<i64>("id").unwrap()).collect();
        let b_ids: Vec<i64> = b.map(|r| r.get::<i64>("id").unwrap()).collect();
        assert_eq!(a_ids, b_ids);
        assert_eq!(a_ids, vec![1, 2, 3]);
    }

    #[test]
    fn lazy_tee_delivers_every_record_to_every_consumer_in_strict_mode() {
        let input = vec![rec(1), rec(2), rec(3), rec(4)];
        let mut streams = input.into_iter().lazy_tee(2, 2, LazyTeeMode::Strict);
        let b = streams.pop().unwrap();
        let a = streams.pop().unwrap();
        let a_ids: Vec<i64> = a.map(|r| r.get::<i64>("id").unwrap()).collect();
        let b_ids: Vec<i64> = b.map(|r| r.get::<i64>("id").unwrap()).collect();
        assert_eq!(a_ids, vec![1, 2, 3, 4]);
        assert_eq!(b_ids, vec![1, 2, 3, 4]);
    }
}
