//! Hash join over two record streams.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;

use crate::key::KeyValue;
use crate::record::Record;

/// Which rows without a match survive the join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
}

/// How to resolve a field name present on both sides of a match.
#[derive(Debug, Clone)]
pub enum FieldCollisionPolicy {
    /// Rename both sides' colliding fields by prepending a prefix.
    Prefix { left: String, right: String },
    /// Keep the right side's value, discarding the left's.
    Override,
    /// Panic when a collision is actually encountered. Chosen when the
    /// caller has asserted the two streams share no field names and wants
    /// a loud failure if that assumption breaks.
    Error,
}

fn merge(left: Option<&Record>, right: Option<&Record>, policy: &FieldCollisionPolicy) -> Record {
    let overlap: HashSet<&String> = match (left, right) {
        (Some(l), Some(r)) => {
            let right_names: HashSet<&String> = r.field_names().collect();
            l.field_names().filter(|n| right_names.contains(*n)).collect()
        }
        _ => HashSet::new(),
    };

    let mut builder = Record::builder();
    if let Some(l) = left {
        for (name, value) in l.iter() {
            let out_name = if overlap.contains(name) {
                match policy {
                    FieldCollisionPolicy::Prefix { left: lp, .. } => format!("{lp}{name}"),
                    _ => name.clone(),
                }
            } else {
                name.clone()
            };
            builder = builder.set(out_name, value.clone());
        }
    }
    if let Some(r) = right {
        for (name, value) in r.iter() {
            if overlap.contains(name) {
                match policy {
                    FieldCollisionPolicy::Prefix { right: rp, .. } => {
                        builder = builder.set(format!("{rp}{name}"), value.clone());
                    }
                    FieldCollisionPolicy::Override => {
                        builder = builder.set(name.clone(), value.clone());
                    }
                    FieldCollisionPolicy::Error => {
                        panic!("join: colliding field '{name}' under FieldCollisionPolicy::Error");
                    }
                }
            } else {
                builder = builder.set(name.clone(), value.clone());
            }
        }
    }
    builder.freeze()
}

/// See [`crate::iter::RecordIteratorExt::join`].
pub struct Join<L, R> {
    left: L,
    right: Option<R>,
    left_keys: Vec<String>,
    right_keys: Vec<String>,
    kind: JoinKind,
    collisions: FieldCollisionPolicy,
    right_buckets: Option<IndexMap<Vec<KeyValue>, Vec<Record>>>,
    matched: HashSet<Vec<KeyValue>>,
    pending: VecDeque<Record>,
    left_exhausted: bool,
    right_leftover: Option<std::vec::IntoIter<(Vec<KeyValue>, Vec<Record>)>>,
}

impl<L, R> Join<L, R>
where
    L: Iterator<Item = Record>,
    R: Iterator<Item = Record>,
{
    pub(crate) fn new(
        left: L,
        right: R,
        left_keys: Vec<String>,
        right_keys: Vec<String>,
        kind: JoinKind,
        collisions: FieldCollisionPolicy,
    ) -> Self {
        Join {
            left,
            right: Some(right),
            left_keys,
            right_keys,
            kind,
            collisions,
            right_buckets: None,
            matched: HashSet::new(),
            pending: VecDeque::new(),
            left_exhausted: false,
            right_leftover: None,
        }
    }

    fn build_right_buckets(&mut self) {
        let right = self.right.take().expect("right side already buffered");
        let mut buckets: IndexMap<Vec<KeyValue>, Vec<Record>> = IndexMap::new();
        for record in right {
            if let Some(key) = record.key_tuple(&self.right_keys) {
                buckets.entry(key).or_default().push(record);
            }
        }
        self.right_buckets = Some(buckets);
    }

    fn handle_left(&mut self, left_record: Record) {
        let buckets = self.right_buckets.as_ref().unwrap();
        let key = left_record.key_tuple(&self.left_keys);
        let matching = key.as_ref().and_then(|k| buckets.get(k));
        match matching {
            Some(members) => {
                self.matched.insert(key.unwrap());
                for member in members {
                    self.pending.push_back(merge(Some(&left_record), Some(member), &self.collisions));
                }
            }
            None => {
                if matches!(self.kind, JoinKind::LeftOuter | JoinKind::FullOuter) {
                    self.pending.push_back(merge(Some(&left_record), None, &self.collisions));
                }
            }
        }
    }

    fn build_right_leftover(&mut self) {
        let buckets = self.right_buckets.take().unwrap_or_default();
        let leftover: Vec<(Vec<KeyValue>, Vec<Record>)> = buckets
            .into_iter()
            .filter(|(key, _)| !self.matched.contains(key))
            .collect();
        self.right_leftover = Some(leftover.into_iter());
    }
}

impl<L, R> Iterator for Join<L, R>
where
    L: Iterator<Item = Record>,
    R: Iterator<Item = Record>,
{
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        loop {
            if let Some(r) = self.pending.pop_front() {
                return Some(r);
            }
            if self.right_buckets.is_none() {
                self.build_right_buckets();
            }
            if !self.left_exhausted {
                match self.left.next() {
                    Some(left_record) => {
                        self.handle_left(left_record);
                        continue;
                    }
                    None => {
                        self.left_exhausted = true;
                        if matches!(self.kind, JoinKind::RightOuter | JoinKind::FullOuter) {
                            self.build_right_leftover();
                        }
                        continue;
                    }
                }
            }
            match self.right_leftover.as_mut() {
                Some(iter) => match iter.next() {
                    Some((_, members)) => {
                        for m in &members {
                            self.pending.push_back(merge(None, Some(m), &self.collisions));
                        }
                        continue;
                    }
                    None => return None,
                },
                None => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::RecordIteratorExt;

    fn rec(id: i64, label: &str) -> Record {
        Record::builder().set_int("id", id).set_string("label", label).freeze()
    }

    #[test]
    fn inner_join_merges_matching_rows() {
        let left = vec![rec(1, "a"), rec(2, "b")];
        let right = vec![
            Record::builder().set_int("id", 1).set_string("extra", "x").freeze(),
            Record::builder().set_int("id", 3).set_string("extra", "z").freeze(),
        ];
        let out: Vec<Record> = left
            .into_iter()
            .join(
                right.into_iter(),
                vec!["id".to_string()],
                vec!["id".to_string()],
                JoinKind::Inner,
                FieldCollisionPolicy::Override,
            )
            .collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get::<String>("extra").as_deref(), Some("x"));
    }

    #[test]
    fn left_outer_keeps_unmatched_left_rows() {
        let left = vec![rec(1, "a"), rec(2, "b")];
        let right: Vec<Record> = vec![Record::builder().set_int("id", 1).set_string("extra", "x").freeze()];
        let out: Vec<Record> = left
            .into_iter()
            .join(
                right.into_iter(),
                vec!["id".to_string()],
                vec!["id".to_string()],
                JoinKind::LeftOuter,
                FieldCollisionPolicy::Override,
            )
            .collect();
        assert_eq!(out.len(), 2);
    }
}
