//! Ordered, single-pass sub-sequences.
//!
//! A [`Sequence`] is the field-value representation of the taxonomy's
//! "ordered sub-sequence" kind. It is backed by `Arc<Mutex<_>>` rather than
//! `Rc<RefCell<_>>` because records must be `Send` to cross the thread
//! boundary `lazy_tee` spawns its producer on; a `Sequence` therefore
//! carries a boxed `Send` iterator behind a mutex instead of a plain cell.
//!
//! Cloning a `Sequence` clones the `Arc`, so clones share the same
//! single-pass cursor: reading from one clone advances every other clone
//! too. This mirrors the spec's "single-pass sub-sequences" contract and is
//! an explicit, documented consequence rather than an oversight — anything
//! that needs independent replay must call [`Sequence::materialize`] first
//! and work from the resulting `Vec`.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::record::Record;

/// One element of a [`Sequence`]. A sequence is homogeneous in practice
/// (readers and operators only ever produce single-variant sequences) but
/// the type itself does not enforce that; mixed-variant sequences are
/// simply unusual input.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceElement {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Record(Record),
}

type Inner = Box<dyn Iterator<Item = SequenceElement> + Send>;

/// A lazy, single-pass, ordered sub-sequence field value.
#[derive(Clone)]
pub struct Sequence {
    state: Arc<Mutex<Inner>>,
}

impl Sequence {
    /// Wrap any `Send` iterator of elements as a sequence.
    pub fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = SequenceElement>,
        I::IntoIter: Send + 'static,
    {
        Sequence {
            state: Arc::new(Mutex::new(Box::new(iter.into_iter()))),
        }
    }

    /// Wrap an already-materialized vector as a (still single-pass) sequence.
    pub fn from_vec(elements: Vec<SequenceElement>) -> Self {
        Sequence::from_iter(elements)
    }

    /// Pull the next element, if any remain. Consumes it permanently: every
    /// clone of this `Sequence` observes the advance.
    pub fn next_element(&self) -> Option<SequenceElement> {
        self.state.lock().expect("sequence mutex poisoned").next()
    }

    /// Drain every remaining element into a `Vec`, exhausting the sequence.
    /// This is the idiomatic way for an operator that needs multiple passes
    /// (tee, materialize, flatten) to get a replayable view.
    pub fn materialize(&self) -> Vec<SequenceElement> {
        let mut guard = self.state.lock().expect("sequence mutex poisoned");
        guard.by_ref().collect()
    }
}

impl fmt::Display for SequenceElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceElement::String(s) => write!(f, "{s}"),
            SequenceElement::Int(i) => write!(f, "{i}"),
            SequenceElement::Float(x) => write!(f, "{x}"),
            SequenceElement::Bool(b) => write!(f, "{b}"),
            SequenceElement::Record(_) => write!(f, "<record>"),
        }
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sequence(<single-pass>)")
    }
}

impl Iterator for Sequence {
    type Item = SequenceElement;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materialize_drains_once() {
        let seq = Sequence::from_vec(vec![
            SequenceElement::Int(1),
            SequenceElement::Int(2),
            SequenceElement::Int(3),
        ]);
        let all = seq.materialize();
        assert_eq!(all.len(), 3);
        assert!(seq.materialize().is_empty());
    }

    #[test]
    fn clones_share_the_cursor() {
        let seq = Sequence::from_vec(vec![SequenceElement::Int(1), SequenceElement::Int(2)]);
        let clone = seq.clone();
        assert_eq!(seq.next_element(), Some(SequenceElement::Int(1)));
        assert_eq!(clone.next_element(), Some(SequenceElement::Int(2)));
        assert_eq!(seq.next_element(), None);
    }
}
