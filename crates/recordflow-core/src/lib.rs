//! `recordflow-core` provides the value taxonomy, the `Record` type, and the
//! pull-iterator operator algebra that the rest of the recordflow crates build on.
//!
//! Records flow through ordinary `std::iter::Iterator`s: `Iterator<Item = Record>`
//! plays the role of a "value iterator" and `Iterator<Item = Result<Record, Error>>`
//! plays the role of a "value+error iterator". The named operators (filter, group_by,
//! aggregate, flatten, window, tee, ...) are added to any such iterator by the
//! extension traits in [`iter`], in the style of the `itertools` crate: no bespoke
//! suspension machinery is needed because `Iterator` is already pull-based and lazy.
//!
//! # Usage Overview
//!
//! Build records with [`Record::builder`], push them through a stream with
//! [`std::iter::once`]/`Vec::into_iter`/a reader, and chain operators:
//!
//! ```
//! use recordflow_core::{Record, iter::RecordIteratorExt};
//!
//! let records = vec![
//!     Record::builder().set_string("region", "N").set_int("amount", 1200).freeze(),
//!     Record::builder().set_string("region", "S").set_int("amount", 800).freeze(),
//! ];
//! let filtered: Vec<Record> = records.into_iter()
//!     .filter_rec(|r| r.get::<i64>("amount").unwrap_or(0) > 900)
//!     .collect();
//! assert_eq!(filtered.len(), 1);
//! ```

pub mod error;
pub mod value;
pub mod json_string;
pub mod sequence;
pub mod record;
pub mod key;
pub mod iter;

pub use error::Error;
pub use json_string::JsonString;
pub use record::{Record, RecordBuilder};
pub use sequence::{Sequence, SequenceElement};
pub use value::Value;

/// Left-to-right composition of N operators, each a function from one stream
/// shape to another. Equivalent to `g(f(x))` chains but reads in pipeline order.
///
/// ```
/// use recordflow_core::pipe;
/// let doubled_then_incremented = pipe!(5, |x: i32| x * 2, |x: i32| x + 1);
/// assert_eq!(doubled_then_incremented, 11);
/// ```
#[macro_export]
macro_rules! pipe {
    ($x:expr $(, $f:expr)+ $(,)?) => {{
        let v = $x;
        $( let v = ($f)(v); )+
        v
    }};
}
