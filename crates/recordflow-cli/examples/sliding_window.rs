//! Chunks a numbered stream into overlapping windows of 3, stepping by 1.
//! Run with `cargo run --example sliding_window -p recordflow-cli`.

use recordflow_core::iter::RecordIteratorExt;
use recordflow_core::Record;

fn main() {
    let records: Vec<Record> = (1..=5).map(|id| Record::builder().set_int("id", id).freeze()).collect();

    for (i, window) in records.into_iter().sliding_count_window(3, 1).enumerate() {
        let ids: Vec<i64> = window.iter().map(|r| r.get::<i64>("id").unwrap()).collect();
        println!("window {i}: {ids:?}");
    }
}
