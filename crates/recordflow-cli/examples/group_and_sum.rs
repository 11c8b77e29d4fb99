//! Groups a handful of sales records by region and sums the amount field.
//! Run with `cargo run --example group_and_sum -p recordflow-cli`.

use recordflow_core::iter::{AggSpec, RecordIteratorExt};
use recordflow_core::Record;

fn main() {
    let records = vec![
        Record::builder().set_string("region", "N").set_int("amount", 1200).freeze(),
        Record::builder().set_string("region", "S").set_int("amount", 800).freeze(),
        Record::builder().set_string("region", "N").set_int("amount", 900).freeze(),
        Record::builder().set_string("region", "E").set_int("amount", 1100).freeze(),
        Record::builder().set_string("region", "S").set_int("amount", 1300).freeze(),
    ];

    let totals: Vec<Record> = records
        .into_iter()
        .group_by(["region"], "members")
        .aggregate("members", vec![("total".to_string(), AggSpec::sum("amount")), ("count".to_string(), AggSpec::count())])
        .collect();

    for row in &totals {
        println!(
            "{}: total={} count={}",
            row.get::<String>("region").unwrap(),
            row.get::<i64>("total").unwrap(),
            row.get::<i64>("count").unwrap(),
        );
    }
}
