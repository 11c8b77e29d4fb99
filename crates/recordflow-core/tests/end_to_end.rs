//! Crate-level integration tests for the literal end-to-end scenarios and
//! the cross-operator invariants they're meant to demonstrate. Unlike the
//! `#[cfg(test)]` modules colocated with each operator, these only use
//! `recordflow_core`'s public surface, the way a downstream consumer would.

use recordflow_core::iter::{AggSpec, GenericIteratorExt, RecordIteratorExt, RecordResultIteratorExt};
use recordflow_core::sequence::{Sequence, SequenceElement};
use recordflow_core::Record;

fn string_sequence(values: &[&str]) -> Sequence {
    Sequence::from_vec(values.iter().map(|s| SequenceElement::String(s.to_string())).collect())
}

fn sales() -> Vec<Record> {
    let regions = ["N", "S", "N", "E", "S"];
    let amounts = [1200, 800, 900, 1100, 1300];
    regions
        .iter()
        .zip(amounts.iter())
        .map(|(region, amount)| Record::builder().set_string("region", *region).set_int("amount", *amount).freeze())
        .collect()
}

#[test]
fn group_and_aggregate_scenario() {
    let totals: Vec<Record> = sales()
        .into_iter()
        .group_by(["region"], "members")
        .aggregate("members", vec![("total".to_string(), AggSpec::sum("amount")), ("count".to_string(), AggSpec::count())])
        .collect();

    let rows: Vec<(String, i64, i64)> = totals
        .iter()
        .map(|r| (r.get::<String>("region").unwrap(), r.get::<i64>("total").unwrap(), r.get::<i64>("count").unwrap()))
        .collect();

    assert_eq!(
        rows,
        vec![("N".to_string(), 2100, 2), ("S".to_string(), 2100, 2), ("E".to_string(), 1100, 1)]
    );
}

fn tshirt() -> Record {
    Record::builder()
        .set_string("name", "T-Shirt")
        .set_float("base_price", 19.99)
        .set_sequence("colors", string_sequence(&["red", "blue"]))
        .set_sequence("sizes", string_sequence(&["small", "large"]))
        .freeze()
}

#[test]
fn dot_flatten_scenario() {
    let out: Vec<Record> =
        vec![tshirt()].into_iter().dot_flatten(".", vec!["colors".to_string(), "sizes".to_string()]).collect();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].get::<String>("colors").as_deref(), Some("red"));
    assert_eq!(out[0].get::<String>("sizes").as_deref(), Some("small"));
    assert_eq!(out[1].get::<String>("colors").as_deref(), Some("blue"));
    assert_eq!(out[1].get::<String>("sizes").as_deref(), Some("large"));
}

#[test]
fn cross_flatten_scenario() {
    let out: Vec<Record> =
        vec![tshirt()].into_iter().cross_flatten(".", vec!["colors".to_string(), "sizes".to_string()]).collect();
    assert_eq!(out.len(), 4);
    let pairs: Vec<(String, String)> = out
        .iter()
        .map(|r| (r.get::<String>("colors").unwrap(), r.get::<String>("sizes").unwrap()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("red".to_string(), "small".to_string()),
            ("red".to_string(), "large".to_string()),
            ("blue".to_string(), "small".to_string()),
            ("blue".to_string(), "large".to_string()),
        ]
    );
}

#[test]
fn count_window_scenario() {
    let records: Vec<Record> = (1..=8).map(|id| Record::builder().set_int("id", id).freeze()).collect();
    let batches: Vec<Vec<i64>> = records
        .into_iter()
        .count_window(3)
        .map(|batch| batch.iter().map(|r| r.get::<i64>("id").unwrap()).collect())
        .collect();
    assert_eq!(batches, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8]]);
}

#[test]
fn sliding_count_window_scenario() {
    let records: Vec<Record> = (1..=5).map(|id| Record::builder().set_int("id", id).freeze()).collect();
    let windows: Vec<Vec<i64>> = records
        .into_iter()
        .sliding_count_window(3, 1)
        .map(|batch| batch.iter().map(|r| r.get::<i64>("id").unwrap()).collect())
        .collect();
    assert_eq!(windows, vec![vec![1, 2, 3], vec![2, 3, 4], vec![3, 4, 5]]);
}

#[test]
fn materialize_then_group_scenario() {
    let records = vec![
        Record::builder().set_sequence("tags", string_sequence(&["urgent", "work"])).freeze(),
        Record::builder().set_sequence("tags", string_sequence(&["urgent", "work"])).freeze(),
        Record::builder().set_sequence("tags", string_sequence(&["personal"])).freeze(),
    ];

    let groups: Vec<Record> = records
        .into_iter()
        .materialize_json("tags", "k")
        .group_by(["k"], "members")
        .aggregate("members", vec![("count".to_string(), AggSpec::count())])
        .collect();

    let counts: Vec<i64> = groups.iter().map(|r| r.get::<i64>("count").unwrap()).collect();
    assert_eq!(counts, vec![2, 1]);
}

#[test]
fn tee_yields_identical_streams() {
    let records = sales();
    let mut streams = records.clone().into_iter().tee(3);
    let collected: Vec<Vec<Record>> = streams.drain(..).map(|s| s.collect()).collect();
    for stream in &collected {
        assert_eq!(stream, &records);
    }
}

#[test]
fn error_bridges_round_trip_a_clean_stream() {
    let records = sales();
    let ignored: Vec<Record> = records.clone().into_iter().safe().ignore_errors().collect();
    assert_eq!(ignored, records);

    let unsafe_demoted: Vec<Record> = records.clone().into_iter().safe().unsafe_().collect();
    assert_eq!(unsafe_demoted, records);
}

#[test]
fn distinct_by_survives_alongside_the_rest_of_the_algebra() {
    let records = sales();
    let distinct_regions: Vec<String> =
        records.into_iter().distinct_by(|r| r.get::<String>("region").unwrap()).map(|r| r.get::<String>("region").unwrap()).collect();
    assert_eq!(distinct_regions, vec!["N".to_string(), "S".to_string(), "E".to_string()]);
}
