//! Integration test: simple encoders through the public API

use polars::prelude::*;
use std::collections::HashMap;
use tabenc::prelude::*;

fn train_frame() -> DataFrame {
    df!(
        "fruits" => &["apple", "banana", "banana"],
        "users" => &["alice", "bob", "carol"],
    )
    .unwrap()
}

#[test]
fn test_count_encoder_end_to_end() {
    let mut encoder = CountEncoder::new();
    encoder.fit(&train_frame(), None).unwrap();

    let test_df = df!(
        "fruits" => &[Some("unseen"), None, Some("banana")],
        "users" => &[Some("alice"), Some("unseen"), None],
    )
    .unwrap();
    let encoded = encoder.transform(&test_df).unwrap();

    let expected = df!(
        "fruits" => &[-1i64, -2, 2],
        "users" => &[1i64, -1, -2],
    )
    .unwrap();
    assert_eq!(encoded, expected);
}

#[test]
fn test_count_encoder_serde_round_trip() {
    let mut encoder = CountEncoder::new();
    encoder.fit(&train_frame(), None).unwrap();

    let serialized = serde_json::to_string(&encoder).unwrap();
    let loaded: CountEncoder = serde_json::from_str(&serialized).unwrap();

    let test_df = df!(
        "fruits" => &["cherry", "banana", "apple"],
        "users" => &["carol", "bob", "alice"],
    )
    .unwrap();
    let encoded = loaded.transform(&test_df).unwrap();

    let expected = df!(
        "fruits" => &[-1i64, 2, 1],
        "users" => &[1i64, 1, 1],
    )
    .unwrap();
    assert_eq!(encoded, expected);
}

#[test]
fn test_ordinal_encoder_end_to_end() {
    let mut encoder = OrdinalEncoder::new();
    let encoded = encoder.fit_transform(&train_frame(), None).unwrap();

    let expected = df!(
        "fruits" => &[1i64, 2, 2],
        "users" => &[1i64, 2, 3],
    )
    .unwrap();
    assert_eq!(encoded, expected);
}

#[test]
fn test_ordinal_encoder_with_supplied_mappings() {
    let mappings = HashMap::from([(
        "fruits".to_string(),
        HashMap::from([
            ("apple".to_string(), 10i64),
            ("banana".to_string(), 20),
        ]),
    )]);

    let frame = df!("fruits" => &["apple", "banana", "apple"]).unwrap();
    let mut encoder = OrdinalEncoder::new().with_mappings(mappings);
    let encoded = encoder.fit_transform(&frame, None).unwrap();

    let expected = df!("fruits" => &[10i64, 20, 10]).unwrap();
    assert_eq!(encoded, expected);
}

#[test]
fn test_one_hot_encoder_end_to_end() {
    let mut encoder = OneHotEncoder::new().with_columns(vec!["fruits".to_string()]);
    let encoded = encoder.fit_transform(&train_frame(), None).unwrap();

    let expected = df!(
        "fruits_apple" => &[true, false, false],
        "fruits_banana" => &[false, true, true],
    )
    .unwrap();
    assert_eq!(encoded, expected);
}

#[test]
fn test_multi_hot_encoder_end_to_end() {
    let rows = vec![
        Some(Series::new("".into(), &["red", "blue"])),
        Some(Series::new("".into(), &["blue"])),
        None,
    ];
    let frame = DataFrame::new(vec![Series::new("tags".into(), rows).into()]).unwrap();

    let mut encoder = MultiHotEncoder::new();
    let encoded = encoder.fit_transform(&frame, None).unwrap();

    let expected = df!(
        "tags_red" => &[true, false, false],
        "tags_blue" => &[true, true, false],
    )
    .unwrap();
    assert_eq!(encoded, expected);
}

#[test]
fn test_null_encoder_end_to_end() {
    let frame = df!(
        "fruits" => &[None, Some("banana"), Some("banana")],
        "prices" => &[None, Some(100i64), Some(200)],
    )
    .unwrap();

    let mut encoder = NullEncoder::new();
    let encoded = encoder.fit_transform(&frame, None).unwrap();

    let expected = df!(
        "fruits" => &[true, false, false],
        "prices" => &[true, false, false],
    )
    .unwrap();
    assert_eq!(encoded, expected);
}

#[test]
fn test_aggregate_encoder_end_to_end() {
    let frame = df!(
        "fruits" => &["apple", "banana", "banana"],
        "price" => &[100i64, 200, 300],
    )
    .unwrap();

    let mut encoder = AggregateEncoder::new(
        vec![
            AggregateSpec::new("mean", "price", AggregateStat::Mean),
            AggregateSpec::new("max", "price", AggregateStat::Max),
        ],
        vec!["fruits".to_string()],
    );
    let encoded = encoder.fit_transform(&frame, None).unwrap();

    let expected = df!(
        "fruits_mean" => &[100.0, 250.0, 250.0],
        "fruits_max" => &[100.0, 300.0, 300.0],
    )
    .unwrap();
    assert_eq!(encoded, expected);
}

#[test]
fn test_encoders_preserve_row_count() {
    let frame = train_frame();
    let labels = Series::new("target".into(), &[1.0, 0.0, 1.0]);

    let mut count = CountEncoder::new();
    assert_eq!(count.fit_transform(&frame, None).unwrap().height(), 3);

    let mut ordinal = OrdinalEncoder::new();
    assert_eq!(ordinal.fit_transform(&frame, None).unwrap().height(), 3);

    let mut one_hot = OneHotEncoder::new();
    assert_eq!(one_hot.fit_transform(&frame, None).unwrap().height(), 3);

    let mut greedy = GreedyTargetEncoder::new(Smoothing::None);
    assert_eq!(
        greedy.fit_transform(&frame, Some(&labels)).unwrap().height(),
        3
    );
}

#[test]
fn test_out_of_fold_wrapper_composes_with_any_fold_encoder() {
    // the wrapper is generic: a count encoder works as the inner encoder too
    let frame = df!("fruits" => &["apple", "banana", "banana", "apple"]).unwrap();
    let labels = Series::new("target".into(), &[1.0, 0.0, 1.0, 1.0]);

    let mut wrapper = OutOfFoldWrapper::new(CountEncoder::new(), KFold::new(2).unwrap());
    wrapper.fit(&frame, Some(&labels)).unwrap();

    // training path: rows 0-1 counted from rows 2-3 and vice versa
    let encoded = wrapper.transform(&frame).unwrap();
    let expected = df!("fruits" => &[1i64, 1, 1, 1]).unwrap();
    assert_eq!(encoded, expected);

    // new-data path: counts from the full training frame
    let test_df = df!("fruits" => &["banana", "apple", "cherry", "apple"]).unwrap();
    let encoded = wrapper.transform(&test_df).unwrap();
    let expected = df!("fruits" => &[2i64, 2, -1, 2]).unwrap();
    assert_eq!(encoded, expected);
}
