//! Tests for frequency classification and JSON inference

use cashflow_simulator_core_rs::{
    classify, ClassificationError, FrequencySpec, InputConfigurationError, Transaction,
    TransactionError, TransactionType,
};
use ndarray::array;
use serde_json::json;

fn infer(value: serde_json::Value) -> Result<FrequencySpec, ClassificationError> {
    FrequencySpec::try_from(value)
}

#[test]
fn test_classification_table() {
    let cases = vec![
        (FrequencySpec::Unset, "d_i"),
        (FrequencySpec::IntegerPeriod(2), "d_p"),
        (FrequencySpec::ExplicitTimes(vec![1, 1, 1]), "d_a"),
        (FrequencySpec::Probability(0.3), "p_i"),
        (FrequencySpec::from_array(array![[1.0, 0.8, 0.3]]), "p_p"),
        (FrequencySpec::ExplicitProbabilities(vec![(0, 1.0), (1, 1.0)]), "p_a"),
    ];

    for (spec, code) in cases {
        assert_eq!(classify(&spec).code(), code, "spec {:?}", spec);
    }
}

#[test]
fn test_classification_is_stable() {
    let spec = FrequencySpec::ExplicitProbabilities(vec![(3, 0.2)]);
    let first = classify(&spec);
    for _ in 0..10 {
        assert_eq!(classify(&spec), first);
    }
}

#[test]
fn test_infer_scalars() {
    assert_eq!(infer(json!(null)), Ok(FrequencySpec::Unset));
    assert_eq!(infer(json!(2)), Ok(FrequencySpec::IntegerPeriod(2)));
    assert_eq!(infer(json!(-2)), Ok(FrequencySpec::IntegerPeriod(-2)));
    assert_eq!(infer(json!(0.25)), Ok(FrequencySpec::Probability(0.25)));
}

#[test]
fn test_infer_integer_and_float_are_distinct() {
    let period = serde_json::from_str::<serde_json::Value>("2").unwrap();
    let probability = serde_json::from_str::<serde_json::Value>("2.0").unwrap();

    assert_eq!(
        classify(&infer(period).unwrap()),
        TransactionType::DiscretePeriodic
    );
    assert_eq!(
        classify(&infer(probability).unwrap()),
        TransactionType::ProbabilisticInstantaneous
    );
}

#[test]
fn test_infer_sequences() {
    assert_eq!(
        infer(json!([1, 4, 9])),
        Ok(FrequencySpec::ExplicitTimes(vec![1, 4, 9]))
    );
    assert_eq!(
        infer(json!([1.0, 0.5])),
        Ok(FrequencySpec::ExplicitProbabilities(vec![(0, 1.0), (1, 0.5)]))
    );
    assert_eq!(
        infer(json!([[2, 0.5], [7, 0.1]])),
        Ok(FrequencySpec::ExplicitProbabilities(vec![(2, 0.5), (7, 0.1)]))
    );
}

#[test]
fn test_infer_integer_written_probabilities() {
    assert_eq!(
        infer(json!([[0, 1], [3, 0]])),
        Ok(FrequencySpec::ExplicitProbabilities(vec![(0, 1.0), (3, 0.0)]))
    );
    assert_eq!(
        infer(json!([1.0, 0.8, 0.3, 0.1, 0])),
        Ok(FrequencySpec::ExplicitProbabilities(vec![
            (0, 1.0),
            (1, 0.8),
            (2, 0.3),
            (3, 0.1),
            (4, 0.0)
        ]))
    );
    assert_eq!(
        infer(json!([1, 0.5])),
        Ok(FrequencySpec::ExplicitProbabilities(vec![(0, 1.0), (1, 0.5)]))
    );
}

#[test]
fn test_integer_written_pairs_build_on_small_grid() {
    // two timesteps, two paths: must not be read as a 2x2 grid
    let spec: FrequencySpec = serde_json::from_str("[[0, 1], [1, 0]]").unwrap();
    let tx = Transaction::new(2, 2, 0, spec, Some(4)).unwrap();

    assert_eq!(tx.transaction_type(), TransactionType::ProbabilisticAperiodic);
    assert_eq!(tx.presence().paths_at(0), vec![0, 1]);
}

#[test]
fn test_empty_explicit_lists_never_build() {
    assert_eq!(infer(json!([])), Err(ClassificationError::EmptySequence));

    for spec in [
        FrequencySpec::ExplicitTimes(vec![]),
        FrequencySpec::ExplicitProbabilities(vec![]),
    ] {
        assert_eq!(
            Transaction::new(5, 2, 0, spec, Some(1)).unwrap_err(),
            TransactionError::InputConfiguration(InputConfigurationError::EmptyTimestepList)
        );
    }
}

#[test]
fn test_non_finite_probability_fails_to_serialize() {
    assert!(serde_json::to_string(&FrequencySpec::Probability(f64::NAN)).is_err());
    assert!(serde_json::to_string(&FrequencySpec::Probability(f64::INFINITY)).is_err());
}

#[test]
fn test_infer_grids() {
    let column = infer(json!([[1.0], [0.8], [0.3]])).unwrap();
    assert_eq!(column, FrequencySpec::from_array(array![[1.0], [0.8], [0.3]]));

    let object = infer(json!({"shape": [2, 2], "values": [0.1, 0.2, 0.3, 0.4]})).unwrap();
    assert_eq!(object, FrequencySpec::from_array(array![[0.1, 0.2], [0.3, 0.4]]));

    let scalar = infer(json!({"shape": [], "values": [0.5]})).unwrap();
    assert_eq!(classify(&scalar), TransactionType::ProbabilisticPeriodic);
}

#[test]
fn test_infer_rejects_unrecognised_shapes() {
    assert!(matches!(
        infer(json!("weekly")),
        Err(ClassificationError::UnsupportedValue(_))
    ));
    assert!(matches!(
        infer(json!(true)),
        Err(ClassificationError::UnsupportedValue(_))
    ));
    assert_eq!(infer(json!([])), Err(ClassificationError::EmptySequence));
    assert!(matches!(
        infer(json!([1, "a"])),
        Err(ClassificationError::MixedSequence(_))
    ));
    assert!(matches!(
        infer(json!({"period": 3})),
        Err(ClassificationError::UnsupportedValue(_))
    ));
    assert!(matches!(
        infer(json!({"shape": [2, 2], "values": [0.1]})),
        Err(ClassificationError::InvalidGrid(_))
    ));
    assert_eq!(infer(json!([[0.1, 0.2], [0.3]])), Err(ClassificationError::RaggedGrid));
    assert!(matches!(
        infer(json!(u64::MAX)),
        Err(ClassificationError::UnsupportedValue(_))
    ));
}

#[test]
fn test_json_round_trip_keeps_classification() {
    let specs = vec![
        FrequencySpec::Unset,
        FrequencySpec::IntegerPeriod(3),
        FrequencySpec::Probability(1.0),
        FrequencySpec::ExplicitTimes(vec![0, 5]),
        FrequencySpec::ExplicitProbabilities(vec![(0, 1.0), (4, 0.0)]),
        FrequencySpec::from_array(array![[0.5, 1.0], [0.0, 0.25]]),
        FrequencySpec::grid(&[3], vec![0.5, 1.0, 0.0]).unwrap(),
    ];

    for spec in specs {
        let text = serde_json::to_string(&spec).unwrap();
        let back: FrequencySpec = serde_json::from_str(&text).unwrap();
        assert_eq!(back, spec, "round trip through {}", text);
        assert_eq!(classify(&back), classify(&spec));
    }
}

#[test]
fn test_transaction_type_serializes_as_code() {
    let text = serde_json::to_string(&TransactionType::ProbabilisticAperiodic).unwrap();
    assert_eq!(text, r#""p_a""#);

    let back: TransactionType = serde_json::from_str(r#""d_p""#).unwrap();
    assert_eq!(back, TransactionType::DiscretePeriodic);
    assert_eq!(back.to_string(), "d_p");
}
