//! Fatal errors are raised before any bound is solved.

use fri::data::{Dataset, DatasetError};
use fri::model::{ConfigError, FriConfig, OrdinalErrorType, ProblemKind, RelevanceModel};
use fri::{FriError, PresetRange};
use ndarray::{Array1, Array2};

use crate::common;

#[test]
fn unknown_names_list_the_valid_ones() {
    let err = "lasso".parse::<ProblemKind>().unwrap_err();
    assert!(matches!(err, ConfigError::UnknownProblem { .. }));
    assert!(err.to_string().contains("lupi_classification"));

    let err = "rmse".parse::<OrdinalErrorType>().unwrap_err();
    assert!(matches!(err, ConfigError::UnknownOrdinalError { .. }));
}

#[test]
fn preset_over_budget_is_fatal() {
    let config = FriConfig::builder().n_probe_features(2).build().unwrap();
    let model = RelevanceModel::fit(&common::strong_signal(), config).unwrap();
    let l1_ref = model.baseline().l1_ref();

    // Just above the baseline norm, still inside the widened L1 budget.
    let over = 1.05 * l1_ref;
    assert!(over < model.budgets().l1);
    let err = model
        .constrained_intervals([(0, PresetRange::new(-over, -1.0))])
        .unwrap_err();
    assert!(matches!(err, FriError::PresetOutOfBudget { feature: 0, .. }));

    let err = model
        .constrained_intervals([(1, PresetRange::fixed(over))])
        .unwrap_err();
    assert!(matches!(err, FriError::PresetOutOfBudget { feature: 1, .. }));

    assert!(model
        .constrained_intervals([(1, PresetRange::new(0.0, l1_ref))])
        .is_ok());

    let err = model
        .constrained_intervals([(0, PresetRange::new(f64::NAN, 1.0))])
        .unwrap_err();
    assert!(matches!(err, FriError::PresetNotFinite { feature: 0, .. }));
}

#[test]
fn label_cardinality_is_checked() {
    let x = Array2::from_shape_fn((6, 1), |(i, _)| i as f64);

    let one_class = Dataset::new(x.clone(), Array1::from_elem(6, 1.0)).unwrap();
    let err = RelevanceModel::fit(&one_class, FriConfig::default()).unwrap_err();
    assert!(matches!(err, FriError::LabelCardinality { found: 1, .. }));

    let fractional = Dataset::new(x.clone(), Array1::from(vec![0.0, 0.5, 1.0, 1.0, 2.0, 2.0]))
        .unwrap();
    let config = FriConfig::builder()
        .problem(ProblemKind::OrdinalRegression)
        .build()
        .unwrap();
    let err = RelevanceModel::fit(&fractional, config.clone()).unwrap_err();
    assert!(matches!(err, FriError::NonIntegerOrdinalLabel { row: 1, .. }));

    let single_level = Dataset::new(x, Array1::from_elem(6, 3.0)).unwrap();
    let err = RelevanceModel::fit(&single_level, config).unwrap_err();
    assert!(matches!(err, FriError::LabelCardinality { found: 1, .. }));
}

#[test]
fn privileged_block_must_leave_regular_features() {
    let config = FriConfig::builder()
        .problem(ProblemKind::LupiClassification)
        .n_privileged(2)
        .build()
        .unwrap();
    let err = RelevanceModel::fit(&common::strong_signal(), config).unwrap_err();
    assert!(matches!(
        err,
        FriError::Dataset(DatasetError::PrivilegedOutOfRange { .. })
    ));
}

#[test]
fn invalid_config_is_rejected_at_fit() {
    let mut config = FriConfig::default();
    config.c = -1.0;
    let err = RelevanceModel::fit(&common::strong_signal(), config).unwrap_err();
    assert_eq!(err, FriError::Config(ConfigError::InvalidC(-1.0)));
}
