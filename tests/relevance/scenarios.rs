//! End-to-end relevance scenarios with known answers.

use approx::assert_abs_diff_eq;
use fri::aggregate::{FeatureOutcome, RelevanceClass};
use fri::formulation::Block;
use fri::model::{FriConfig, OrdinalErrorType, ProblemKind, RelevanceModel};
use fri::testing::assert_intervals_approx_eq;

use crate::common;

fn config(problem: ProblemKind) -> FriConfig {
    FriConfig::builder()
        .problem(problem)
        .n_probe_features(8)
        .build()
        .unwrap()
}

#[test]
fn single_signal_is_strongly_relevant() {
    let model = RelevanceModel::fit(&common::strong_signal(), config(ProblemKind::Classification))
        .unwrap();
    let result = model.result();

    assert_abs_diff_eq!(model.baseline().l1_ref(), 2.0, epsilon = 1e-6);
    assert_abs_diff_eq!(model.baseline().loss(), 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(model.baseline().score(), 1.0);

    let raw = result.unmod_interval();
    assert_abs_diff_eq!(raw[[0, 0]], 2.0, epsilon = 1e-5);
    assert_abs_diff_eq!(raw[[0, 1]], 2.2, epsilon = 1e-5);
    assert_eq!(result.relevance_classes()[0], Some(RelevanceClass::StronglyRelevant));

    // The dummy can only take a sliver of the L1 slack.
    assert_abs_diff_eq!(raw[[1, 0]], 0.0, epsilon = 1e-6);
    assert!(raw[[1, 1]] < 0.05);
    assert_ne!(result.relevance_classes()[1], Some(RelevanceClass::StronglyRelevant));
    assert!(result.all_relevant()[0]);
}

#[test]
fn dummy_is_irrelevant_without_slack() {
    let config = FriConfig::builder()
        .n_probe_features(8)
        .w_l1_slack(0.0)
        .loss_slack(0.0)
        .build()
        .unwrap();
    let model = RelevanceModel::fit(&common::strong_signal(), config).unwrap();
    let result = model.result();

    assert_intervals_approx_eq(
        result.unmod_interval().view(),
        &[[2.0, 2.0], [0.0, 0.0]],
        1e-5,
        "zero slack",
    );
    assert_eq!(
        result.relevance_classes(),
        vec![Some(RelevanceClass::StronglyRelevant), Some(RelevanceClass::Irrelevant)]
    );
    assert_eq!(result.relevance_codes(), vec![2, 0]);
}

#[test]
fn redundant_copies_are_weakly_relevant() {
    let config = FriConfig::builder()
        .n_probe_features(8)
        .w_l1_slack(0.0)
        .loss_slack(0.0)
        .build()
        .unwrap();
    let model = RelevanceModel::fit(&common::redundant_pair(), config).unwrap();
    let result = model.result();

    assert_abs_diff_eq!(model.baseline().l1_ref(), 2.0, epsilon = 1e-6);
    let raw = result.unmod_interval();
    for j in 0..2 {
        assert_abs_diff_eq!(raw[[j, 0]], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(raw[[j, 1]], 2.0, epsilon = 1e-5);
        assert_eq!(result.relevance_classes()[j], Some(RelevanceClass::WeaklyRelevant));
    }
    assert_eq!(result.relevance_classes()[2], Some(RelevanceClass::Irrelevant));

    // Normalized by the L1 budget of 2.
    let normalized = result.interval();
    assert_abs_diff_eq!(normalized[[0, 1]], 1.0, epsilon = 1e-5);
}

#[test]
fn regression_interval_follows_the_tube() {
    let model = RelevanceModel::fit(&common::linear_regression(), config(ProblemKind::Regression))
        .unwrap();
    let result = model.result();

    assert_abs_diff_eq!(model.baseline().l1_ref(), 1.95, epsilon = 1e-6);
    assert_abs_diff_eq!(model.budgets().l1, 2.145, epsilon = 1e-6);
    assert!(model.baseline().score() > 0.99);

    let raw = result.unmod_interval();
    assert_abs_diff_eq!(raw[[0, 0]], 1.95, epsilon = 1e-5);
    assert_abs_diff_eq!(raw[[0, 1]], 2.05, epsilon = 1e-5);
    assert_eq!(result.relevance_classes()[0], Some(RelevanceClass::StronglyRelevant));
    assert_abs_diff_eq!(raw[[1, 0]], 0.0, epsilon = 1e-6);
}

#[test]
fn ordinal_signal_is_strongly_relevant() {
    let config = FriConfig::builder()
        .problem(ProblemKind::OrdinalRegression)
        .ordinal_error(OrdinalErrorType::Mze)
        .n_probe_features(8)
        .build()
        .unwrap();
    let model = RelevanceModel::fit(&common::ordinal_levels(), config).unwrap();

    assert_abs_diff_eq!(model.baseline().l1_ref(), 4.0 / 3.0, epsilon = 1e-6);
    assert_eq!(model.baseline().biases().len(), 2);
    assert_abs_diff_eq!(model.baseline().score(), 1.0);

    let raw = model.result().unmod_interval();
    assert_abs_diff_eq!(raw[[0, 0]], 4.0 / 3.0, epsilon = 1e-5);
    assert_eq!(
        model.result().relevance_classes()[0],
        Some(RelevanceClass::StronglyRelevant)
    );
}

#[test]
fn lupi_reports_privileged_block() {
    let config = FriConfig::builder()
        .problem(ProblemKind::LupiClassification)
        .n_privileged(1)
        .n_probe_features(4)
        .build()
        .unwrap();
    let model = RelevanceModel::fit(&common::with_privileged(), config).unwrap();
    let result = model.result();

    assert_eq!(result.n_features(), 3);
    assert!(result.thresholds().privileged.is_some());
    assert_eq!(model.budgets().privileged_l1.map(|b| b < 1e-6), Some(true));
    assert_eq!(result.relevance_classes()[0], Some(RelevanceClass::StronglyRelevant));
    // A zero privileged budget pins the privileged weight.
    assert_abs_diff_eq!(result.unmod_interval()[[2, 1]], 0.0, epsilon = 1e-6);

    let privileged_probes = model
        .probe_bounds()
        .iter()
        .filter(|p| p.block == Block::Privileged)
        .count();
    assert_eq!(privileged_probes, 4);
    assert_eq!(model.probe_bounds().len(), 8);
}

#[test]
fn constrained_intervals_fix_one_copy() {
    let config = FriConfig::builder()
        .n_probe_features(4)
        .w_l1_slack(0.0)
        .loss_slack(0.0)
        .build()
        .unwrap();
    let model = RelevanceModel::fit(&common::redundant_pair(), config).unwrap();

    // With the first copy switched off the second must carry the signal.
    let result = model
        .constrained_intervals([(0, fri::PresetRange::fixed(0.0))])
        .unwrap();
    let raw = result.unmod_interval();
    assert_abs_diff_eq!(raw[[0, 1]], 0.0);
    assert_abs_diff_eq!(raw[[1, 0]], 2.0, epsilon = 1e-5);
    assert_abs_diff_eq!(raw[[1, 1]], 2.0, epsilon = 1e-5);
    assert_eq!(result.relevance_classes()[1], Some(RelevanceClass::StronglyRelevant));
    assert!(matches!(result.outcomes()[0], FeatureOutcome::Resolved { .. }));
}

#[test]
fn result_summaries() {
    let model = RelevanceModel::fit(&common::strong_signal(), config(ProblemKind::Classification))
        .unwrap();
    let result = model.result();

    let table = result.to_string();
    assert!(table.contains("strong"));
    assert!(table.contains("noise threshold"));

    let json = serde_json::to_value(result).unwrap();
    assert_eq!(json["outcomes"].as_array().map(|a| a.len()), Some(2));
    assert!(result.require_resolved().is_ok());
    assert!(result.unresolved().is_empty());
}
