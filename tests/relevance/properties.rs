//! Invariants that hold for any dataset.

use fri::aggregate::FeatureOutcome;
use fri::model::{FriConfig, ProblemKind, RelevanceModel};
use fri::probes::ProbeStrategy;
use fri::testing::data::{GenParams, gen_classification_data, gen_regression_data};
use rstest::rstest;

use crate::common;

fn assert_bounds_consistent(model: &RelevanceModel) {
    let result = model.result();
    for (j, outcome) in result.outcomes().iter().enumerate() {
        let FeatureOutcome::Resolved { raw, normalized, .. } = outcome else {
            continue;
        };
        let budget = model.budgets().l1;
        assert!(raw.lower >= 0.0, "feature {j}: negative lower {}", raw.lower);
        assert!(raw.lower <= raw.upper, "feature {j}: lower above upper");
        assert!(raw.upper <= budget + 1e-9, "feature {j}: upper above budget");
        assert!((0.0..=1.0).contains(&normalized.lower));
        assert!((0.0..=1.0).contains(&normalized.upper));
    }
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(23)]
fn generated_classification_bounds_are_consistent(#[case] seed: u64) {
    let params = GenParams {
        n_samples: 30,
        n_features: 5,
        n_strong: 1,
        n_redundant: 2,
        seed,
        ..Default::default()
    };
    let dataset = gen_classification_data(&params, 1.0).unwrap();
    let config = FriConfig::builder().n_probe_features(5).build().unwrap();
    let model = RelevanceModel::fit(&dataset, config).unwrap();
    assert_eq!(model.result().n_features(), 5);
    assert_bounds_consistent(&model);
}

#[rstest]
#[case(ProbeStrategy::Permutation)]
#[case(ProbeStrategy::Resample)]
#[case(ProbeStrategy::Noise)]
fn generated_regression_bounds_are_consistent(#[case] strategy: ProbeStrategy) {
    let params = GenParams {
        n_samples: 30,
        n_features: 4,
        n_strong: 2,
        noise: 0.1,
        ..Default::default()
    };
    let dataset = gen_regression_data(&params).unwrap();
    let config = FriConfig::builder()
        .problem(ProblemKind::Regression)
        .probe_strategy(strategy)
        .n_probe_features(5)
        .build()
        .unwrap();
    let model = RelevanceModel::fit(&dataset, config).unwrap();
    assert_eq!(model.probe_bounds().len(), 5);
    assert_eq!(model.result().n_features(), 4);
    assert_bounds_consistent(&model);
}

#[test]
fn results_do_not_depend_on_thread_count() {
    let fit = |n_jobs: usize| {
        let config = FriConfig::builder()
            .n_probe_features(6)
            .n_jobs(n_jobs)
            .random_state(11)
            .build()
            .unwrap();
        RelevanceModel::fit(&common::redundant_pair(), config).unwrap()
    };
    let sequential = fit(1);
    let parallel = fit(3);

    assert_eq!(sequential.result().unmod_interval(), parallel.result().unmod_interval());
    assert_eq!(sequential.thresholds(), parallel.thresholds());
    assert_eq!(sequential.probe_bounds(), parallel.probe_bounds());
}

#[test]
fn wider_slack_never_shrinks_intervals() {
    let base = FriConfig::builder().n_probe_features(2).build().unwrap();
    let reference = RelevanceModel::fit(&common::redundant_pair(), base).unwrap();
    let baseline = reference.baseline().clone();

    let fit = |w_l1_slack: f64, loss_slack: f64| {
        let config = FriConfig::builder()
            .n_probe_features(2)
            .w_l1_slack(w_l1_slack)
            .loss_slack(loss_slack)
            .build()
            .unwrap();
        RelevanceModel::fit_with_baseline(&common::redundant_pair(), config, baseline.clone())
            .unwrap()
            .result()
            .unmod_interval()
    };

    let narrow = fit(0.05, 0.05);
    let wide = fit(0.3, 0.3);
    for j in 0..narrow.nrows() {
        assert!(wide[[j, 0]] <= narrow[[j, 0]] + 1e-6, "lower of feature {j} grew");
        assert!(wide[[j, 1]] >= narrow[[j, 1]] - 1e-6, "upper of feature {j} shrank");
    }
}

#[test]
fn probes_never_appear_as_features() {
    let config = FriConfig::builder().n_probe_features(10).build().unwrap();
    let model = RelevanceModel::fit(&common::strong_signal(), config).unwrap();
    assert_eq!(model.result().n_features(), 2);
    assert_eq!(model.result().interval().nrows(), 2);
    assert_eq!(model.probe_bounds().len(), 10);
    for probe in model.probe_bounds() {
        assert!(probe.lower <= probe.upper + 1e-9);
        assert!(probe.upper < 0.5);
    }
}
