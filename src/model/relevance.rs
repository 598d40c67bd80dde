//! The relevance estimator: baseline, budgets, bound problems, aggregation.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::aggregate::{Aggregator, FeatureBounds, NoiseThresholds, RelevanceResult};
use crate::bounds::{BoundJob, BoundProblem, PresetConstraints, PresetRange, ProblemId, Target};
use crate::data::{Dataset, encode_binary, encode_ordinal};
use crate::error::{FriError, FriResult};
use crate::formulation::{
    Block, BoundDirection, Budgets, FeatureRef, Formulation, FormulationBuilder, LupiTask,
    ProbeFeature, ProblemData, Relaxation,
};
use crate::logging::SolveLogger;
use crate::lp::SolveStatus;
use crate::orchestrator::{SolveOrchestrator, SolvedBatch};
use crate::probes::ProbeGenerator;

use super::baseline::{EncodedTargets, fit_baseline};
use super::{BaselineModel, BaselineParams, FriConfig, ProblemKind};

/// Bounds of one probe feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeBounds {
    pub block: Block,
    /// Column of the block the probe was drawn from.
    pub source: usize,
    pub lower: f64,
    pub upper: f64,
}

/// A fitted feature relevance model.
///
/// # Example
///
/// ```
/// use fri::data::Dataset;
/// use fri::model::{FriConfig, RelevanceModel};
/// use ndarray::{Array1, Array2};
///
/// let x = Array2::from_shape_fn((8, 2), |(i, j)| {
///     if j == 0 { if i < 4 { 1.0 + i as f64 } else { -1.0 - i as f64 } } else { 0.0 }
/// });
/// let y = Array1::from_shape_fn(8, |i| if i < 4 { 1.0 } else { 0.0 });
/// let dataset = Dataset::new(x, y).unwrap();
///
/// let config = FriConfig::builder().n_probe_features(5).build().unwrap();
/// let model = RelevanceModel::fit(&dataset, config).unwrap();
/// assert_eq!(model.result().n_features(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RelevanceModel {
    config: FriConfig,
    formulation: Arc<Formulation>,
    data: Arc<ProblemData>,
    baseline: BaselineModel,
    budgets: Budgets,
    probes: Vec<ProbeBounds>,
    result: RelevanceResult,
}

impl RelevanceModel {
    /// Fit a baseline and compute relevance intervals for every feature.
    ///
    /// # Errors
    ///
    /// Configuration, dataset and label errors before any solve;
    /// [`FriError::BaselineFailed`] when the baseline program has no solution.
    /// Unresolved feature bounds are *not* errors here: they are reported as
    /// [`FeatureOutcome::Unresolved`](crate::aggregate::FeatureOutcome).
    pub fn fit(dataset: &Dataset, config: FriConfig) -> FriResult<Self> {
        Self::fit_inner(dataset, config, None)
    }

    /// Compute relevance intervals around a caller-supplied baseline.
    ///
    /// The baseline's `epsilon` sets the regression tube.
    pub fn fit_with_baseline(
        dataset: &Dataset,
        config: FriConfig,
        baseline: BaselineModel,
    ) -> FriResult<Self> {
        Self::fit_inner(dataset, config, Some(baseline))
    }

    fn fit_inner(
        dataset: &Dataset,
        config: FriConfig,
        baseline: Option<BaselineModel>,
    ) -> FriResult<Self> {
        config.validate()?;
        let mut logger = SolveLogger::new(config.verbosity);

        let problem = config.problem;
        let data = Arc::new(ProblemData::from_dataset(dataset, config.n_privileged)?);
        let targets = encode_targets(problem, dataset)?;
        let params = match &baseline {
            Some(model) => model.params(),
            None => BaselineParams {
                c: config.c,
                epsilon: config.epsilon,
            },
        };
        let formulation = Arc::new(build_formulation(problem, &targets, params.epsilon));

        let baseline = match baseline {
            Some(model) => {
                check_baseline(&model, problem, &data, &targets)?;
                model
            }
            None => fit_baseline(
                problem,
                &formulation,
                &data,
                &targets,
                params,
                config.ordinal_error,
                &config.tolerances,
            )?,
        };
        logger.info(&format!(
            "{} baseline: l1 {:.6}, loss {:.6}, score {:.4}",
            formulation.name(),
            baseline.l1_ref(),
            baseline.loss(),
            baseline.score()
        ));

        let budgets = Budgets::from_reference(
            baseline.l1_ref(),
            baseline.loss(),
            baseline.privileged_l1_ref().filter(|_| problem.is_lupi()),
            config.w_l1_slack,
            config.loss_slack,
        );

        let mut generator = ProbeGenerator::new(config.probe_strategy, config.random_state);
        let mut probes = generator.generate(Block::Regular, data.regular(), config.n_probe_features);
        if let Some(privileged) = data.privileged() {
            probes.extend(generator.generate(
                Block::Privileged,
                privileged,
                config.n_probe_features,
            ));
        }

        let planner = Planner {
            formulation: &formulation,
            data: &data,
            budgets,
            presets: Arc::new(PresetConstraints::empty()),
            relaxations: config.relaxations.clone().into(),
        };
        let mut problems = planner.feature_problems(|_| true);
        problems.extend(planner.probe_problems(probes));

        let batch = orchestrator(&config).run(problems, &mut logger)?;
        let (features, probes) = collect(batch);

        let aggregator = Aggregator::new(config.threshold, config.epsilon_floor, config.normalize);
        let upper_of = |block: Block| -> Vec<f64> {
            probes
                .iter()
                .filter(|p| p.block == block)
                .map(|p| p.upper)
                .collect()
        };
        let regular = upper_of(Block::Regular);
        let privileged = data.privileged().map(|_| upper_of(Block::Privileged));
        let result = aggregator.aggregate(&features, &regular, privileged.as_deref(), &budgets);
        warn_unresolved(&logger, &result);

        Ok(Self {
            config,
            formulation,
            data,
            baseline,
            budgets,
            probes,
            result,
        })
    }

    /// Recompute real-feature intervals with some features held to preset
    /// weight ranges.
    ///
    /// Presets are keyed by dataset column and given in raw weight units.
    /// The fitted baseline, budgets and noise thresholds are reused; a preset
    /// feature reports the magnitude range of its preset.
    ///
    /// # Errors
    ///
    /// Invalid presets are rejected before any solve (see
    /// [`PresetConstraints::new`]).
    pub fn constrained_intervals(
        &self,
        presets: impl IntoIterator<Item = (usize, PresetRange)>,
    ) -> FriResult<RelevanceResult> {
        let presets = Arc::new(PresetConstraints::new(
            presets,
            &self.data,
            &self.reference_norms(),
        )?);
        let mut logger = SolveLogger::new(self.config.verbosity);

        let planner = Planner {
            formulation: &self.formulation,
            data: &self.data,
            budgets: self.budgets,
            presets: presets.clone(),
            relaxations: self.config.relaxations.clone().into(),
        };
        let problems = planner.feature_problems(|feature| !presets.contains(feature));
        let batch = orchestrator(&self.config).run(problems, &mut logger)?;
        let (solved, _) = collect(batch);

        let mut solved = solved.into_iter().peekable();
        let features: Vec<FeatureBounds> = self
            .data
            .features()
            .map(|feature| {
                let column = self.data.column(feature);
                match presets.get(feature) {
                    Some(range) => preset_bounds(feature, column, range),
                    None => solved
                        .next_if(|b| b.feature == feature)
                        .unwrap_or_else(|| unsolved(feature, column)),
                }
            })
            .collect();

        let aggregator = Aggregator::new(
            self.config.threshold,
            self.config.epsilon_floor,
            self.config.normalize,
        );
        let result = aggregator.aggregate_with_thresholds(&features, self.thresholds(), &self.budgets);
        warn_unresolved(&logger, &result);
        Ok(result)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &FriConfig {
        &self.config
    }

    pub fn baseline(&self) -> &BaselineModel {
        &self.baseline
    }

    pub fn budgets(&self) -> Budgets {
        self.budgets
    }

    /// Unrelaxed L1 norms of the baseline, the limits for preset ranges.
    pub fn reference_norms(&self) -> Budgets {
        Budgets::from_reference(
            self.baseline.l1_ref(),
            self.baseline.loss(),
            self.baseline
                .privileged_l1_ref()
                .filter(|_| self.config.problem.is_lupi()),
            0.0,
            0.0,
        )
    }

    pub fn result(&self) -> &RelevanceResult {
        &self.result
    }

    pub fn thresholds(&self) -> NoiseThresholds {
        self.result.thresholds()
    }

    /// Bounds of every probe, regular block first.
    pub fn probe_bounds(&self) -> &[ProbeBounds] {
        &self.probes
    }

    pub fn into_result(self) -> RelevanceResult {
        self.result
    }
}

// =============================================================================
// Fit helpers
// =============================================================================

fn encode_targets(problem: ProblemKind, dataset: &Dataset) -> FriResult<EncodedTargets> {
    let y = dataset.targets();
    Ok(match problem.base() {
        ProblemKind::Classification => EncodedTargets::Binary(encode_binary(y)?),
        ProblemKind::OrdinalRegression => EncodedTargets::Ordinal(encode_ordinal(y)?),
        _ => EncodedTargets::Continuous(y.to_owned()),
    })
}

fn build_formulation(problem: ProblemKind, targets: &EncodedTargets, epsilon: f64) -> Formulation {
    let base = match targets {
        EncodedTargets::Binary(labels) => Formulation::classification(labels.encoded.clone()),
        EncodedTargets::Continuous(y) => Formulation::regression(y.clone(), epsilon),
        EncodedTargets::Ordinal(labels) => Formulation::ordinal(labels.clone()),
    };
    if !problem.is_lupi() {
        return base;
    }
    match base {
        Formulation::Classification(inner) => Formulation::lupi(LupiTask::Classification(inner)),
        Formulation::Regression(inner) => Formulation::lupi(LupiTask::Regression(inner)),
        Formulation::Ordinal(inner) => Formulation::lupi(LupiTask::Ordinal(inner)),
        lupi @ Formulation::Lupi(_) => lupi,
    }
}

/// Shape checks for a caller-supplied baseline.
fn check_baseline(
    model: &BaselineModel,
    problem: ProblemKind,
    data: &ProblemData,
    targets: &EncodedTargets,
) -> FriResult<()> {
    let invalid = |reason: String| Err(FriError::InvalidBaseline { reason });

    if model.problem() != problem {
        return invalid(format!("baseline was fitted for {}, not {problem}", model.problem()));
    }
    if model.coefficients().len() != data.n_regular() {
        return invalid(format!(
            "expected {} coefficients, got {}",
            data.n_regular(),
            model.coefficients().len()
        ));
    }
    let expected_biases = match targets {
        EncodedTargets::Ordinal(labels) => labels.n_bins - 1,
        _ => 1,
    };
    if model.biases().len() != expected_biases {
        return invalid(format!(
            "expected {expected_biases} bias terms, got {}",
            model.biases().len()
        ));
    }
    if problem.is_lupi() {
        let found = model.privileged_coefficients().map_or(0, |w| w.len());
        if found != data.n_privileged() {
            return invalid(format!(
                "expected {} privileged coefficients, got {found}",
                data.n_privileged()
            ));
        }
    }
    Ok(())
}

fn orchestrator(config: &FriConfig) -> SolveOrchestrator {
    SolveOrchestrator::new(config.n_jobs, config.timeout, config.tolerances)
}

/// Builds the bound problems of one batch.
struct Planner<'a> {
    formulation: &'a Arc<Formulation>,
    data: &'a Arc<ProblemData>,
    budgets: Budgets,
    presets: Arc<PresetConstraints>,
    relaxations: Arc<[Relaxation]>,
}

impl Planner<'_> {
    fn job(
        &self,
        target: FeatureRef,
        direction: BoundDirection,
        probe: Option<Arc<ProbeFeature>>,
    ) -> BoundJob {
        BoundJob::new(
            self.formulation.clone(),
            self.data.clone(),
            probe,
            target,
            direction,
            self.budgets,
            self.presets.clone(),
            self.relaxations.clone(),
        )
    }

    /// Lower and upper problems for every real feature passing `include`.
    fn feature_problems(&self, include: impl Fn(FeatureRef) -> bool) -> Vec<BoundProblem> {
        let mut problems = Vec::new();
        for feature in self.data.features().filter(|&f| include(f)) {
            let column = self.data.column(feature);
            for direction in [BoundDirection::Lower, BoundDirection::Upper] {
                problems.push(BoundProblem::new(
                    ProblemId::feature(feature, column, direction),
                    self.job(feature, direction, None),
                ));
            }
        }
        problems
    }

    /// Lower and upper problems for every probe; a probe's weight is the
    /// column appended after its block.
    fn probe_problems(&self, probes: Vec<ProbeFeature>) -> Vec<BoundProblem> {
        let mut problems = Vec::new();
        let mut per_block = [0usize; 2];
        for probe in probes {
            let block = probe.block;
            let n_cols = self.data.block(block).map_or(0, |m| m.ncols());
            let slot = match block {
                Block::Regular => &mut per_block[0],
                Block::Privileged => &mut per_block[1],
            };
            let index = *slot;
            *slot += 1;

            let probe = Arc::new(probe);
            let target = FeatureRef { block, index: n_cols };
            for direction in [BoundDirection::Lower, BoundDirection::Upper] {
                problems.push(BoundProblem::new(
                    ProblemId::probe(block, index, direction),
                    self.job(target, direction, Some(probe.clone())),
                ));
            }
        }
        problems
    }
}

/// Split a solved batch into real-feature bounds (column order) and probe
/// bounds (regular block first).
fn collect(batch: SolvedBatch) -> (Vec<FeatureBounds>, Vec<ProbeBounds>) {
    let mut features: BTreeMap<usize, FeatureBounds> = BTreeMap::new();
    let mut probes: BTreeMap<(Block, usize), ProbeBounds> = BTreeMap::new();

    for problem in batch.into_problems() {
        let id = *problem.id();
        match id.target {
            Target::Feature { feature, column } => {
                let value = problem.result().map_err(|_| problem.status());
                let bounds = features.entry(column).or_insert(FeatureBounds {
                    feature,
                    column,
                    lower: Err(SolveStatus::Unsolved),
                    upper: Err(SolveStatus::Unsolved),
                });
                match id.direction {
                    BoundDirection::Lower => bounds.lower = value,
                    BoundDirection::Upper => bounds.upper = value,
                }
            }
            Target::Probe { block, probe } => {
                let value = problem.result().unwrap_or(0.0);
                let source = problem.job().probe().map_or(0, |p| p.source);
                let bounds = probes.entry((block, probe)).or_insert(ProbeBounds {
                    block,
                    source,
                    lower: 0.0,
                    upper: 0.0,
                });
                match id.direction {
                    BoundDirection::Lower => bounds.lower = value,
                    BoundDirection::Upper => bounds.upper = value,
                }
            }
        }
    }

    (features.into_values().collect(), probes.into_values().collect())
}

fn unsolved(feature: FeatureRef, column: usize) -> FeatureBounds {
    FeatureBounds {
        feature,
        column,
        lower: Err(SolveStatus::Unsolved),
        upper: Err(SolveStatus::Unsolved),
    }
}

/// Interval implied by a preset: the magnitude range of its weights.
fn preset_bounds(feature: FeatureRef, column: usize, range: PresetRange) -> FeatureBounds {
    let (low, high) = range.weight_bounds();
    let upper = low.abs().max(high.abs());
    let lower = if low <= 0.0 && high >= 0.0 {
        0.0
    } else {
        low.abs().min(high.abs())
    };
    FeatureBounds {
        feature,
        column,
        lower: Ok(lower),
        upper: Ok(upper),
    }
}

fn warn_unresolved(logger: &SolveLogger, result: &RelevanceResult) {
    let unresolved = result.unresolved();
    if !unresolved.is_empty() {
        logger.warn(&format!(
            "{} feature(s) have unresolved bounds: {unresolved:?}",
            unresolved.len()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::RelevanceClass;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, Array2};

    /// Signal column `±{0.5, …, 2.0}` with twin rows carrying a dummy `±2.5`.
    fn twin_dummy() -> Dataset {
        let signal = [0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];
        let mut rows = Vec::new();
        let mut y = Vec::new();
        for &s in &signal {
            for (sign, label) in [(1.0, 1.0), (-1.0, 0.0)] {
                for dummy in [2.5, -2.5] {
                    rows.extend([sign * s, dummy]);
                    y.push(label);
                }
            }
        }
        let n = y.len();
        Dataset::new(Array2::from_shape_vec((n, 2), rows).unwrap(), Array1::from(y)).unwrap()
    }

    fn config() -> FriConfig {
        FriConfig::builder().n_probe_features(6).build().unwrap()
    }

    #[test]
    fn signal_is_strong_and_dummy_is_not() {
        let model = RelevanceModel::fit(&twin_dummy(), config()).unwrap();
        assert_abs_diff_eq!(model.baseline().l1_ref(), 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(model.budgets().l1, 2.2, epsilon = 1e-6);

        let raw = model.result().unmod_interval();
        assert_abs_diff_eq!(raw[[0, 0]], 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(raw[[0, 1]], 2.2, epsilon = 1e-5);
        assert_abs_diff_eq!(raw[[1, 0]], 0.0, epsilon = 1e-6);
        assert!(raw[[1, 1]] <= 0.2 / 6.0 + 1e-6);

        let classes = model.result().relevance_classes();
        assert_eq!(classes[0], Some(RelevanceClass::StronglyRelevant));
        assert_ne!(classes[1], Some(RelevanceClass::StronglyRelevant));
        assert_eq!(model.probe_bounds().len(), 6);
        assert!(model.probe_bounds().iter().all(|p| p.block == Block::Regular));
    }

    #[test]
    fn preset_over_budget_is_rejected() {
        let model = RelevanceModel::fit(&twin_dummy(), config()).unwrap();
        let err = model
            .constrained_intervals([(1, PresetRange::new(0.0, 5.0))])
            .unwrap_err();
        assert!(matches!(err, FriError::PresetOutOfBudget { feature: 1, .. }));

        // Above the baseline norm but within the widened budget.
        let l1_ref = model.baseline().l1_ref();
        assert!(1.05 * l1_ref < model.budgets().l1);
        let err = model
            .constrained_intervals([(1, PresetRange::fixed(1.05 * l1_ref))])
            .unwrap_err();
        assert!(matches!(
            err,
            FriError::PresetOutOfBudget { feature: 1, budget, .. } if (budget - l1_ref).abs() < 1e-12
        ));
        assert!(model
            .constrained_intervals([(1, PresetRange::new(0.0, l1_ref))])
            .is_ok());

        let err = model
            .constrained_intervals([(7, PresetRange::fixed(0.0))])
            .unwrap_err();
        assert!(matches!(err, FriError::PresetFeatureOutOfRange { feature: 7, .. }));
    }

    #[test]
    fn preset_feature_reports_its_range() {
        let model = RelevanceModel::fit(&twin_dummy(), config()).unwrap();
        let result = model
            .constrained_intervals([(1, PresetRange::fixed(0.0))])
            .unwrap();
        let raw = result.unmod_interval();
        assert_abs_diff_eq!(raw[[1, 0]], 0.0);
        assert_abs_diff_eq!(raw[[1, 1]], 0.0);
        assert_abs_diff_eq!(raw[[0, 0]], 2.0, epsilon = 1e-5);
        assert_eq!(result.thresholds(), model.thresholds());
    }

    #[test]
    fn supplied_baseline_must_match_the_data() {
        let baseline = BaselineModel::new(
            ProblemKind::Classification,
            Array1::from(vec![2.0, 0.0, 0.0]),
            vec![0.0],
            0.0,
            BaselineParams { c: 1.0, epsilon: 0.1 },
        )
        .unwrap();
        let err = RelevanceModel::fit_with_baseline(&twin_dummy(), config(), baseline).unwrap_err();
        assert!(matches!(err, FriError::InvalidBaseline { .. }));
    }

    #[test]
    fn supplied_baseline_sets_budgets() {
        let baseline = BaselineModel::new(
            ProblemKind::Classification,
            Array1::from(vec![2.0, 0.0]),
            vec![0.0],
            0.0,
            BaselineParams { c: 1.0, epsilon: 0.1 },
        )
        .unwrap();
        let config = FriConfig::builder()
            .n_probe_features(2)
            .w_l1_slack(0.5)
            .build()
            .unwrap();
        let model = RelevanceModel::fit_with_baseline(&twin_dummy(), config, baseline).unwrap();
        assert_abs_diff_eq!(model.budgets().l1, 3.0, epsilon = 1e-12);
        assert!(model.baseline().score().is_nan());
    }

    #[test]
    fn classification_needs_two_labels() {
        let x = Array2::from_shape_fn((4, 1), |(i, _)| i as f64);
        let dataset = Dataset::new(x, Array1::from(vec![1.0, 2.0, 3.0, 1.0])).unwrap();
        let err = RelevanceModel::fit(&dataset, config()).unwrap_err();
        assert!(matches!(err, FriError::LabelCardinality { found: 3, .. }));
    }
}
