//! Interval aggregation and relevance classification.
//!
//! Raw bound values from solved problems become per-feature
//! [`RelevanceInterval`]s. Probe upper bounds set a noise threshold per
//! feature block; each real feature is then classified against its block's
//! threshold:
//!
//! - `StronglyRelevant` if `lower > t`
//! - `WeaklyRelevant` if `lower ≤ t < upper`
//! - `Irrelevant` otherwise
//!
//! Classification always uses raw values. Normalized intervals divide by the
//! block's L1 budget.

use std::fmt;

use ndarray::Array2;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{FriError, FriResult};
use crate::formulation::{Block, BoundDirection, Budgets, FeatureRef};
use crate::lp::SolveStatus;
use crate::utils::{mean_std, quantile};

// =============================================================================
// Threshold statistic
// =============================================================================

/// Statistic over probe upper bounds that sets the noise threshold.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum ThresholdStatistic {
    /// Largest probe value.
    #[default]
    Max,
    /// Step percentile of the probe values, `q ∈ [0, 100]`.
    Percentile(f64),
    /// Normal quantile `1 − fpr` fitted to the probe values, `fpr ∈ (0, 1)`.
    Gaussian { fpr: f64 },
}

impl ThresholdStatistic {
    /// Evaluate on probe values. Zero when there are no probes.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        match *self {
            ThresholdStatistic::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            ThresholdStatistic::Percentile(q) => {
                let mut scratch = Vec::with_capacity(values.len());
                quantile(values, q / 100.0, &mut scratch)
            }
            ThresholdStatistic::Gaussian { fpr } => {
                let (mean, std) = mean_std(values);
                match Normal::new(mean, std) {
                    Ok(normal) if std > 0.0 => normal.inverse_cdf(1.0 - fpr),
                    _ => mean,
                }
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        match *self {
            ThresholdStatistic::Max => true,
            ThresholdStatistic::Percentile(q) => (0.0..=100.0).contains(&q),
            ThresholdStatistic::Gaussian { fpr } => fpr > 0.0 && fpr < 1.0,
        }
    }
}

// =============================================================================
// Output types
// =============================================================================

/// Relevance class of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum RelevanceClass {
    Irrelevant = 0,
    WeaklyRelevant = 1,
    StronglyRelevant = 2,
}

impl RelevanceClass {
    /// Numeric code: 0 irrelevant, 1 weakly, 2 strongly relevant.
    #[inline]
    pub fn code(self) -> i8 {
        self as i8
    }

    #[inline]
    pub fn is_relevant(self) -> bool {
        !matches!(self, RelevanceClass::Irrelevant)
    }
}

impl fmt::Display for RelevanceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelevanceClass::Irrelevant => "irrelevant",
            RelevanceClass::WeaklyRelevant => "weak",
            RelevanceClass::StronglyRelevant => "strong",
        };
        f.write_str(name)
    }
}

/// Closed interval `[lower, upper]` of a weight magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RelevanceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl RelevanceInterval {
    pub const NAN: RelevanceInterval = RelevanceInterval {
        lower: f64::NAN,
        upper: f64::NAN,
    };

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Per-feature result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum FeatureOutcome {
    Resolved {
        raw: RelevanceInterval,
        normalized: RelevanceInterval,
        class: RelevanceClass,
    },
    /// A bound of a real feature could not be resolved.
    Unresolved {
        direction: BoundDirection,
        status: SolveStatus,
    },
}

impl FeatureOutcome {
    pub fn class(&self) -> Option<RelevanceClass> {
        match self {
            FeatureOutcome::Resolved { class, .. } => Some(*class),
            FeatureOutcome::Unresolved { .. } => None,
        }
    }

    pub fn raw(&self) -> Option<RelevanceInterval> {
        match self {
            FeatureOutcome::Resolved { raw, .. } => Some(*raw),
            FeatureOutcome::Unresolved { .. } => None,
        }
    }

    pub fn normalized(&self) -> Option<RelevanceInterval> {
        match self {
            FeatureOutcome::Resolved { normalized, .. } => Some(*normalized),
            FeatureOutcome::Unresolved { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, FeatureOutcome::Resolved { .. })
    }
}

/// Noise threshold per feature block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NoiseThresholds {
    pub regular: f64,
    pub privileged: Option<f64>,
}

impl NoiseThresholds {
    pub fn for_block(&self, block: Block) -> f64 {
        match block {
            Block::Regular => self.regular,
            Block::Privileged => self.privileged.unwrap_or(self.regular),
        }
    }
}

/// Raw bounds of one real feature, as read from its solved problems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureBounds {
    pub feature: FeatureRef,
    pub column: usize,
    pub lower: Result<f64, SolveStatus>,
    pub upper: Result<f64, SolveStatus>,
}

// =============================================================================
// RelevanceResult
// =============================================================================

/// Classified relevance intervals of every real feature, in dataset column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelevanceResult {
    outcomes: Vec<FeatureOutcome>,
    blocks: Vec<Block>,
    thresholds: NoiseThresholds,
    budgets: Budgets,
    normalize: bool,
}

impl RelevanceResult {
    pub fn n_features(&self) -> usize {
        self.outcomes.len()
    }

    pub fn outcomes(&self) -> &[FeatureOutcome] {
        &self.outcomes
    }

    pub fn thresholds(&self) -> NoiseThresholds {
        self.thresholds
    }

    pub fn budgets(&self) -> Budgets {
        self.budgets
    }

    pub fn is_normalized(&self) -> bool {
        self.normalize
    }

    fn matrix(&self, pick: impl Fn(&FeatureOutcome) -> Option<RelevanceInterval>) -> Array2<f64> {
        let mut out = Array2::from_elem((self.outcomes.len(), 2), f64::NAN);
        for (i, outcome) in self.outcomes.iter().enumerate() {
            let interval = pick(outcome).unwrap_or(RelevanceInterval::NAN);
            out[[i, 0]] = interval.lower;
            out[[i, 1]] = interval.upper;
        }
        out
    }

    /// Intervals `[n_features, 2]`: normalized when normalization is on, raw
    /// otherwise. Unresolved features are `NaN` rows.
    pub fn interval(&self) -> Array2<f64> {
        if self.normalize {
            self.matrix(FeatureOutcome::normalized)
        } else {
            self.matrix(FeatureOutcome::raw)
        }
    }

    /// Raw intervals `[n_features, 2]` in weight units.
    pub fn unmod_interval(&self) -> Array2<f64> {
        self.matrix(FeatureOutcome::raw)
    }

    /// Class per feature, `None` when unresolved.
    pub fn relevance_classes(&self) -> Vec<Option<RelevanceClass>> {
        self.outcomes.iter().map(FeatureOutcome::class).collect()
    }

    /// Class codes (0, 1, 2), `-1` when unresolved.
    pub fn relevance_codes(&self) -> Vec<i8> {
        self.outcomes
            .iter()
            .map(|o| o.class().map_or(-1, RelevanceClass::code))
            .collect()
    }

    /// Mask of weakly or strongly relevant features.
    pub fn all_relevant(&self) -> Vec<bool> {
        self.outcomes
            .iter()
            .map(|o| o.class().is_some_and(RelevanceClass::is_relevant))
            .collect()
    }

    /// Columns whose bounds could not be resolved.
    pub fn unresolved(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| !o.is_resolved())
            .map(|(i, _)| i)
            .collect()
    }

    /// The result itself if every feature is resolved.
    ///
    /// # Errors
    ///
    /// [`FriError::UnresolvedBound`] for the first unresolved feature.
    pub fn require_resolved(&self) -> FriResult<&Self> {
        for (column, outcome) in self.outcomes.iter().enumerate() {
            if let FeatureOutcome::Unresolved { direction, status } = *outcome {
                return Err(FriError::UnresolvedBound {
                    feature: column,
                    direction,
                    status,
                });
            }
        }
        Ok(self)
    }
}

impl fmt::Display for RelevanceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>7}  {:<10}  {:>10}  {:>10}  {:<10}",
            "feature", "block", "lower", "upper", "class"
        )?;
        for (column, (outcome, block)) in self.outcomes.iter().zip(&self.blocks).enumerate() {
            match outcome {
                FeatureOutcome::Resolved {
                    raw,
                    normalized,
                    class,
                } => {
                    let shown = if self.normalize { normalized } else { raw };
                    writeln!(
                        f,
                        "{:>7}  {:<10}  {:>10.4}  {:>10.4}  {:<10}",
                        column,
                        block.to_string(),
                        shown.lower,
                        shown.upper,
                        class.to_string()
                    )?;
                }
                FeatureOutcome::Unresolved { direction, status } => {
                    writeln!(
                        f,
                        "{:>7}  {:<10}  {:>10}  {:>10}  unresolved ({direction}: {status})",
                        column,
                        block.to_string(),
                        "-",
                        "-"
                    )?;
                }
            }
        }
        write!(f, "noise threshold: {:.6}", self.thresholds.regular)?;
        if let Some(privileged) = self.thresholds.privileged {
            write!(f, " (privileged: {privileged:.6})")?;
        }
        Ok(())
    }
}

// =============================================================================
// Aggregator
// =============================================================================

/// Turns raw bounds into classified intervals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregator {
    statistic: ThresholdStatistic,
    epsilon: f64,
    normalize: bool,
}

impl Aggregator {
    /// # Arguments
    ///
    /// * `statistic` - Statistic over probe upper bounds
    /// * `epsilon` - Values below this magnitude count as zero; also added to thresholds
    /// * `normalize` - Whether [`RelevanceResult::interval`] reports normalized values
    pub fn new(statistic: ThresholdStatistic, epsilon: f64, normalize: bool) -> Self {
        Self {
            statistic,
            epsilon,
            normalize,
        }
    }

    #[inline]
    fn clean(&self, value: f64) -> f64 {
        if value.abs() < self.epsilon { 0.0 } else { value }
    }

    /// Noise thresholds from probe upper bounds: `statistic + epsilon`.
    ///
    /// A block without probes gets the threshold `epsilon`.
    pub fn thresholds(&self, regular: &[f64], privileged: Option<&[f64]>) -> NoiseThresholds {
        let threshold = |values: &[f64]| {
            let cleaned: Vec<f64> = values.iter().map(|&v| self.clean(v).max(0.0)).collect();
            self.statistic.evaluate(&cleaned) + self.epsilon
        };
        NoiseThresholds {
            regular: threshold(regular),
            privileged: privileged.map(threshold),
        }
    }

    /// Aggregate features with thresholds from probe values.
    pub fn aggregate(
        &self,
        features: &[FeatureBounds],
        probe_regular: &[f64],
        probe_privileged: Option<&[f64]>,
        budgets: &Budgets,
    ) -> RelevanceResult {
        let thresholds = self.thresholds(probe_regular, probe_privileged);
        self.aggregate_with_thresholds(features, thresholds, budgets)
    }

    /// Aggregate features against precomputed thresholds.
    ///
    /// `features` must be in dataset column order.
    pub fn aggregate_with_thresholds(
        &self,
        features: &[FeatureBounds],
        thresholds: NoiseThresholds,
        budgets: &Budgets,
    ) -> RelevanceResult {
        let outcomes = features
            .iter()
            .map(|bounds| self.outcome(bounds, &thresholds, budgets))
            .collect();
        RelevanceResult {
            outcomes,
            blocks: features.iter().map(|b| b.feature.block).collect(),
            thresholds,
            budgets: *budgets,
            normalize: self.normalize,
        }
    }

    fn outcome(
        &self,
        bounds: &FeatureBounds,
        thresholds: &NoiseThresholds,
        budgets: &Budgets,
    ) -> FeatureOutcome {
        let (lower, upper) = match (bounds.lower, bounds.upper) {
            (Ok(lower), Ok(upper)) => (lower, upper),
            (Err(status), _) => {
                return FeatureOutcome::Unresolved {
                    direction: BoundDirection::Lower,
                    status,
                };
            }
            (_, Err(status)) => {
                return FeatureOutcome::Unresolved {
                    direction: BoundDirection::Upper,
                    status,
                };
            }
        };

        let block = bounds.feature.block;
        let budget = budgets.block_l1(block).max(0.0);
        let upper = self.clean(upper).clamp(0.0, budget);
        let lower = self.clean(lower).clamp(0.0, budget).min(upper);
        let raw = RelevanceInterval { lower, upper };

        let threshold = thresholds.for_block(block);
        let class = if lower > threshold {
            RelevanceClass::StronglyRelevant
        } else if upper > threshold {
            RelevanceClass::WeaklyRelevant
        } else {
            RelevanceClass::Irrelevant
        };

        let normalized = if budget > 0.0 && budget.is_finite() {
            RelevanceInterval {
                lower: lower / budget,
                upper: upper / budget,
            }
        } else {
            RelevanceInterval {
                lower: 0.0,
                upper: 0.0,
            }
        };

        FeatureOutcome::Resolved {
            raw,
            normalized,
            class,
        }
    }
}
