//! Preset weight ranges for fixed features.

use std::collections::BTreeMap;

use crate::error::{FriError, FriResult};
use crate::formulation::{Budgets, FeatureRef, ProblemData};

/// Signed range a feature's weight is held to.
///
/// The sign of `low` selects the side: `low ≥ 0` means `low ≤ w ≤ high`,
/// `low < 0` means `high ≤ w ≤ low`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct PresetRange {
    pub low: f64,
    pub high: f64,
}

impl PresetRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Weight fixed to a single value.
    pub const fn fixed(value: f64) -> Self {
        Self {
            low: value,
            high: value,
        }
    }

    /// `(min, max)` bounds on the signed weight.
    pub fn weight_bounds(&self) -> (f64, f64) {
        if self.low >= 0.0 {
            (self.low, self.high)
        } else {
            (self.high, self.low)
        }
    }

    /// Largest magnitude the range allows.
    pub fn magnitude(&self) -> f64 {
        self.low.abs().max(self.high.abs())
    }
}

/// Preset ranges keyed by feature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetConstraints {
    ranges: BTreeMap<FeatureRef, PresetRange>,
}

impl PresetConstraints {
    /// No presets.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate presets given by dataset column.
    ///
    /// # Errors
    ///
    /// - [`FriError::PresetFeatureOutOfRange`] for a column outside the dataset
    /// - [`FriError::PresetNotFinite`] for NaN or infinite ends
    /// - [`FriError::PresetOutOfBudget`] when `|low|` or `|high|` exceeds the
    ///   limit of the feature's block in `limits`
    ///
    /// `limits` are the unrelaxed reference norms of the baseline, not the
    /// widened bound-problem budgets.
    pub fn new(
        presets: impl IntoIterator<Item = (usize, PresetRange)>,
        data: &ProblemData,
        limits: &Budgets,
    ) -> FriResult<Self> {
        let mut ranges = BTreeMap::new();
        for (column, range) in presets {
            let feature = data
                .feature_ref(column)
                .ok_or(FriError::PresetFeatureOutOfRange {
                    feature: column,
                    n_features: data.n_features(),
                })?;
            if !range.low.is_finite() || !range.high.is_finite() {
                return Err(FriError::PresetNotFinite {
                    feature: column,
                    low: range.low,
                    high: range.high,
                });
            }
            let budget = limits.block_l1(feature.block);
            if range.magnitude() > budget {
                return Err(FriError::PresetOutOfBudget {
                    feature: column,
                    value: range.magnitude(),
                    budget,
                });
            }
            ranges.insert(feature, range);
        }
        Ok(Self { ranges })
    }

    /// Insert without validation.
    pub(crate) fn insert(&mut self, feature: FeatureRef, range: PresetRange) {
        self.ranges.insert(feature, range);
    }

    pub fn get(&self, feature: FeatureRef) -> Option<PresetRange> {
        self.ranges.get(&feature).copied()
    }

    pub fn contains(&self, feature: FeatureRef) -> bool {
        self.ranges.contains_key(&feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureRef, PresetRange)> + '_ {
        self.ranges.iter().map(|(&f, &r)| (f, r))
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
