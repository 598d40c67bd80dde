//! Label encoding for the classification and ordinal formulations.

use ndarray::{Array1, ArrayView1};

use crate::error::{FriError, FriResult};

/// Binary labels encoded to `±1`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryLabels {
    /// Encoded labels, `-1.0` or `+1.0`.
    pub encoded: Array1<f64>,
    /// Original label values: `classes[0] ↦ -1`, `classes[1] ↦ +1`.
    pub classes: [f64; 2],
}

/// Ordinal labels mapped to bins `0..n_bins`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrdinalLabels {
    /// Bin index per sample.
    pub bins: Vec<usize>,
    /// Number of bins (`k`).
    pub n_bins: usize,
    /// Original integer label per bin, ascending.
    pub levels: Vec<f64>,
}

fn sorted_unique(values: ArrayView1<'_, f64>) -> Vec<f64> {
    let mut unique: Vec<f64> = values.to_vec();
    unique.sort_by(f64::total_cmp);
    unique.dedup();
    unique
}

/// Encode a binary target to `±1`.
///
/// The smaller of the two distinct labels becomes `-1`.
///
/// # Errors
///
/// [`FriError::LabelCardinality`] unless exactly two distinct labels are present.
pub fn encode_binary(targets: ArrayView1<'_, f64>) -> FriResult<BinaryLabels> {
    let classes = sorted_unique(targets);
    if classes.len() != 2 {
        return Err(FriError::LabelCardinality {
            problem: "classification",
            expected: "exactly 2".to_string(),
            found: classes.len(),
        });
    }
    let encoded = targets.mapv(|v| if v == classes[0] { -1.0 } else { 1.0 });
    Ok(BinaryLabels {
        encoded,
        classes: [classes[0], classes[1]],
    })
}

/// Encode an ordinal target to consecutive bins.
///
/// Labels must be integer valued. Distinct values are ranked ascending, so
/// `{1, 3, 7}` maps to bins `{0, 1, 2}`.
///
/// # Errors
///
/// [`FriError::NonIntegerOrdinalLabel`] for fractional labels and
/// [`FriError::LabelCardinality`] for fewer than two bins.
pub fn encode_ordinal(targets: ArrayView1<'_, f64>) -> FriResult<OrdinalLabels> {
    if let Some((row, &value)) = targets.iter().enumerate().find(|(_, v)| v.fract() != 0.0) {
        return Err(FriError::NonIntegerOrdinalLabel { row, value });
    }
    let levels = sorted_unique(targets);
    if levels.len() < 2 {
        return Err(FriError::LabelCardinality {
            problem: "ordinal regression",
            expected: "at least 2".to_string(),
            found: levels.len(),
        });
    }
    let bins = targets
        .iter()
        .map(|v| levels.partition_point(|l| l < v))
        .collect();
    Ok(OrdinalLabels {
        bins,
        n_bins: levels.len(),
        levels,
    })
}
