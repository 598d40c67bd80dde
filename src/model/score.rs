//! Baseline scores: weighted F1, R² and ordinal errors.

use std::fmt;
use std::str::FromStr;

use super::ConfigError;

// =============================================================================
// Classification
// =============================================================================

/// Support-weighted F1 over the classes present in `y_true` or `y_pred`.
///
/// A class with no true samples has zero weight. Returns `0.0` for empty input.
pub fn weighted_f1(y_true: &[f64], y_pred: &[f64]) -> f64 {
    debug_assert_eq!(y_true.len(), y_pred.len());
    let n = y_true.len();
    if n == 0 {
        return 0.0;
    }

    let mut classes: Vec<f64> = y_true.iter().chain(y_pred).copied().collect();
    classes.sort_by(f64::total_cmp);
    classes.dedup();

    classes
        .iter()
        .map(|&c| {
            let mut tp = 0usize;
            let mut fp = 0usize;
            let mut fn_ = 0usize;
            for (&t, &p) in y_true.iter().zip(y_pred) {
                match (t == c, p == c) {
                    (true, true) => tp += 1,
                    (false, true) => fp += 1,
                    (true, false) => fn_ += 1,
                    (false, false) => {}
                }
            }
            let support = tp + fn_;
            let denom = 2 * tp + fp + fn_;
            let f1 = if denom == 0 { 0.0 } else { 2.0 * tp as f64 / denom as f64 };
            f1 * support as f64 / n as f64
        })
        .sum()
}

// =============================================================================
// Regression
// =============================================================================

/// Coefficient of determination.
///
/// For constant targets: `1.0` on a perfect fit, `0.0` otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    debug_assert_eq!(y_true.len(), y_pred.len());
    let n = y_true.len();
    if n == 0 {
        return 0.0;
    }
    let mean = y_true.iter().sum::<f64>() / n as f64;
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        if ss_res == 0.0 { 1.0 } else { 0.0 }
    } else {
        1.0 - ss_res / ss_tot
    }
}

// =============================================================================
// Ordinal regression
// =============================================================================

/// Error measure for ordinal predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum OrdinalErrorType {
    /// Mean zero-one error.
    Mze,
    /// Mean absolute bin distance.
    Mae,
    /// Mean absolute bin distance, macro-averaged over bins.
    #[default]
    Mmae,
}

impl OrdinalErrorType {
    pub const VALID_NAMES: &'static str = "mze, mae, mmae";

    /// Score in `[0, 1]`: `1 − error`, with absolute errors scaled by `k − 1`.
    ///
    /// # Arguments
    ///
    /// * `y_true` - True bins
    /// * `y_pred` - Predicted bins
    /// * `n_bins` - Number of bins `k`
    pub fn score(self, y_true: &[usize], y_pred: &[usize], n_bins: usize) -> f64 {
        debug_assert_eq!(y_true.len(), y_pred.len());
        let n = y_true.len();
        if n == 0 {
            return 0.0;
        }
        let max_dist = n_bins.saturating_sub(1).max(1) as f64;
        let dist = |t: usize, p: usize| t.abs_diff(p) as f64;

        match self {
            OrdinalErrorType::Mze => {
                let wrong = y_true.iter().zip(y_pred).filter(|(t, p)| t != p).count();
                1.0 - wrong as f64 / n as f64
            }
            OrdinalErrorType::Mae => {
                let total: f64 = y_true.iter().zip(y_pred).map(|(&t, &p)| dist(t, p)).sum();
                1.0 - (total / n as f64) / max_dist
            }
            OrdinalErrorType::Mmae => {
                let mut sums = vec![0.0; n_bins];
                let mut counts = vec![0usize; n_bins];
                for (&t, &p) in y_true.iter().zip(y_pred) {
                    if t < n_bins {
                        sums[t] += dist(t, p);
                        counts[t] += 1;
                    }
                }
                let per_bin: Vec<f64> = sums
                    .iter()
                    .zip(&counts)
                    .filter(|(_, c)| **c > 0)
                    .map(|(s, &c)| s / c as f64)
                    .collect();
                let error = per_bin.iter().sum::<f64>() / per_bin.len().max(1) as f64;
                1.0 - error / max_dist
            }
        }
    }
}

impl fmt::Display for OrdinalErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrdinalErrorType::Mze => f.write_str("mze"),
            OrdinalErrorType::Mae => f.write_str("mae"),
            OrdinalErrorType::Mmae => f.write_str("mmae"),
        }
    }
}

impl FromStr for OrdinalErrorType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mze" => Ok(OrdinalErrorType::Mze),
            "mae" => Ok(OrdinalErrorType::Mae),
            "mmae" => Ok(OrdinalErrorType::Mmae),
            _ => Err(ConfigError::UnknownOrdinalError {
                name: s.to_string(),
                valid: Self::VALID_NAMES,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn f1_perfect_and_weighted() {
        assert_abs_diff_eq!(weighted_f1(&[1.0, -1.0, 1.0], &[1.0, -1.0, 1.0]), 1.0);

        // class 1: tp=1, fn=1, fp=0 -> f1 = 2/3, support 2
        // class -1: tp=2, fp=1, fn=0 -> f1 = 4/5, support 2
        let y_true = [1.0, 1.0, -1.0, -1.0];
        let y_pred = [1.0, -1.0, -1.0, -1.0];
        assert_abs_diff_eq!(
            weighted_f1(&y_true, &y_pred),
            0.5 * (2.0 / 3.0) + 0.5 * 0.8,
            epsilon = 1e-12
        );
    }

    #[test]
    fn r2_cases() {
        assert_abs_diff_eq!(r2_score(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 1.0);
        assert_abs_diff_eq!(r2_score(&[1.0, 2.0, 3.0], &[2.0, 2.0, 2.0]), 0.0);
        assert_abs_diff_eq!(r2_score(&[5.0, 5.0], &[5.0, 5.0]), 1.0);
        assert_abs_diff_eq!(r2_score(&[5.0, 5.0], &[4.0, 5.0]), 0.0);
    }

    #[test]
    fn ordinal_scores() {
        let y_true = [0, 0, 1, 2];
        let y_pred = [0, 1, 1, 0];
        assert_abs_diff_eq!(OrdinalErrorType::Mze.score(&y_true, &y_pred, 3), 0.5);
        // mean distance 3/4, scaled by 2
        assert_abs_diff_eq!(OrdinalErrorType::Mae.score(&y_true, &y_pred, 3), 1.0 - 0.375);
        // per bin: 0.5, 0, 2 -> mean 2.5/3, scaled by 2
        assert_abs_diff_eq!(
            OrdinalErrorType::Mmae.score(&y_true, &y_pred, 3),
            1.0 - (2.5 / 3.0) / 2.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn parse_error_types() {
        assert_eq!("MMAE".parse::<OrdinalErrorType>().unwrap(), OrdinalErrorType::Mmae);
        assert_eq!("mze".parse::<OrdinalErrorType>().unwrap(), OrdinalErrorType::Mze);
        let err = "rmse".parse::<OrdinalErrorType>().unwrap_err();
        assert!(err.to_string().contains("mze, mae, mmae"));
    }
}
