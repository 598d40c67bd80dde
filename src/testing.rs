//! Testing utilities for fri.
//!
//! Assertion helpers for relevance intervals and the synthetic dataset
//! generators in [`data`]. Used by unit tests, integration tests and benches.
//!
//! ```
//! use fri::testing::assert_intervals_approx_eq;
//! use ndarray::array;
//!
//! let actual = array![[0.5, 1.0], [0.0, 0.25]];
//! assert_intervals_approx_eq(actual.view(), &[[0.5, 1.0], [0.0, 0.25]], 1e-9, "intervals");
//! ```

pub mod data;

use ndarray::ArrayView2;

// =============================================================================
// Constants
// =============================================================================

/// Default tolerance for comparing bounds of O(1) magnitude.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

// =============================================================================
// Interval Assertions
// =============================================================================

/// Assert that `[n_features, 2]` intervals match `expected` row by row.
///
/// # Panics
///
/// Panics with a row-level diff if shapes differ or any bound differs by more
/// than `tolerance`. NaN only matches NaN.
pub fn assert_intervals_approx_eq(
    actual: ArrayView2<'_, f64>,
    expected: &[[f64; 2]],
    tolerance: f64,
    context: &str,
) {
    assert_eq!(
        actual.dim(),
        (expected.len(), 2),
        "{context}: shape mismatch - got {:?}, expected ({}, 2)",
        actual.dim(),
        expected.len()
    );

    let diff = diff_intervals(actual, expected, tolerance);
    if !diff.is_empty() {
        panic!("{context}: intervals differ (tolerance {tolerance:.0e})\n{diff}");
    }
}

fn bound_matches(actual: f64, expected: f64, tolerance: f64) -> bool {
    if expected.is_nan() {
        actual.is_nan()
    } else {
        (actual - expected).abs() <= tolerance
    }
}

/// Git-style diff: `-` for expected, `+` for actual, only differing rows.
fn diff_intervals(actual: ArrayView2<'_, f64>, expected: &[[f64; 2]], tolerance: f64) -> String {
    let mut result = String::new();
    for (i, (row, exp)) in actual.rows().into_iter().zip(expected).enumerate() {
        let matches = bound_matches(row[0], exp[0], tolerance)
            && bound_matches(row[1], exp[1], tolerance);
        if !matches {
            result.push_str(&format!("[{i:3}] - [{:>10.6}, {:>10.6}]  (expected)\n", exp[0], exp[1]));
            result.push_str(&format!("      + [{:>10.6}, {:>10.6}]  (actual)\n", row[0], row[1]));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn equal_intervals_pass() {
        let a = array![[0.0, 1.0], [f64::NAN, f64::NAN]];
        assert_intervals_approx_eq(a.view(), &[[0.0, 1.0], [f64::NAN, f64::NAN]], 1e-9, "eq");
    }

    #[test]
    #[should_panic(expected = "intervals differ")]
    fn differing_intervals_panic() {
        let a = array![[0.0, 1.0]];
        assert_intervals_approx_eq(a.view(), &[[0.0, 0.5]], 1e-9, "ne");
    }

    #[test]
    fn diff_lists_only_differing_rows() {
        let a = array![[0.0, 1.0], [0.2, 0.3]];
        let diff = diff_intervals(a.view(), &[[0.0, 1.0], [0.2, 0.4]], 1e-9);
        assert!(diff.contains("[  1]"));
        assert!(!diff.contains("[  0]"));
    }
}
