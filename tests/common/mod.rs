//! Shared datasets for integration tests.
//!
//! Every dataset pairs each signal value with two twin rows whose dummy
//! column takes opposite values, so a dummy weight can never lower the loss.

#![allow(dead_code)]

use fri::data::Dataset;
use ndarray::{Array1, Array2};

/// Signal magnitudes shared by the classification datasets.
pub const SIGNAL: [f64; 7] = [0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];

fn dataset(rows: Vec<Vec<f64>>, y: Vec<f64>) -> Dataset {
    let n_cols = rows[0].len();
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    let x = Array2::from_shape_vec((y.len(), n_cols), flat).unwrap();
    Dataset::new(x, Array1::from(y)).unwrap()
}

/// Classification: `[signal, dummy]`, label is the sign of the signal.
///
/// Baseline weight on the signal is exactly 2.
pub fn strong_signal() -> Dataset {
    let mut rows = Vec::new();
    let mut y = Vec::new();
    for &s in &SIGNAL {
        for (sign, label) in [(1.0, 1.0), (-1.0, 0.0)] {
            for dummy in [2.5, -2.5] {
                rows.push(vec![sign * s, dummy]);
                y.push(label);
            }
        }
    }
    dataset(rows, y)
}

/// Classification: `[signal, -signal, dummy]`; either copy can carry the signal.
pub fn redundant_pair() -> Dataset {
    let mut rows = Vec::new();
    let mut y = Vec::new();
    for &s in &SIGNAL {
        for (sign, label) in [(1.0, 1.0), (-1.0, 0.0)] {
            for dummy in [2.5, -2.5] {
                rows.push(vec![sign * s, -sign * s, dummy]);
                y.push(label);
            }
        }
    }
    dataset(rows, y)
}

/// Classification: `[signal, dummy, privileged]` with a constant privileged column.
pub fn with_privileged() -> Dataset {
    let mut rows = Vec::new();
    let mut y = Vec::new();
    for (k, &s) in SIGNAL.iter().enumerate() {
        for (sign, label) in [(1.0, 1.0), (-1.0, 0.0)] {
            for dummy in [2.5, -2.5] {
                rows.push(vec![sign * s, dummy, 0.1 * k as f64]);
                y.push(label);
            }
        }
    }
    dataset(rows, y)
}

/// Regression: `y = 2·x0`, `[x0, dummy]` with `x0 ∈ ±SIGNAL`.
///
/// With epsilon 0.1 the feasible weights on `x0` are `[1.95, 2.05]`.
pub fn linear_regression() -> Dataset {
    let mut rows = Vec::new();
    let mut y = Vec::new();
    for &s in &SIGNAL {
        for sign in [1.0, -1.0] {
            for dummy in [1.0, -1.0] {
                rows.push(vec![sign * s, dummy]);
                y.push(2.0 * sign * s);
            }
        }
    }
    dataset(rows, y)
}

/// Ordinal: three levels `1, 2, 3` separated by gaps of 1.5 on `x0`.
///
/// The baseline weight on `x0` is `4/3`.
pub fn ordinal_levels() -> Dataset {
    let groups = [(1.0, [0.0, 0.5]), (2.0, [2.0, 2.5]), (3.0, [4.0, 4.5])];
    let mut rows = Vec::new();
    let mut y = Vec::new();
    for (level, xs) in groups {
        for x in xs {
            for dummy in [1.0, -1.0] {
                rows.push(vec![x, dummy]);
                y.push(level);
            }
        }
    }
    dataset(rows, y)
}
