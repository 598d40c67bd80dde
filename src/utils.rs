//! Common utilities used across the crate.
//!
//! This module provides parallelism configuration, thread pool setup and the
//! small statistics helpers used by the aggregator.

use rayon::prelude::*;

use crate::error::FriError;

// =============================================================================
// Statistical Utilities
// =============================================================================

/// Quantile of a slice using a step function (no interpolation).
///
/// Returns the value at the point where the cumulative count first reaches
/// `alpha * n`. Returns `f64::NAN` if `values` is empty.
///
/// `scratch` is reused for the sort order so repeated calls do not allocate.
pub fn quantile(values: &[f64], alpha: f64, scratch: &mut Vec<usize>) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return values[0];
    }

    scratch.clear();
    scratch.extend(0..n);
    scratch.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let threshold = alpha.clamp(0.0, 1.0) * n as f64;
    let mut cumulative = 0.0;
    for &idx in scratch.iter() {
        cumulative += 1.0;
        if cumulative >= threshold {
            return values[idx];
        }
    }

    values[scratch[n - 1]]
}

/// Sample mean and (unbiased) standard deviation.
///
/// Returns `(NAN, NAN)` for an empty slice and a zero deviation for a single
/// value.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    if n == 1 {
        return (mean, 0.0);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    (mean, var.sqrt())
}

/// L1 norm of a sequence of values.
#[inline]
pub fn l1_norm<'a>(values: impl IntoIterator<Item = &'a f64>) -> f64 {
    values.into_iter().map(|v| v.abs()).sum()
}

// =============================================================================
// Parallelism Configuration
// =============================================================================

/// Whether parallel execution is allowed.
///
/// When `Parallel`, components may use `rayon` parallel iterators.
/// When `Sequential`, components must iterate on the calling thread.
///
/// The actual thread pool is set up by [`run_with_threads`]; components only
/// respect this flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if rayon pool has multiple threads, sequential otherwise)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Map over `iter`, in parallel when allowed. Output order matches input order.
    #[inline]
    pub fn maybe_par_map<T, B, I, F>(self, iter: I, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> B + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map(f).collect()
        } else {
            iter.into_iter().map(f).collect()
        }
    }
}

// =============================================================================
// Thread Pool Setup
// =============================================================================

/// Run a closure with the appropriate thread pool.
///
/// Thread count semantics:
/// - `0` = auto (use all available cores)
/// - `1` = sequential (no thread pool)
/// - `n > 1` = use exactly `n` threads
pub fn run_with_threads<T: Send>(
    n_threads: usize,
    f: impl FnOnce(Parallelism) -> T + Send,
) -> Result<T, FriError> {
    match Parallelism::from_threads(n_threads) {
        Parallelism::Sequential => Ok(f(Parallelism::Sequential)),
        Parallelism::Parallel => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n_threads)
                .build()
                .map_err(|e| FriError::ThreadPool(e.to_string()))?;
            Ok(pool.install(|| f(Parallelism::Parallel)))
        }
    }
}
