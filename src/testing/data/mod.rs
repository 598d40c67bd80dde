//! Synthetic datasets with known relevance structure.
//!
//! Columns are laid out in a fixed order so tests can name them:
//!
//! 1. `n_strong` strongly relevant features
//! 2. `n_redundant` redundant features, in pairs; both members of a pair are
//!    scaled copies of one hidden informative signal, so each is weakly relevant
//! 3. `n_repeated` copies of earlier informative columns
//! 4. dummy features filling up to `n_features`

use ndarray::{Array1, Array2};
use rand::prelude::*;

use crate::data::Dataset;
use crate::error::FriResult;

// =============================================================================
// Parameters
// =============================================================================

/// Errors for inconsistent generation parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("at least one sample is needed")]
    NoSamples,

    #[error("at least one feature is needed")]
    NoFeatures,

    #[error("flip_y must be in [0, 1), got {0}")]
    InvalidFlip(f64),

    #[error("noise must be finite and non-negative, got {0}")]
    InvalidNoise(f64),

    #[error("n_redundant must be even, got {0}")]
    OddRedundant(usize),

    #[error(
        "inconsistent number of features: {n_strong} strong + {n_redundant} redundant + \
         {n_repeated} repeated exceeds {n_features}"
    )]
    InconsistentFeatures {
        n_strong: usize,
        n_redundant: usize,
        n_repeated: usize,
        n_features: usize,
    },

    #[error("no informative features: n_strong + n_redundant must be at least 1")]
    NoInformative,

    #[error("class_sep must be finite and non-negative, got {0}")]
    InvalidClassSep(f64),

    #[error("no sample found at distance {0} from the separating hyperplane")]
    SeparationUnreachable(f64),

    #[error("ordinal data needs at least 2 bins and one sample per bin, got {n_bins} bins for {n_samples} samples")]
    InvalidBins { n_bins: usize, n_samples: usize },
}

/// Shape and noise of a generated dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenParams {
    /// Number of samples. Default: 100.
    pub n_samples: usize,
    /// Total number of features. Default: 2.
    pub n_features: usize,
    /// Strongly relevant features. Default: 1.
    pub n_strong: usize,
    /// Redundant (weakly relevant) features, must be even. Default: 0.
    pub n_redundant: usize,
    /// Copies of informative columns. Default: 0.
    pub n_repeated: usize,
    /// Classification: dummy feature scale. Regression: target noise std. Default: 1.0.
    pub noise: f64,
    /// Fraction of flipped classification labels. Default: 0.0.
    pub flip_y: f64,
    pub seed: u64,
}

impl Default for GenParams {
    fn default() -> Self {
        Self {
            n_samples: 100,
            n_features: 2,
            n_strong: 1,
            n_redundant: 0,
            n_repeated: 0,
            noise: 1.0,
            flip_y: 0.0,
            seed: 42,
        }
    }
}

impl GenParams {
    /// Validate the parameters.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.n_samples == 0 {
            return Err(GenerationError::NoSamples);
        }
        if self.n_features == 0 {
            return Err(GenerationError::NoFeatures);
        }
        if !(0.0..1.0).contains(&self.flip_y) {
            return Err(GenerationError::InvalidFlip(self.flip_y));
        }
        if !self.noise.is_finite() || self.noise < 0.0 {
            return Err(GenerationError::InvalidNoise(self.noise));
        }
        if self.n_redundant % 2 != 0 {
            return Err(GenerationError::OddRedundant(self.n_redundant));
        }
        if self.n_strong + self.n_redundant + self.n_repeated > self.n_features {
            return Err(GenerationError::InconsistentFeatures {
                n_strong: self.n_strong,
                n_redundant: self.n_redundant,
                n_repeated: self.n_repeated,
                n_features: self.n_features,
            });
        }
        if self.n_strong + self.n_redundant == 0 {
            return Err(GenerationError::NoInformative);
        }
        Ok(())
    }

    /// Hidden informative signals: strong features plus one per redundant pair.
    fn n_signals(&self) -> usize {
        self.n_strong + self.n_redundant / 2
    }
}

// =============================================================================
// Generators
// =============================================================================

/// Binary classification data from a random separating hyperplane.
///
/// Signals are uniform in `[-10, 10]`; samples closer than `class_sep` to the
/// hyperplane are redrawn. Labels are `0.0` / `1.0`.
///
/// # Errors
///
/// [`GenerationError`] (wrapped) on invalid parameters.
pub fn gen_classification_data(params: &GenParams, class_sep: f64) -> FriResult<Dataset> {
    params.validate()?;
    if !class_sep.is_finite() || class_sep < 0.0 {
        return Err(GenerationError::InvalidClassSep(class_sep).into());
    }
    let mut rng = StdRng::seed_from_u64(params.seed);
    let k = params.n_signals();

    let normal: Vec<f64> = (0..k)
        .map(|_| {
            let magnitude = 0.2 + 0.8 * rng.r#gen::<f64>();
            if rng.r#gen::<bool>() { magnitude } else { -magnitude }
        })
        .collect();
    let norm = normal.iter().map(|v| v * v).sum::<f64>().sqrt();

    let mut signals = Array2::zeros((params.n_samples, k));
    let mut y = Array1::zeros(params.n_samples);
    for i in 0..params.n_samples {
        let mut found = false;
        for _ in 0..MAX_REDRAWS {
            let point: Vec<f64> = (0..k).map(|_| rng.r#gen::<f64>() * 20.0 - 10.0).collect();
            let distance = point.iter().zip(&normal).map(|(x, n)| x * n).sum::<f64>() / norm;
            if distance.abs() >= class_sep {
                for (j, v) in point.into_iter().enumerate() {
                    signals[[i, j]] = v;
                }
                y[i] = if distance > 0.0 { 1.0 } else { 0.0 };
                found = true;
                break;
            }
        }
        if !found {
            return Err(GenerationError::SeparationUnreachable(class_sep).into());
        }
    }

    let n_flip = (params.flip_y * params.n_samples as f64).round() as usize;
    for i in rand::seq::index::sample(&mut rng, params.n_samples, n_flip) {
        y[i] = 1.0 - y[i];
    }

    let x = fill_feature_space(params, &signals, params.noise, &mut rng);
    Ok(Dataset::new(x, y)?)
}

/// Regression data: `y = signals·coef + noise·N(0, 1)`.
///
/// Signals are uniform in `[-2, 2]`, coefficients have magnitude in
/// `[0.5, 1.5]` with random sign, dummy features are uniform in `[-1, 1]`.
pub fn gen_regression_data(params: &GenParams) -> FriResult<Dataset> {
    params.validate()?;
    let mut rng = StdRng::seed_from_u64(params.seed);
    let (signals, y) = linear_signals(params, &mut rng);
    let x = fill_feature_space(params, &signals, 2.0, &mut rng);
    Ok(Dataset::new(x, y)?)
}

/// Ordinal data: regression targets cut into `n_bins` equal-frequency bins.
///
/// Labels are the bin indices `0..n_bins` as `f64`.
pub fn gen_ordinal_regression_data(params: &GenParams, n_bins: usize) -> FriResult<Dataset> {
    params.validate()?;
    if n_bins < 2 || params.n_samples < n_bins {
        return Err(GenerationError::InvalidBins {
            n_bins,
            n_samples: params.n_samples,
        }
        .into());
    }
    let mut rng = StdRng::seed_from_u64(params.seed);
    let (signals, y) = linear_signals(params, &mut rng);

    let mut order: Vec<usize> = (0..params.n_samples).collect();
    order.sort_by(|&a, &b| y[a].total_cmp(&y[b]));
    let mut bins = Array1::zeros(params.n_samples);
    for (rank, &i) in order.iter().enumerate() {
        bins[i] = (rank * n_bins / params.n_samples) as f64;
    }

    let x = fill_feature_space(params, &signals, 2.0, &mut rng);
    Ok(Dataset::new(x, bins)?)
}

// =============================================================================
// Helpers
// =============================================================================

const MAX_REDRAWS: usize = 10_000;

fn linear_signals(params: &GenParams, rng: &mut StdRng) -> (Array2<f64>, Array1<f64>) {
    let k = params.n_signals();
    let coef: Vec<f64> = (0..k)
        .map(|_| {
            let magnitude = 0.5 + rng.r#gen::<f64>();
            if rng.r#gen::<bool>() { magnitude } else { -magnitude }
        })
        .collect();
    let signals = Array2::from_shape_fn((params.n_samples, k), |_| rng.r#gen::<f64>() * 4.0 - 2.0);
    let y = Array1::from_shape_fn(params.n_samples, |i| {
        let clean: f64 = (0..k).map(|j| signals[[i, j]] * coef[j]).sum();
        clean + params.noise * standard_normal(rng)
    });
    (signals, y)
}

/// Lay out strong, redundant, repeated and dummy columns from the signals.
///
/// Dummies are uniform in `[-dummy_scale / 2, dummy_scale / 2]`.
fn fill_feature_space(
    params: &GenParams,
    signals: &Array2<f64>,
    dummy_scale: f64,
    rng: &mut StdRng,
) -> Array2<f64> {
    let n = params.n_samples;
    let mut x = Array2::zeros((n, params.n_features));

    for j in 0..params.n_strong {
        x.column_mut(j).assign(&signals.column(j));
    }

    let mut col = params.n_strong;
    for pair in 0..params.n_redundant / 2 {
        let hidden = signals.column(params.n_strong + pair);
        for _ in 0..2 {
            let magnitude = 0.5 + 0.5 * rng.r#gen::<f64>();
            let cofactor = if rng.r#gen::<bool>() { magnitude } else { -magnitude };
            x.column_mut(col).assign(&hidden.mapv(|v| v * cofactor));
            col += 1;
        }
    }

    let n_informative = col;
    for _ in 0..params.n_repeated {
        let source = rng.gen_range(0..n_informative);
        let copy = x.column(source).to_owned();
        x.column_mut(col).assign(&copy);
        col += 1;
    }

    for j in col..params.n_features {
        for i in 0..n {
            x[[i, j]] = rng.r#gen::<f64>() * dummy_scale - dummy_scale / 2.0;
        }
    }
    x
}

/// Box-Muller draw from `N(0, 1)`.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1 = 1.0 - rng.r#gen::<f64>();
    let u2 = rng.r#gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FriError;
    use rstest::rstest;

    fn params(n_features: usize, n_strong: usize, n_redundant: usize) -> GenParams {
        GenParams {
            n_samples: 50,
            n_features,
            n_strong,
            n_redundant,
            ..Default::default()
        }
    }

    #[rstest]
    #[case(GenParams { n_samples: 0, ..Default::default() }, GenerationError::NoSamples)]
    #[case(GenParams { n_features: 0, n_strong: 0, ..Default::default() }, GenerationError::NoFeatures)]
    #[case(GenParams { flip_y: 1.0, ..Default::default() }, GenerationError::InvalidFlip(1.0))]
    #[case(GenParams { n_redundant: 1, n_features: 4, ..Default::default() }, GenerationError::OddRedundant(1))]
    #[case(GenParams { n_strong: 0, ..Default::default() }, GenerationError::NoInformative)]
    fn rejects_invalid_params(#[case] params: GenParams, #[case] expected: GenerationError) {
        assert_eq!(params.validate(), Err(expected));
        assert_eq!(
            gen_regression_data(&params).unwrap_err(),
            FriError::Generation(params.validate().unwrap_err())
        );
    }

    #[test]
    fn rejects_too_many_informative_features() {
        let err = params(3, 2, 2).validate().unwrap_err();
        assert!(matches!(err, GenerationError::InconsistentFeatures { n_features: 3, .. }));
    }

    #[test]
    fn classification_respects_separation() {
        let p = params(4, 2, 0);
        let data = gen_classification_data(&p, 1.0).unwrap();
        assert_eq!(data.features().dim(), (50, 4));
        assert!(data.targets().iter().all(|&v| v == 0.0 || v == 1.0));
        assert!(data.targets().iter().any(|&v| v == 0.0));
        assert!(data.targets().iter().any(|&v| v == 1.0));
        // dummies stay in [-0.5, 0.5]
        assert!(data.features().column(3).iter().all(|v| v.abs() <= 0.5));
    }

    #[test]
    fn redundant_pairs_are_scaled_copies() {
        let p = params(4, 1, 2);
        let data = gen_regression_data(&p).unwrap();
        let x = data.features();
        let ratio = x[[0, 1]] / x[[0, 2]];
        for i in 0..p.n_samples {
            approx::assert_abs_diff_eq!(x[[i, 1]], ratio * x[[i, 2]], epsilon = 1e-9);
        }
    }

    #[test]
    fn repeated_features_copy_informative_columns() {
        let p = GenParams {
            n_repeated: 1,
            ..params(3, 1, 0)
        };
        let data = gen_regression_data(&p).unwrap();
        assert_eq!(data.features().column(1), data.features().column(0));
    }

    #[test]
    fn ordinal_bins_are_balanced() {
        let p = params(3, 2, 0);
        let data = gen_ordinal_regression_data(&p, 5).unwrap();
        for bin in 0..5 {
            let count = data.targets().iter().filter(|&&v| v == bin as f64).count();
            assert_eq!(count, 10);
        }
        assert!(gen_ordinal_regression_data(&p, 1).is_err());
    }

    #[test]
    fn same_seed_same_data() {
        let p = params(5, 2, 2);
        assert_eq!(
            gen_classification_data(&p, 0.5).unwrap(),
            gen_classification_data(&p, 0.5).unwrap()
        );
    }
}
