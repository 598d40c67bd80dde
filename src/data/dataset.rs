//! Dataset container.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};

/// Dataset construction error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatasetError {
    /// No samples or no features.
    #[error("dataset is empty ({n_samples} samples, {n_features} features)")]
    Empty { n_samples: usize, n_features: usize },

    /// Targets do not match the number of rows.
    #[error("features have {n_samples} rows but targets have {n_targets} values")]
    ShapeMismatch { n_samples: usize, n_targets: usize },

    /// NaN or infinite feature value.
    #[error("feature value at row {row}, column {col} is not finite")]
    NonFiniteFeature { row: usize, col: usize },

    /// NaN or infinite target value.
    #[error("target at row {row} is not finite")]
    NonFiniteTarget { row: usize },

    /// More privileged columns requested than the matrix has.
    #[error("{n_privileged} privileged features requested but the dataset has {n_features} columns")]
    PrivilegedOutOfRange {
        n_privileged: usize,
        n_features: usize,
    },
}

/// Labeled dataset used by the relevance engine.
///
/// # Storage Layout
///
/// Features are stored **sample-major**: `[n_samples, n_features]`, one row
/// per sample. Each row is one constraint row of the bound programs, so this is
/// the layout the formulations read.
///
/// For LUPI problems the last `n_privileged` columns are privileged features,
/// see [`Dataset::split_privileged`].
///
/// # Example
///
/// ```
/// use fri::data::Dataset;
/// use ndarray::array;
///
/// let x = array![[1.0, 0.5], [-1.0, 0.2], [2.0, -0.1]];
/// let y = array![1.0, -1.0, 1.0];
/// let ds = Dataset::new(x, y).unwrap();
///
/// assert_eq!(ds.n_samples(), 3);
/// assert_eq!(ds.n_features(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Feature data: `[n_samples, n_features]`.
    features: Array2<f64>,

    /// Target values: length = n_samples.
    targets: Array1<f64>,
}

impl Dataset {
    /// Create a dataset, validating shapes and values.
    ///
    /// # Arguments
    ///
    /// * `features` - Feature matrix `[n_samples, n_features]`
    /// * `targets` - Target vector (length = n_samples)
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] on empty data, mismatched lengths or
    /// non-finite values.
    pub fn new(features: Array2<f64>, targets: Array1<f64>) -> Result<Self, DatasetError> {
        let (n_samples, n_features) = features.dim();
        if n_samples == 0 || n_features == 0 {
            return Err(DatasetError::Empty {
                n_samples,
                n_features,
            });
        }
        if targets.len() != n_samples {
            return Err(DatasetError::ShapeMismatch {
                n_samples,
                n_targets: targets.len(),
            });
        }
        if let Some(((row, col), _)) = features.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(DatasetError::NonFiniteFeature { row, col });
        }
        if let Some(row) = targets.iter().position(|v| !v.is_finite()) {
            return Err(DatasetError::NonFiniteTarget { row });
        }

        Ok(Self { features, targets })
    }

    /// Number of samples (rows).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    /// Number of feature columns, privileged columns included.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Feature matrix view `[n_samples, n_features]`.
    #[inline]
    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    /// Target view.
    #[inline]
    pub fn targets(&self) -> ArrayView1<'_, f64> {
        self.targets.view()
    }

    /// Split the columns into regular and privileged blocks.
    ///
    /// The last `n_privileged` columns form the privileged block. At least one
    /// regular column must remain.
    pub fn split_privileged(
        &self,
        n_privileged: usize,
    ) -> Result<(ArrayView2<'_, f64>, ArrayView2<'_, f64>), DatasetError> {
        let n_features = self.n_features();
        if n_privileged >= n_features {
            return Err(DatasetError::PrivilegedOutOfRange {
                n_privileged,
                n_features,
            });
        }
        let split = n_features - n_privileged;
        Ok((
            self.features.slice(s![.., ..split]),
            self.features.slice(s![.., split..]),
        ))
    }

    /// Consume into `(features, targets)`.
    pub fn into_parts(self) -> (Array2<f64>, Array1<f64>) {
        (self.features, self.targets)
    }
}
