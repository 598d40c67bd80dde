//! The baseline model: the reference point of the near-optimal region.

use ndarray::{Array1, ArrayView2};

use crate::data::{BinaryLabels, OrdinalLabels};
use crate::error::{FriError, FriResult};
use crate::formulation::{Formulation, FormulationBuilder, ProblemData};
use crate::lp::{SolveStatus, Tolerances};
use crate::utils::l1_norm;

use super::score::{r2_score, weighted_f1};
use super::{OrdinalErrorType, ProblemKind};

/// Targets in the encoding the formulations consume.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EncodedTargets {
    Binary(BinaryLabels),
    Continuous(Array1<f64>),
    Ordinal(OrdinalLabels),
}

/// Hyperparameters a baseline was fitted with.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct BaselineParams {
    pub c: f64,
    pub epsilon: f64,
}

/// Fitted sparse linear model.
///
/// Biases follow the formulation conventions: classification decides on
/// `w·x − b`, regression predicts `w·x + b`, ordinal regression uses the
/// `k − 1` ascending thresholds `b_0 ≤ … ≤ b_{k−2}`.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineModel {
    problem: ProblemKind,
    coefficients: Array1<f64>,
    biases: Vec<f64>,
    privileged_coefficients: Option<Array1<f64>>,
    privileged_bias: Option<f64>,
    loss: f64,
    score: f64,
    status: SolveStatus,
    params: BaselineParams,
}

impl BaselineModel {
    /// Baseline supplied by the caller.
    ///
    /// # Arguments
    ///
    /// * `problem` - Family the model was fitted for
    /// * `coefficients` - Weights of the regular features
    /// * `biases` - One bias, or `k − 1` thresholds for ordinal regression
    /// * `loss` - Total slack of the model on the training data
    /// * `params` - Hyperparameters; `epsilon` sets the regression tube
    ///
    /// # Errors
    ///
    /// [`FriError::InvalidBaseline`] on non-finite values, a negative loss, or
    /// an empty bias list.
    pub fn new(
        problem: ProblemKind,
        coefficients: Array1<f64>,
        biases: Vec<f64>,
        loss: f64,
        params: BaselineParams,
    ) -> FriResult<Self> {
        let model = Self {
            problem,
            coefficients,
            biases,
            privileged_coefficients: None,
            privileged_bias: None,
            loss,
            score: f64::NAN,
            status: SolveStatus::Optimal,
            params,
        };
        model.validate()?;
        Ok(model)
    }

    /// Attach the privileged part of a LUPI baseline.
    pub fn with_privileged(mut self, coefficients: Array1<f64>, bias: f64) -> FriResult<Self> {
        self.privileged_coefficients = Some(coefficients);
        self.privileged_bias = Some(bias);
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> FriResult<()> {
        let invalid = |reason: &str| {
            Err(FriError::InvalidBaseline {
                reason: reason.to_string(),
            })
        };
        if self.coefficients.iter().any(|v| !v.is_finite()) {
            return invalid("coefficients must be finite");
        }
        if self.biases.is_empty() {
            return invalid("at least one bias is required");
        }
        if self.biases.iter().any(|v| !v.is_finite()) {
            return invalid("biases must be finite");
        }
        if !self.loss.is_finite() || self.loss < 0.0 {
            return invalid("loss must be finite and non-negative");
        }
        if let Some(privileged) = &self.privileged_coefficients {
            if privileged.iter().any(|v| !v.is_finite()) {
                return invalid("privileged coefficients must be finite");
            }
        }
        if self.privileged_bias.is_some_and(|b| !b.is_finite()) {
            return invalid("privileged bias must be finite");
        }
        if !self.params.c.is_finite() || !self.params.epsilon.is_finite() {
            return invalid("hyperparameters must be finite");
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn problem(&self) -> ProblemKind {
        self.problem
    }

    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    pub fn privileged_coefficients(&self) -> Option<&Array1<f64>> {
        self.privileged_coefficients.as_ref()
    }

    pub fn privileged_bias(&self) -> Option<f64> {
        self.privileged_bias
    }

    /// Reference L1 norm of the regular coefficients.
    pub fn l1_ref(&self) -> f64 {
        l1_norm(&self.coefficients)
    }

    /// Reference L1 norm of the privileged coefficients (LUPI).
    pub fn privileged_l1_ref(&self) -> Option<f64> {
        self.privileged_coefficients
            .as_ref()
            .map(|w| l1_norm(w))
    }

    /// Reference loss.
    pub fn loss(&self) -> f64 {
        self.loss
    }

    /// Training score; `NaN` for a caller-supplied model.
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn status(&self) -> SolveStatus {
        self.status
    }

    pub fn params(&self) -> BaselineParams {
        self.params
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Linear score `w·x` per row of the regular features.
    pub fn decision_function(&self, features: ArrayView2<'_, f64>) -> Array1<f64> {
        features.dot(&self.coefficients)
    }

    /// Predict in the encoded target space: `±1` for classification, the
    /// target for regression, the bin index for ordinal regression.
    pub fn predict(&self, features: ArrayView2<'_, f64>) -> Array1<f64> {
        let scores = self.decision_function(features);
        let bias = self.biases.first().copied().unwrap_or(0.0);
        match self.problem.base() {
            ProblemKind::OrdinalRegression => scores.mapv(|s| self.ordinal_bin(s) as f64),
            ProblemKind::Regression => scores.mapv(|s| s + bias),
            _ => scores.mapv(|s| if s - bias >= 0.0 { 1.0 } else { -1.0 }),
        }
    }

    /// Bin of an ordinal score: the number of thresholds below it.
    fn ordinal_bin(&self, score: f64) -> usize {
        self.biases.iter().filter(|&&b| b < score).count()
    }

    /// Score on encoded targets: weighted F1, R², or `1 − error` (ordinal).
    pub(crate) fn evaluate(
        &self,
        features: ArrayView2<'_, f64>,
        targets: &EncodedTargets,
        ordinal_error: OrdinalErrorType,
    ) -> f64 {
        let predicted = self.predict(features);
        match targets {
            EncodedTargets::Binary(labels) => {
                weighted_f1(&labels.encoded.to_vec(), &predicted.to_vec())
            }
            EncodedTargets::Continuous(y) => r2_score(&y.to_vec(), &predicted.to_vec()),
            EncodedTargets::Ordinal(labels) => {
                let bins: Vec<usize> = predicted.iter().map(|&b| b as usize).collect();
                ordinal_error.score(&labels.bins, &bins, labels.n_bins)
            }
        }
    }
}

/// Fit the baseline: `minimize ‖w‖₁ (+ ‖w*‖₁) + C·loss` over the family's rows.
///
/// # Errors
///
/// [`FriError::BaselineFailed`] when the program has no accepted solution.
pub(crate) fn fit_baseline(
    problem: ProblemKind,
    formulation: &Formulation,
    data: &ProblemData,
    targets: &EncodedTargets,
    params: BaselineParams,
    ordinal_error: OrdinalErrorType,
    tolerances: &Tolerances,
) -> FriResult<BaselineModel> {
    let solution = formulation
        .baseline_program(data, params.c)
        .solve(tolerances)
        .map_err(|status| FriError::BaselineFailed { status })?;

    let mut model = BaselineModel {
        problem,
        coefficients: solution.coefficients,
        biases: solution.biases,
        privileged_coefficients: solution.privileged_coefficients,
        privileged_bias: solution.privileged_bias,
        loss: solution.loss,
        score: f64::NAN,
        status: solution.status,
        params,
    };
    model.score = model.evaluate(data.regular(), targets, ordinal_error);
    Ok(model)
}
