//! L1 epsilon-insensitive regression.

use std::sync::Arc;

use ndarray::Array1;

use crate::lp::Comparison;

use super::FormulationBuilder;
use super::layout::BuildContext;

/// Regression inside an epsilon tube.
///
/// Rows per sample: `w·x_i + b − ξ_i ≤ y_i + ε` and `w·x_i + b + ξ_i ≥ y_i − ε`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionFormulation {
    targets: Arc<Array1<f64>>,
    epsilon: f64,
}

impl RegressionFormulation {
    /// # Arguments
    ///
    /// * `targets` - Continuous targets
    /// * `epsilon` - Half-width of the insensitive tube (baseline hyperparameter)
    pub fn new(targets: Array1<f64>, epsilon: f64) -> Self {
        Self {
            targets: Arc::new(targets),
            epsilon,
        }
    }

    pub fn targets(&self) -> &Array1<f64> {
        &self.targets
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl FormulationBuilder for RegressionFormulation {
    fn name(&self) -> &'static str {
        "regression"
    }

    fn add_rows(&self, ctx: &mut BuildContext<'_>) {
        let bias = ctx.add_bias();
        for i in 0..ctx.n_samples() {
            let y = self.targets[i];
            let slack = ctx.slack(i, 0);

            let mut upper = ctx.margin(i, 1.0);
            upper.push((bias, 1.0));
            upper.extend(slack.iter().map(|&(v, c)| (v, -c)));
            ctx.add_row(upper, Comparison::Le, y + self.epsilon);

            let mut lower = ctx.margin(i, 1.0);
            lower.push((bias, 1.0));
            lower.extend(slack);
            ctx.add_row(lower, Comparison::Ge, y - self.epsilon);
        }
    }
}
