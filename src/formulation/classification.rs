//! L1 hinge-loss classification.

use std::sync::Arc;

use ndarray::Array1;

use crate::lp::Comparison;

use super::FormulationBuilder;
use super::layout::BuildContext;

/// Binary classification with labels encoded to `±1`.
///
/// Rows: `y_i·(w·x_i − b) + ξ_i ≥ 1` for every sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationFormulation {
    labels: Arc<Array1<f64>>,
}

impl ClassificationFormulation {
    /// # Arguments
    ///
    /// * `labels` - Encoded labels, each `-1.0` or `+1.0`
    pub fn new(labels: Array1<f64>) -> Self {
        Self {
            labels: Arc::new(labels),
        }
    }

    pub fn labels(&self) -> &Array1<f64> {
        &self.labels
    }
}

impl FormulationBuilder for ClassificationFormulation {
    fn name(&self) -> &'static str {
        "classification"
    }

    fn add_rows(&self, ctx: &mut BuildContext<'_>) {
        let bias = ctx.add_bias();
        for i in 0..ctx.n_samples() {
            let y = self.labels[i];
            let mut row = ctx.margin(i, y);
            row.push((bias, -y));
            row.extend(ctx.slack(i, 0));
            ctx.add_row(row, Comparison::Ge, 1.0);
        }
    }
}
