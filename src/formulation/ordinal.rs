//! L1 ordinal regression with ordered thresholds.

use std::sync::Arc;

use crate::data::OrdinalLabels;
use crate::lp::Comparison;

use super::FormulationBuilder;
use super::layout::BuildContext;

/// Ordinal regression over `k` ordered bins with thresholds `b_0 ≤ … ≤ b_{k−2}`.
///
/// A sample in bin `c` must score below `b_c − 1` (unless `c` is the top bin)
/// and above `b_{c−1} + 1` (unless `c` is the bottom bin), each side with its
/// own slack.
#[derive(Debug, Clone, PartialEq)]
pub struct OrdinalFormulation {
    labels: Arc<OrdinalLabels>,
}

impl OrdinalFormulation {
    pub fn new(labels: OrdinalLabels) -> Self {
        Self {
            labels: Arc::new(labels),
        }
    }

    pub fn labels(&self) -> &OrdinalLabels {
        &self.labels
    }

    pub fn n_bins(&self) -> usize {
        self.labels.n_bins
    }
}

impl FormulationBuilder for OrdinalFormulation {
    fn name(&self) -> &'static str {
        "ordinal_regression"
    }

    fn add_rows(&self, ctx: &mut BuildContext<'_>) {
        let k = self.labels.n_bins;
        let thresholds: Vec<_> = (0..k.saturating_sub(1)).map(|_| ctx.add_bias()).collect();
        for pair in thresholds.windows(2) {
            ctx.add_row(vec![(pair[0], 1.0), (pair[1], -1.0)], Comparison::Le, 0.0);
        }

        for i in 0..ctx.n_samples() {
            let c = self.labels.bins[i];
            if c + 1 < k {
                // w·x_i − χ_i − b_c ≤ −1
                let mut row = ctx.margin(i, 1.0);
                row.push((thresholds[c], -1.0));
                row.extend(ctx.slack(i, 0).into_iter().map(|(v, coef)| (v, -coef)));
                ctx.add_row(row, Comparison::Le, -1.0);
            }
            if c >= 1 {
                // w·x_i + ξ_i − b_{c−1} ≥ 1
                let mut row = ctx.margin(i, 1.0);
                row.push((thresholds[c - 1], -1.0));
                row.extend(ctx.slack(i, 1));
                ctx.add_row(row, Comparison::Ge, 1.0);
            }
        }
    }
}
