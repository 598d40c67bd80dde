//! L1 / loss budgets and their relaxation ladder.

use super::Block;

/// Widening applied to every budget of a candidate: `b·(1 + relative) + absolute`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Relaxation {
    pub relative: f64,
    pub absolute: f64,
}

impl Relaxation {
    /// No widening.
    pub const EXACT: Relaxation = Relaxation {
        relative: 0.0,
        absolute: 0.0,
    };

    pub const fn new(relative: f64, absolute: f64) -> Self {
        Self { relative, absolute }
    }

    /// The candidate ladder tried by default: exact, then two widenings.
    pub fn default_ladder() -> Vec<Relaxation> {
        vec![
            Relaxation::EXACT,
            Relaxation::new(1e-6, 1e-8),
            Relaxation::new(1e-4, 1e-6),
        ]
    }

    #[inline]
    pub fn apply(&self, budget: f64) -> f64 {
        budget * (1.0 + self.relative) + self.absolute
    }

    pub fn is_valid(&self) -> bool {
        self.relative.is_finite()
            && self.absolute.is_finite()
            && self.relative >= 0.0
            && self.absolute >= 0.0
    }
}

impl Default for Relaxation {
    fn default() -> Self {
        Self::EXACT
    }
}

/// Budgets of the near-optimal region.
///
/// Every bound program constrains `‖w‖₁ ≤ l1` and `loss ≤ loss`; LUPI programs
/// additionally constrain `‖w*‖₁ ≤ privileged_l1`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Budgets {
    pub l1: f64,
    pub loss: f64,
    pub privileged_l1: Option<f64>,
}

impl Budgets {
    /// Budgets from the baseline's reference values.
    ///
    /// # Arguments
    ///
    /// * `l1_ref` - L1 norm of the baseline coefficients
    /// * `loss_ref` - Loss of the baseline
    /// * `privileged_l1_ref` - L1 norm of the baseline's privileged coefficients (LUPI)
    /// * `w_l1_slack` - Relative slack on the L1 norms
    /// * `loss_slack` - Relative slack on the loss
    pub fn from_reference(
        l1_ref: f64,
        loss_ref: f64,
        privileged_l1_ref: Option<f64>,
        w_l1_slack: f64,
        loss_slack: f64,
    ) -> Self {
        Self {
            l1: (1.0 + w_l1_slack) * l1_ref,
            loss: (1.0 + loss_slack) * loss_ref,
            privileged_l1: privileged_l1_ref.map(|r| (1.0 + w_l1_slack) * r),
        }
    }

    /// Budgets widened by `relaxation`.
    pub fn relaxed(&self, relaxation: &Relaxation) -> Self {
        Self {
            l1: relaxation.apply(self.l1),
            loss: relaxation.apply(self.loss),
            privileged_l1: self.privileged_l1.map(|b| relaxation.apply(b)),
        }
    }

    /// L1 budget of a feature block. A missing privileged budget is unbounded.
    pub fn block_l1(&self, block: Block) -> f64 {
        match block {
            Block::Regular => self.l1,
            Block::Privileged => self.privileged_l1.unwrap_or(f64::INFINITY),
        }
    }
}
