//! Shared program construction: split weights, slacks and the build context.
//!
//! Every family describes only its feasibility rows through [`BuildContext`];
//! budgets, presets and objectives are added generically on top of the
//! resulting [`ProgramLayout`].

use crate::lp::{Comparison, LinearProgram, LpSolution, Sense, VarId};

use super::design::{BlockView, Design};

/// Sparse linear expression.
pub type Terms = Vec<(VarId, f64)>;

// =============================================================================
// WeightBlock
// =============================================================================

/// Weights of one feature block, split as `w = p − q` with `p, q ≥ 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightBlock {
    pos: Vec<VarId>,
    neg: Vec<VarId>,
}

impl WeightBlock {
    pub fn new(lp: &mut LinearProgram, n: usize) -> Self {
        let pos = (0..n).map(|_| lp.add_nonneg_var()).collect();
        let neg = (0..n).map(|_| lp.add_nonneg_var()).collect();
        Self { pos, neg }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pos.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }

    /// Append `w·x_i` for row `i` of `view` to `terms`.
    pub fn push_dot(&self, view: &BlockView<'_>, i: usize, scale: f64, terms: &mut Terms) {
        for (j, v) in view.row(i) {
            terms.push((self.pos[j], scale * v));
            terms.push((self.neg[j], -scale * v));
        }
    }

    /// `w_j = p_j − q_j`.
    pub fn weight(&self, j: usize) -> Terms {
        vec![(self.pos[j], 1.0), (self.neg[j], -1.0)]
    }

    /// `|w_j|` as `p_j + q_j` (exact at optimality of a magnitude minimization).
    pub fn magnitude(&self, j: usize) -> Terms {
        vec![(self.pos[j], 1.0), (self.neg[j], 1.0)]
    }

    /// `‖w‖₁` as `Σ (p_j + q_j)`.
    pub fn l1(&self) -> Terms {
        self.pos
            .iter()
            .chain(&self.neg)
            .map(|&v| (v, 1.0))
            .collect()
    }

    /// Weight values `p − q` from a solution.
    pub fn values(&self, solution: &LpSolution) -> Vec<f64> {
        self.pos
            .iter()
            .zip(&self.neg)
            .map(|(&p, &q)| solution.value(p) - solution.value(q))
            .collect()
    }
}

// =============================================================================
// Slack sources
// =============================================================================

/// Where per-sample slacks come from.
#[derive(Debug, Clone)]
enum SlackSource {
    /// One fresh `ξ ≥ 0` variable per requested slack.
    Free,
    /// LUPI: `s_i = w*·x*_i + b* ≥ 0`, one per sample, shared by all parts.
    Privileged {
        weights: WeightBlock,
        bias: VarId,
        created: Vec<Option<Terms>>,
    },
}

// =============================================================================
// BuildContext
// =============================================================================

/// Mutable state while a family adds its feasibility rows.
#[derive(Debug)]
pub struct BuildContext<'a> {
    lp: LinearProgram,
    design: &'a Design<'a>,
    weights: WeightBlock,
    slacks: SlackSource,
    loss: Terms,
    biases: Vec<VarId>,
}

impl<'a> BuildContext<'a> {
    /// Start a program over `design`.
    ///
    /// With `lupi` set, slacks are functions of the privileged block; a design
    /// without privileged block then only gets the privileged bias.
    pub fn new(design: &'a Design<'a>, lupi: bool) -> Self {
        let mut lp = LinearProgram::new(Sense::Minimize);
        let weights = WeightBlock::new(&mut lp, design.regular.n_cols());
        let slacks = if lupi {
            let n_privileged = design.privileged.map_or(0, |p| p.n_cols());
            let weights = WeightBlock::new(&mut lp, n_privileged);
            let bias = lp.add_free_var();
            SlackSource::Privileged {
                weights,
                bias,
                created: vec![None; design.n_samples()],
            }
        } else {
            SlackSource::Free
        };
        Self {
            lp,
            design,
            weights,
            slacks,
            loss: Vec::new(),
            biases: Vec::new(),
        }
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.design.n_samples()
    }

    /// `scale · w·x_i` over the regular block.
    pub fn margin(&self, i: usize, scale: f64) -> Terms {
        let mut terms = Vec::new();
        self.weights.push_dot(&self.design.regular, i, scale, &mut terms);
        terms
    }

    /// Add a free bias / threshold variable.
    pub fn add_bias(&mut self) -> VarId {
        let bias = self.lp.add_free_var();
        self.biases.push(bias);
        bias
    }

    /// Slack of sample `i`.
    ///
    /// `part` distinguishes independent slacks of the same sample (the two
    /// sides of an ordinal sample); LUPI slacks ignore it and return the shared
    /// privileged function. Every slack enters the loss exactly once.
    pub fn slack(&mut self, i: usize, part: usize) -> Terms {
        debug_assert!(part < 2, "at most two slacks per sample");
        match &mut self.slacks {
            SlackSource::Free => {
                let xi = self.lp.add_nonneg_var();
                self.loss.push((xi, 1.0));
                vec![(xi, 1.0)]
            }
            SlackSource::Privileged {
                weights,
                bias,
                created,
            } => {
                if let Some(terms) = &created[i] {
                    return terms.clone();
                }
                let mut terms = vec![(*bias, 1.0)];
                if let Some(view) = &self.design.privileged {
                    weights.push_dot(view, i, 1.0, &mut terms);
                }
                self.lp.add_constraint(terms.clone(), Comparison::Ge, 0.0);
                self.loss.extend(terms.iter().copied());
                created[i] = Some(terms.clone());
                terms
            }
        }
    }

    pub fn add_row(&mut self, terms: Terms, cmp: Comparison, rhs: f64) {
        self.lp.add_constraint(terms, cmp, rhs);
    }

    /// Finish the feasibility part of the program.
    pub fn finish(self) -> ProgramLayout {
        let (privileged, privileged_bias) = match self.slacks {
            SlackSource::Free => (None, None),
            SlackSource::Privileged { weights, bias, .. } => (Some(weights), Some(bias)),
        };
        ProgramLayout {
            lp: self.lp,
            weights: self.weights,
            privileged,
            privileged_bias,
            biases: self.biases,
            loss: self.loss,
        }
    }
}

// =============================================================================
// ProgramLayout
// =============================================================================

/// Feasibility program of a family plus handles to its variables.
#[derive(Debug, Clone)]
pub struct ProgramLayout {
    pub lp: LinearProgram,
    /// Regular weights.
    pub weights: WeightBlock,
    /// Privileged weights (LUPI only).
    pub privileged: Option<WeightBlock>,
    /// Privileged bias (LUPI only).
    pub privileged_bias: Option<VarId>,
    /// Bias (classification, regression) or ordered thresholds (ordinal).
    pub biases: Vec<VarId>,
    /// Total loss `Σ slack`.
    pub loss: Terms,
}
