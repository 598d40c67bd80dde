//! Bound and baseline programs for each problem family.
//!
//! A family only describes its feasibility rows (how samples constrain the
//! weights and which slacks make up the loss). Everything else is shared:
//!
//! - the L1 budget `Σ(p + q) ≤ B` over the split weights `w = p − q`
//! - the loss budget `Σ slack ≤ L`
//! - preset rows for fixed features
//! - the objective on the target weight
//!
//! # Available Families
//!
//! - [`ClassificationFormulation`]: L1 hinge loss on `±1` labels
//! - [`RegressionFormulation`]: L1 epsilon-insensitive loss
//! - [`OrdinalFormulation`]: ordered thresholds with per-side slacks
//! - [`LupiFormulation`]: any of the above with privileged slack functions
//!
//! [`Formulation`] wraps them in a closed enum that implements
//! [`FormulationBuilder`] by delegation.

mod budgets;
mod classification;
mod design;
mod layout;
mod lupi;
mod ordinal;
mod regression;

pub use budgets::{Budgets, Relaxation};
pub use classification::ClassificationFormulation;
pub use design::{Block, BlockView, Design, FeatureRef, ProbeFeature, ProblemData};
pub use layout::{BuildContext, ProgramLayout, Terms, WeightBlock};
pub use lupi::{LupiFormulation, LupiTask};
pub use ordinal::OrdinalFormulation;
pub use regression::RegressionFormulation;

use std::fmt;

use crate::bounds::PresetConstraints;
use crate::data::OrdinalLabels;
use crate::lp::{Comparison, LinearProgram, LpSolution, Sense, SolveStatus, Tolerances};

use ndarray::Array1;

// =============================================================================
// Objectives
// =============================================================================

/// Which end of a relevance interval a problem computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum BoundDirection {
    Lower,
    Upper,
}

impl fmt::Display for BoundDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundDirection::Lower => f.write_str("lower"),
            BoundDirection::Upper => f.write_str("upper"),
        }
    }
}

/// Sign of a maximized weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    #[inline]
    pub fn factor(self) -> f64 {
        match self {
            Sign::Positive => 1.0,
            Sign::Negative => -1.0,
        }
    }
}

/// Objective of one bound candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundObjective {
    /// `minimize |w_f|`.
    MinimizeMagnitude,
    /// `maximize ±w_f`.
    MaximizeSigned(Sign),
}

impl BoundObjective {
    /// Candidates whose best accepted value is the bound of `direction`.
    pub fn candidates(direction: BoundDirection) -> &'static [BoundObjective] {
        match direction {
            BoundDirection::Lower => &[BoundObjective::MinimizeMagnitude],
            BoundDirection::Upper => &[
                BoundObjective::MaximizeSigned(Sign::Positive),
                BoundObjective::MaximizeSigned(Sign::Negative),
            ],
        }
    }
}

/// Everything that varies between the bound programs of one fit.
#[derive(Debug, Clone, Copy)]
pub struct BoundRequest<'a> {
    /// Target weight. For a probe this is the appended probe column.
    pub target: FeatureRef,
    pub objective: BoundObjective,
    /// Budgets, already relaxed for this candidate.
    pub budgets: Budgets,
    pub presets: &'a PresetConstraints,
    pub probe: Option<&'a ProbeFeature>,
}

// =============================================================================
// FormulationBuilder
// =============================================================================

/// A problem family.
///
/// Implementors only add feasibility rows; [`build`](Self::build) and
/// [`baseline_program`](Self::baseline_program) assemble complete programs.
pub trait FormulationBuilder: Send + Sync {
    /// Name of the family (for logging).
    fn name(&self) -> &'static str;

    /// Whether slacks come from the privileged block.
    fn is_lupi(&self) -> bool {
        false
    }

    /// Add the family's biases, slacks and per-sample rows.
    fn add_rows(&self, ctx: &mut BuildContext<'_>);

    /// Feasibility program over `data` (plus an optional probe column).
    fn layout(&self, data: &ProblemData, probe: Option<&ProbeFeature>) -> ProgramLayout {
        let design = data.design(probe);
        let mut ctx = BuildContext::new(&design, self.is_lupi());
        self.add_rows(&mut ctx);
        ctx.finish()
    }

    /// Complete bound program for one candidate.
    fn build(&self, data: &ProblemData, request: &BoundRequest<'_>) -> LinearProgram {
        let layout = self.layout(data, request.probe);
        bound_program(layout, request)
    }

    /// Baseline program: `minimize ‖w‖₁ (+ ‖w*‖₁) + C·loss`.
    fn baseline_program(&self, data: &ProblemData, c: f64) -> BaselineProgram {
        let mut layout = self.layout(data, None);
        let lp = &mut layout.lp;
        lp.set_sense(Sense::Minimize);
        lp.clear_objective();
        for (var, coef) in layout.weights.l1() {
            lp.add_objective(var, coef);
        }
        if let Some(privileged) = &layout.privileged {
            for (var, coef) in privileged.l1() {
                lp.add_objective(var, coef);
            }
        }
        for &(var, coef) in &layout.loss {
            lp.add_objective(var, c * coef);
        }
        BaselineProgram { layout }
    }
}

/// Add budgets, presets and the objective to a feasibility layout.
fn bound_program(layout: ProgramLayout, request: &BoundRequest<'_>) -> LinearProgram {
    let ProgramLayout {
        mut lp,
        weights,
        privileged,
        loss,
        ..
    } = layout;
    let budgets = &request.budgets;

    lp.add_constraint(weights.l1(), Comparison::Le, budgets.l1);
    if let (Some(privileged), Some(budget)) = (&privileged, budgets.privileged_l1) {
        lp.add_constraint(privileged.l1(), Comparison::Le, budget);
    }
    lp.add_constraint(loss, Comparison::Le, budgets.loss);

    for (feature, range) in request.presets.iter() {
        if feature == request.target {
            continue;
        }
        let Some(block) = block_weights(&weights, privileged.as_ref(), feature.block) else {
            continue;
        };
        if feature.index >= block.len() {
            continue;
        }
        let (low, high) = range.weight_bounds();
        lp.add_constraint(block.weight(feature.index), Comparison::Ge, low);
        lp.add_constraint(block.weight(feature.index), Comparison::Le, high);
    }

    lp.clear_objective();
    let target = block_weights(&weights, privileged.as_ref(), request.target.block)
        .filter(|b| request.target.index < b.len());
    match target {
        Some(block) => {
            let j = request.target.index;
            let (sense, terms) = match request.objective {
                BoundObjective::MinimizeMagnitude => (Sense::Minimize, block.magnitude(j)),
                BoundObjective::MaximizeSigned(sign) => (
                    Sense::Maximize,
                    block
                        .weight(j)
                        .into_iter()
                        .map(|(v, c)| (v, sign.factor() * c))
                        .collect(),
                ),
            };
            lp.set_sense(sense);
            for (var, coef) in terms {
                lp.add_objective(var, coef);
            }
        }
        // Target outside the design: report as infeasible.
        None => lp.add_constraint(Vec::new(), Comparison::Ge, 1.0),
    }
    lp
}

fn block_weights<'w>(
    regular: &'w WeightBlock,
    privileged: Option<&'w WeightBlock>,
    block: Block,
) -> Option<&'w WeightBlock> {
    match block {
        Block::Regular => Some(regular),
        Block::Privileged => privileged,
    }
}

// =============================================================================
// Baseline program
// =============================================================================

/// Baseline program with handles for reading back the fitted model.
#[derive(Debug, Clone)]
pub struct BaselineProgram {
    layout: ProgramLayout,
}

/// Fitted baseline quantities.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineSolution {
    pub status: SolveStatus,
    pub coefficients: Array1<f64>,
    pub biases: Vec<f64>,
    pub privileged_coefficients: Option<Array1<f64>>,
    pub privileged_bias: Option<f64>,
    /// `Σ slack` at the solution.
    pub loss: f64,
}

impl BaselineProgram {
    pub fn program(&self) -> &LinearProgram {
        &self.layout.lp
    }

    /// Solve and read back the model, or return the failure status.
    pub fn solve(&self, tolerances: &Tolerances) -> Result<BaselineSolution, SolveStatus> {
        let solution = self.layout.lp.solve(tolerances);
        if !solution.status.is_accepted() {
            return Err(solution.status);
        }
        Ok(self.extract(&solution))
    }

    fn extract(&self, solution: &LpSolution) -> BaselineSolution {
        let layout = &self.layout;
        BaselineSolution {
            status: solution.status,
            coefficients: Array1::from(layout.weights.values(solution)),
            biases: layout.biases.iter().map(|&b| solution.value(b)).collect(),
            privileged_coefficients: layout
                .privileged
                .as_ref()
                .map(|p| Array1::from(p.values(solution))),
            privileged_bias: layout.privileged_bias.map(|b| solution.value(b)),
            loss: LinearProgram::evaluate(&layout.loss, &solution.values).max(0.0),
        }
    }
}

// =============================================================================
// Formulation Enum
// =============================================================================

/// Closed set of problem families.
///
/// Implements [`FormulationBuilder`] by delegating to the wrapped family.
#[derive(Debug, Clone, PartialEq)]
pub enum Formulation {
    Classification(ClassificationFormulation),
    Regression(RegressionFormulation),
    Ordinal(OrdinalFormulation),
    Lupi(LupiFormulation),
}

impl Formulation {
    /// Classification on `±1` labels.
    pub fn classification(labels: Array1<f64>) -> Self {
        Self::Classification(ClassificationFormulation::new(labels))
    }

    /// Epsilon-insensitive regression.
    pub fn regression(targets: Array1<f64>, epsilon: f64) -> Self {
        Self::Regression(RegressionFormulation::new(targets, epsilon))
    }

    /// Ordinal regression over encoded bins.
    pub fn ordinal(labels: OrdinalLabels) -> Self {
        Self::Ordinal(OrdinalFormulation::new(labels))
    }

    /// LUPI variant of a base task.
    pub fn lupi(task: LupiTask) -> Self {
        Self::Lupi(LupiFormulation::new(task))
    }
}

impl FormulationBuilder for Formulation {
    fn name(&self) -> &'static str {
        match self {
            Self::Classification(inner) => inner.name(),
            Self::Regression(inner) => inner.name(),
            Self::Ordinal(inner) => inner.name(),
            Self::Lupi(inner) => inner.name(),
        }
    }

    fn is_lupi(&self) -> bool {
        match self {
            Self::Classification(inner) => inner.is_lupi(),
            Self::Regression(inner) => inner.is_lupi(),
            Self::Ordinal(inner) => inner.is_lupi(),
            Self::Lupi(inner) => inner.is_lupi(),
        }
    }

    fn add_rows(&self, ctx: &mut BuildContext<'_>) {
        match self {
            Self::Classification(inner) => inner.add_rows(ctx),
            Self::Regression(inner) => inner.add_rows(ctx),
            Self::Ordinal(inner) => inner.add_rows(ctx),
            Self::Lupi(inner) => inner.add_rows(ctx),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::{PresetConstraints, PresetRange};
    use crate::data::encode_ordinal;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, array};

    fn solve_bound(
        formulation: &Formulation,
        data: &ProblemData,
        target: FeatureRef,
        objective: BoundObjective,
        budgets: Budgets,
        presets: &PresetConstraints,
    ) -> LpSolution {
        let request = BoundRequest {
            target,
            objective,
            budgets,
            presets,
            probe: None,
        };
        formulation.build(data, &request).solve(&Tolerances::default())
    }

    /// Separable data on one signal column plus a zero column.
    fn separable() -> (ProblemData, Formulation) {
        let x = array![[1.0, 0.0], [2.0, 0.0], [-1.0, 0.0], [-2.0, 0.0]];
        let y = array![1.0, 1.0, -1.0, -1.0];
        (ProblemData::new(x, None), Formulation::classification(y))
    }

    #[test]
    fn classification_baseline_is_sparse() {
        let (data, formulation) = separable();
        let fit = formulation
            .baseline_program(&data, 1.0)
            .solve(&Tolerances::default())
            .unwrap();
        // Margin 1 at |x| = 1 needs w_0 = 1, b = 0.
        assert_abs_diff_eq!(fit.coefficients[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(fit.coefficients[1], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(fit.biases[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(fit.loss, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn classification_bounds_of_signal() {
        let (data, formulation) = separable();
        let budgets = Budgets {
            l1: 1.5,
            loss: 0.0,
            privileged_l1: None,
        };
        let presets = PresetConstraints::empty();
        let lower = solve_bound(
            &formulation,
            &data,
            FeatureRef::regular(0),
            BoundObjective::MinimizeMagnitude,
            budgets,
            &presets,
        );
        assert!(lower.status.is_accepted());
        assert_abs_diff_eq!(lower.objective, 1.0, epsilon = 1e-6);

        let upper = solve_bound(
            &formulation,
            &data,
            FeatureRef::regular(0),
            BoundObjective::MaximizeSigned(Sign::Positive),
            budgets,
            &presets,
        );
        assert!(upper.status.is_accepted());
        assert_abs_diff_eq!(upper.objective, 1.5, epsilon = 1e-6);

        // The zero column can absorb the remaining budget.
        let dummy = solve_bound(
            &formulation,
            &data,
            FeatureRef::regular(1),
            BoundObjective::MaximizeSigned(Sign::Negative),
            budgets,
            &presets,
        );
        assert_abs_diff_eq!(dummy.objective, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn presets_restrict_other_features() {
        // Two identical columns share the signal.
        let x = array![[1.0, 1.0], [2.0, 2.0], [-1.0, -1.0], [-2.0, -2.0]];
        let y = array![1.0, 1.0, -1.0, -1.0];
        let data = ProblemData::new(x, None);
        let formulation = Formulation::classification(y);
        let budgets = Budgets {
            l1: 1.0,
            loss: 0.0,
            privileged_l1: None,
        };

        let free = PresetConstraints::empty();
        let lower = solve_bound(
            &formulation,
            &data,
            FeatureRef::regular(0),
            BoundObjective::MinimizeMagnitude,
            budgets,
            &free,
        );
        assert_abs_diff_eq!(lower.objective, 0.0, epsilon = 1e-6);

        let mut fixed = PresetConstraints::empty();
        fixed.insert(FeatureRef::regular(1), PresetRange::new(0.0, 0.0));
        let lower = solve_bound(
            &formulation,
            &data,
            FeatureRef::regular(0),
            BoundObjective::MinimizeMagnitude,
            budgets,
            &fixed,
        );
        assert_abs_diff_eq!(lower.objective, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn regression_tube() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![2.0, 4.0, 6.0];
        let data = ProblemData::new(x, None);
        let formulation = Formulation::regression(y, 0.0);
        let fit = formulation
            .baseline_program(&data, 10.0)
            .solve(&Tolerances::default())
            .unwrap();
        assert_abs_diff_eq!(fit.coefficients[0], 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(fit.biases[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(fit.loss, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn ordinal_thresholds_are_ordered() {
        let x = array![[-3.0], [-2.0], [0.0], [0.5], [2.0], [3.0]];
        let labels = encode_ordinal(array![0.0, 0.0, 1.0, 1.0, 2.0, 2.0].view()).unwrap();
        let data = ProblemData::new(x, None);
        let formulation = Formulation::ordinal(labels);
        let fit = formulation
            .baseline_program(&data, 10.0)
            .solve(&Tolerances::default())
            .unwrap();
        assert_eq!(fit.biases.len(), 2);
        assert!(fit.biases[0] <= fit.biases[1] + 1e-9);
        assert_abs_diff_eq!(fit.loss, 0.0, epsilon = 1e-6);
        assert!(fit.coefficients[0] > 0.0);
    }

    #[test]
    fn lupi_slack_uses_privileged_block() {
        // Regular feature separates all but the last sample; the privileged
        // feature flags that sample.
        let x = array![[1.0], [1.0], [-1.0], [-1.0], [-1.0]];
        let x_star = array![[0.0], [0.0], [0.0], [0.0], [1.0]];
        let y = array![1.0, 1.0, -1.0, -1.0, 1.0];
        let data = ProblemData::new(x, Some(x_star));
        let formulation = Formulation::lupi(LupiTask::Classification(
            ClassificationFormulation::new(y),
        ));
        assert!(formulation.is_lupi());
        assert_eq!(formulation.name(), "lupi_classification");

        let fit = formulation
            .baseline_program(&data, 1.0)
            .solve(&Tolerances::default())
            .unwrap();
        assert!(fit.privileged_coefficients.is_some());
        assert!(fit.privileged_bias.is_some());
        assert!(fit.loss > 0.0);
    }

    #[test]
    fn target_outside_design_is_infeasible() {
        let data = ProblemData::new(Array2::ones((2, 1)), None);
        let formulation = Formulation::regression(array![1.0, 1.0], 0.1);
        let budgets = Budgets {
            l1: 1.0,
            loss: 1.0,
            privileged_l1: None,
        };
        let sol = solve_bound(
            &formulation,
            &data,
            FeatureRef::privileged(0),
            BoundObjective::MinimizeMagnitude,
            budgets,
            &PresetConstraints::empty(),
        );
        assert_eq!(sol.status, SolveStatus::Infeasible);
    }

    #[test]
    fn upper_candidates_cover_both_signs() {
        assert_eq!(BoundObjective::candidates(BoundDirection::Lower).len(), 1);
        assert_eq!(BoundObjective::candidates(BoundDirection::Upper).len(), 2);
        assert_eq!(BoundDirection::Upper.to_string(), "upper");
    }
}
