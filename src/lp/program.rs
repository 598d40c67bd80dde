//! Linear program description and the `minilp` translation.

use std::panic::{AssertUnwindSafe, catch_unwind};

use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem};

use super::status::{SolveStatus, Tolerances};

// =============================================================================
// Building blocks
// =============================================================================

/// Handle to a variable of a [`LinearProgram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    /// Position of the variable in the program.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// Row comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `terms ≤ rhs`
    Le,
    /// `terms ≥ rhs`
    Ge,
    /// `terms = rhs`
    Eq,
}

#[derive(Debug, Clone, PartialEq)]
struct Variable {
    objective: f64,
    lower: f64,
    upper: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Row {
    terms: Vec<(VarId, f64)>,
    cmp: Comparison,
    rhs: f64,
}

impl Row {
    fn activity(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|(v, c)| c * values[v.0]).sum()
    }

    fn residual(&self, values: &[f64]) -> f64 {
        let activity = self.activity(values);
        let violation = match self.cmp {
            Comparison::Le => (activity - self.rhs).max(0.0),
            Comparison::Ge => (self.rhs - activity).max(0.0),
            Comparison::Eq => (activity - self.rhs).abs(),
        };
        violation / (1.0 + self.rhs.abs())
    }
}

// =============================================================================
// LinearProgram
// =============================================================================

/// A linear program: `optimize c·x` subject to rows and variable bounds.
///
/// # Example
///
/// ```
/// use fri::lp::{Comparison, LinearProgram, Sense, SolveStatus, Tolerances};
///
/// // maximize x + y  s.t.  x + 2y ≤ 4,  x ≤ 3,  x, y ≥ 0
/// let mut lp = LinearProgram::new(Sense::Maximize);
/// let x = lp.add_nonneg_var();
/// let y = lp.add_nonneg_var();
/// lp.set_objective(x, 1.0);
/// lp.set_objective(y, 1.0);
/// lp.add_constraint(vec![(x, 1.0), (y, 2.0)], Comparison::Le, 4.0);
/// lp.add_constraint(vec![(x, 1.0)], Comparison::Le, 3.0);
///
/// let solution = lp.solve(&Tolerances::default());
/// assert_eq!(solution.status, SolveStatus::Optimal);
/// assert!((solution.objective - 3.5).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LinearProgram {
    sense: Sense,
    vars: Vec<Variable>,
    rows: Vec<Row>,
}

impl LinearProgram {
    pub fn new(sense: Sense) -> Self {
        Self {
            sense,
            vars: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn set_sense(&mut self, sense: Sense) {
        self.sense = sense;
    }

    pub fn n_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn n_constraints(&self) -> usize {
        self.rows.len()
    }

    /// Add a variable with bounds `[lower, upper]` (infinite bounds allowed).
    pub fn add_var(&mut self, lower: f64, upper: f64) -> VarId {
        self.vars.push(Variable {
            objective: 0.0,
            lower,
            upper,
        });
        VarId(self.vars.len() - 1)
    }

    /// Add a variable with bounds `[0, ∞)`.
    pub fn add_nonneg_var(&mut self) -> VarId {
        self.add_var(0.0, f64::INFINITY)
    }

    /// Add an unbounded variable.
    pub fn add_free_var(&mut self) -> VarId {
        self.add_var(f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Set the objective coefficient of `var`.
    pub fn set_objective(&mut self, var: VarId, coef: f64) {
        self.vars[var.0].objective = coef;
    }

    /// Add `coef` to the objective coefficient of `var`.
    pub fn add_objective(&mut self, var: VarId, coef: f64) {
        self.vars[var.0].objective += coef;
    }

    /// Reset every objective coefficient to zero.
    pub fn clear_objective(&mut self) {
        for var in &mut self.vars {
            var.objective = 0.0;
        }
    }

    /// Add a row `Σ coef·var  cmp  rhs`. Repeated variables are summed.
    pub fn add_constraint(&mut self, terms: Vec<(VarId, f64)>, cmp: Comparison, rhs: f64) {
        self.rows.push(Row { terms, cmp, rhs });
    }

    /// Evaluate `Σ coef·var` at `values`.
    pub fn evaluate(terms: &[(VarId, f64)], values: &[f64]) -> f64 {
        terms.iter().map(|(v, c)| c * values[v.0]).sum()
    }

    /// Largest scaled violation of rows and bounds at `values`.
    pub fn max_violation(&self, values: &[f64]) -> f64 {
        let rows = self
            .rows
            .iter()
            .map(|row| row.residual(values))
            .fold(0.0, f64::max);
        let bounds = self
            .vars
            .iter()
            .zip(values)
            .map(|(var, &x)| {
                let below = if var.lower.is_finite() {
                    (var.lower - x).max(0.0) / (1.0 + var.lower.abs())
                } else {
                    0.0
                };
                let above = if var.upper.is_finite() {
                    (x - var.upper).max(0.0) / (1.0 + var.upper.abs())
                } else {
                    0.0
                };
                below.max(above)
            })
            .fold(0.0, f64::max);
        if values.iter().all(|v| v.is_finite()) {
            rows.max(bounds)
        } else {
            f64::NAN
        }
    }

    /// Solve the program.
    ///
    /// Never panics: a panic inside the solver is reported as
    /// [`SolveStatus::SolverError`]. An accepted solution is classified as
    /// `Optimal` or `OptimalInaccurate` by its residuals against `tolerances`.
    pub fn solve(&self, tolerances: &Tolerances) -> LpSolution {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.solve_minilp()));

        match outcome {
            Ok(Ok((objective, values))) => {
                let max_violation = self.max_violation(&values);
                let status = tolerances.classify(max_violation);
                LpSolution {
                    status,
                    objective,
                    values,
                    max_violation,
                }
            }
            Ok(Err(status)) => LpSolution::failed(status),
            Err(_) => LpSolution::failed(SolveStatus::SolverError),
        }
    }

    fn solve_minilp(&self) -> Result<(f64, Vec<f64>), SolveStatus> {
        let direction = match self.sense {
            Sense::Minimize => OptimizationDirection::Minimize,
            Sense::Maximize => OptimizationDirection::Maximize,
        };
        let mut problem = Problem::new(direction);
        let handles: Vec<minilp::Variable> = self
            .vars
            .iter()
            .map(|v| problem.add_var(v.objective, (v.lower, v.upper)))
            .collect();

        for row in &self.rows {
            let terms = merged_terms(&row.terms);
            if terms.is_empty() {
                // Constant row: 0 cmp rhs.
                if row.residual(&[]) > 0.0 {
                    return Err(SolveStatus::Infeasible);
                }
                continue;
            }
            let mut expr = LinearExpr::empty();
            for (var, coef) in terms {
                expr.add(handles[var.0], coef);
            }
            let op = match row.cmp {
                Comparison::Le => ComparisonOp::Le,
                Comparison::Ge => ComparisonOp::Ge,
                Comparison::Eq => ComparisonOp::Eq,
            };
            problem.add_constraint(expr, op, row.rhs);
        }

        match problem.solve() {
            Ok(solution) => {
                let values = handles.iter().map(|&h| solution[h]).collect();
                Ok((solution.objective(), values))
            }
            Err(minilp::Error::Infeasible) => Err(SolveStatus::Infeasible),
            Err(minilp::Error::Unbounded) => Err(SolveStatus::Unbounded),
        }
    }
}

/// Sum coefficients of repeated variables, dropping zeros.
fn merged_terms(terms: &[(VarId, f64)]) -> Vec<(VarId, f64)> {
    let mut merged = terms.to_vec();
    merged.sort_by_key(|(v, _)| *v);
    merged.dedup_by(|next, kept| {
        if next.0 == kept.0 {
            kept.1 += next.1;
            true
        } else {
            false
        }
    });
    merged.retain(|(_, c)| *c != 0.0);
    merged
}

// =============================================================================
// LpSolution
// =============================================================================

/// Result of [`LinearProgram::solve`].
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    pub status: SolveStatus,
    /// Objective value; `NaN` unless the status is accepted.
    pub objective: f64,
    /// Variable values indexed by [`VarId::index`]; empty on failure.
    pub values: Vec<f64>,
    /// Largest scaled residual of the returned point.
    pub max_violation: f64,
}

impl LpSolution {
    fn failed(status: SolveStatus) -> Self {
        Self {
            status,
            objective: f64::NAN,
            values: Vec::new(),
            max_violation: f64::NAN,
        }
    }

    /// Value of `var`, `NaN` if the solve failed.
    pub fn value(&self, var: VarId) -> f64 {
        self.values.get(var.0).copied().unwrap_or(f64::NAN)
    }
}
