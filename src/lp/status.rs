//! Solver status and acceptance tolerances.

use std::fmt;

/// Outcome of one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum SolveStatus {
    /// Not solved yet.
    #[default]
    Unsolved,
    /// Solved, residuals within the optimal tolerance.
    Optimal,
    /// Solved, residuals within the inaccurate tolerance only.
    OptimalInaccurate,
    /// The feasible region is empty.
    Infeasible,
    /// The objective is unbounded.
    Unbounded,
    /// The returned point violates the constraints beyond tolerance.
    Numerical,
    /// The solver panicked.
    SolverError,
    /// The per-problem deadline passed before the solve finished.
    TimedOut,
}

impl SolveStatus {
    /// Whether the objective value can be used.
    #[inline]
    pub fn is_accepted(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::OptimalInaccurate)
    }

    /// Whether a solve has finished (successfully or not).
    #[inline]
    pub fn is_finished(self) -> bool {
        !matches!(self, SolveStatus::Unsolved)
    }

    /// Combine two accepted statuses: the result is only `Optimal` when both are.
    pub fn worst_accepted(self, other: SolveStatus) -> SolveStatus {
        match (self, other) {
            (SolveStatus::Optimal, SolveStatus::Optimal) => SolveStatus::Optimal,
            _ => SolveStatus::OptimalInaccurate,
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolveStatus::Unsolved => "unsolved",
            SolveStatus::Optimal => "optimal",
            SolveStatus::OptimalInaccurate => "optimal_inaccurate",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::Numerical => "numerical",
            SolveStatus::SolverError => "solver_error",
            SolveStatus::TimedOut => "timed_out",
        };
        f.write_str(name)
    }
}

/// Residual tolerances used to classify a solution.
///
/// The residual of a row is its violation divided by `1 + |rhs|`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Tolerances {
    /// Maximum residual for [`SolveStatus::Optimal`]. Default: 1e-7.
    pub optimal: f64,
    /// Maximum residual for [`SolveStatus::OptimalInaccurate`]. Default: 1e-5.
    pub inaccurate: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            optimal: 1e-7,
            inaccurate: 1e-5,
        }
    }
}

impl Tolerances {
    /// Classify a solution by its largest residual.
    pub fn classify(&self, max_violation: f64) -> SolveStatus {
        if !max_violation.is_finite() {
            SolveStatus::Numerical
        } else if max_violation <= self.optimal {
            SolveStatus::Optimal
        } else if max_violation <= self.inaccurate {
            SolveStatus::OptimalInaccurate
        } else {
            SolveStatus::Numerical
        }
    }

    /// Whether both tolerances are positive, finite and ordered.
    pub fn is_valid(&self) -> bool {
        self.optimal.is_finite()
            && self.inaccurate.is_finite()
            && self.optimal > 0.0
            && self.optimal <= self.inaccurate
    }
}
