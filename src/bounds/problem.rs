//! Bound problem lifecycle.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::error::{FriError, FriResult};
use crate::formulation::{
    Block, BoundDirection, BoundObjective, BoundRequest, Budgets, FeatureRef, Formulation,
    FormulationBuilder, ProbeFeature, ProblemData, Relaxation,
};
use crate::lp::{SolveStatus, Tolerances};

use super::PresetConstraints;

// =============================================================================
// Identity
// =============================================================================

/// What a bound problem bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// A real feature, with its dataset column.
    Feature { feature: FeatureRef, column: usize },
    /// The `probe`-th probe of a block.
    Probe { block: Block, probe: usize },
}

/// Identity of a bound problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProblemId {
    pub target: Target,
    pub direction: BoundDirection,
}

impl ProblemId {
    pub fn feature(feature: FeatureRef, column: usize, direction: BoundDirection) -> Self {
        Self {
            target: Target::Feature { feature, column },
            direction,
        }
    }

    pub fn probe(block: Block, probe: usize, direction: BoundDirection) -> Self {
        Self {
            target: Target::Probe { block, probe },
            direction,
        }
    }

    #[inline]
    pub fn is_probe(&self) -> bool {
        matches!(self.target, Target::Probe { .. })
    }
}

impl fmt::Display for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target {
            Target::Feature { column, .. } => write!(f, "feature {column} ({})", self.direction),
            Target::Probe { block, probe } => {
                write!(f, "{block} probe {probe} ({})", self.direction)
            }
        }
    }
}

// =============================================================================
// BoundJob
// =============================================================================

/// Outcome of running a [`BoundJob`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    pub status: SolveStatus,
    /// Bound value when the status is accepted.
    pub value: Option<f64>,
    /// Number of programs solved (candidates × relaxations tried).
    pub attempts: usize,
}

impl SolveReport {
    pub fn failed(status: SolveStatus) -> Self {
        Self {
            status,
            value: None,
            attempts: 0,
        }
    }
}

/// Everything needed to solve one bound, with shared data behind `Arc`.
///
/// `Clone + Send + 'static`, so it can be moved to a worker or a detached
/// deadline thread. The concrete program is built inside [`BoundJob::run`].
#[derive(Debug, Clone)]
pub struct BoundJob {
    formulation: Arc<Formulation>,
    data: Arc<ProblemData>,
    probe: Option<Arc<ProbeFeature>>,
    target: FeatureRef,
    direction: BoundDirection,
    budgets: Budgets,
    presets: Arc<PresetConstraints>,
    relaxations: Arc<[Relaxation]>,
}

impl BoundJob {
    /// # Arguments
    ///
    /// * `target` - Bounded weight; for a probe job, the probe column of its block
    /// * `probe` - Probe column appended to the design, if any
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        formulation: Arc<Formulation>,
        data: Arc<ProblemData>,
        probe: Option<Arc<ProbeFeature>>,
        target: FeatureRef,
        direction: BoundDirection,
        budgets: Budgets,
        presets: Arc<PresetConstraints>,
        relaxations: Arc<[Relaxation]>,
    ) -> Self {
        Self {
            formulation,
            data,
            probe,
            target,
            direction,
            budgets,
            presets,
            relaxations,
        }
    }

    pub fn direction(&self) -> BoundDirection {
        self.direction
    }

    pub fn target(&self) -> FeatureRef {
        self.target
    }

    /// Probe column appended to the design, if any.
    pub fn probe(&self) -> Option<&ProbeFeature> {
        self.probe.as_deref()
    }

    /// Solve every candidate of the direction along the relaxation ladder.
    ///
    /// Per candidate, the first accepted relaxation wins. The upper bound is
    /// the larger accepted value of its two sign candidates. If no candidate is
    /// accepted, the last failure status is reported. Never panics.
    pub fn run(&self, tolerances: &Tolerances) -> SolveReport {
        catch_unwind(AssertUnwindSafe(|| self.run_candidates(tolerances)))
            .unwrap_or_else(|_| SolveReport::failed(SolveStatus::SolverError))
    }

    fn run_candidates(&self, tolerances: &Tolerances) -> SolveReport {
        let ladder: &[Relaxation] = if self.relaxations.is_empty() {
            &[Relaxation::EXACT]
        } else {
            &self.relaxations
        };

        let mut attempts = 0;
        let mut best: Option<(f64, SolveStatus)> = None;
        let mut last_failure = SolveStatus::Unsolved;

        for &objective in BoundObjective::candidates(self.direction) {
            for relaxation in ladder {
                attempts += 1;
                let request = BoundRequest {
                    target: self.target,
                    objective,
                    budgets: self.budgets.relaxed(relaxation),
                    presets: &self.presets,
                    probe: self.probe.as_deref(),
                };
                let solution = self.formulation.build(&self.data, &request).solve(tolerances);
                if solution.status.is_accepted() {
                    best = Some(match best {
                        None => (solution.objective, solution.status),
                        Some((value, status)) => (
                            value.max(solution.objective),
                            status.worst_accepted(solution.status),
                        ),
                    });
                    break;
                }
                last_failure = solution.status;
            }
        }

        match best {
            Some((value, status)) => SolveReport {
                status,
                value: Some(value),
                attempts,
            },
            None => SolveReport {
                status: last_failure,
                value: None,
                attempts,
            },
        }
    }
}

// =============================================================================
// BoundProblem
// =============================================================================

/// One bound problem: a job plus its write-once outcome.
#[derive(Debug, Clone)]
pub struct BoundProblem {
    id: ProblemId,
    job: BoundJob,
    status: SolveStatus,
    value: Option<f64>,
    attempts: usize,
}

impl BoundProblem {
    pub fn new(id: ProblemId, job: BoundJob) -> Self {
        Self {
            id,
            job,
            status: SolveStatus::Unsolved,
            value: None,
            attempts: 0,
        }
    }

    #[inline]
    pub fn id(&self) -> &ProblemId {
        &self.id
    }

    #[inline]
    pub fn is_probe(&self) -> bool {
        self.id.is_probe()
    }

    #[inline]
    pub fn status(&self) -> SolveStatus {
        self.status
    }

    #[inline]
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn job(&self) -> &BoundJob {
        &self.job
    }

    /// Solve on the calling thread. A problem is solved at most once; later
    /// calls return the recorded status.
    pub fn solve(&mut self, tolerances: &Tolerances) -> SolveStatus {
        if !self.status.is_finished() {
            let report = self.job.run(tolerances);
            self.record(report);
        }
        self.status
    }

    /// Record an outcome produced elsewhere. Ignored if already recorded.
    pub(crate) fn record(&mut self, report: SolveReport) {
        if self.status.is_finished() {
            return;
        }
        self.status = report.status;
        self.attempts = report.attempts;
        self.value = report.value.filter(|_| report.status.is_accepted());
    }

    /// Bound value.
    ///
    /// Probes that failed (or were never solved) contribute `0.0`.
    ///
    /// # Errors
    ///
    /// [`FriError::UnresolvedBound`] for a real feature without an accepted value.
    pub fn result(&self) -> FriResult<f64> {
        match (self.value, self.id.target) {
            (Some(value), _) => Ok(value),
            (None, Target::Probe { .. }) => Ok(0.0),
            (None, Target::Feature { column, .. }) => Err(FriError::UnresolvedBound {
                feature: column,
                direction: self.id.direction,
                status: self.status,
            }),
        }
    }
}
