//! Batch solving of bound problems.
//!
//! [`SolveOrchestrator::run`] dispatches a batch of [`BoundProblem`]s to a
//! bounded `rayon` pool (see [`run_with_threads`]) and returns once every
//! problem has a recorded outcome. Output order equals input order, and a
//! failing problem never affects its siblings.
//!
//! With a timeout, each solve runs on its own detached thread and the worker
//! waits at most `timeout` for it. A late solve keeps running in the
//! background; its result is discarded.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::bounds::{BoundJob, BoundProblem, SolveReport};
use crate::error::FriResult;
use crate::logging::SolveLogger;
use crate::lp::{SolveStatus, Tolerances};
use crate::utils::run_with_threads;

/// Solves batches of bound problems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveOrchestrator {
    n_jobs: usize,
    timeout: Option<Duration>,
    tolerances: Tolerances,
}

impl SolveOrchestrator {
    /// # Arguments
    ///
    /// * `n_jobs` - Worker threads: `0` = all cores, `1` = sequential
    /// * `timeout` - Per-problem deadline, `None` to wait indefinitely
    /// * `tolerances` - Acceptance tolerances for every solve
    pub fn new(n_jobs: usize, timeout: Option<Duration>, tolerances: Tolerances) -> Self {
        Self {
            n_jobs,
            timeout,
            tolerances,
        }
    }

    pub fn n_jobs(&self) -> usize {
        self.n_jobs
    }

    /// Solve every problem of the batch.
    ///
    /// # Errors
    ///
    /// Only thread-pool construction can fail; solver failures are recorded on
    /// the problems.
    pub fn run(
        &self,
        problems: Vec<BoundProblem>,
        logger: &mut SolveLogger,
    ) -> FriResult<SolvedBatch> {
        logger.start_batch(problems.len(), self.n_jobs);
        let log = *logger;

        let problems = run_with_threads(self.n_jobs, |parallelism| {
            parallelism.maybe_par_map(problems, |mut problem| {
                self.solve_one(&mut problem);
                log.problem_done(problem.id(), problem.status(), problem.attempts());
                problem
            })
        })?;

        let batch = SolvedBatch { problems };
        logger.finish_batch(batch.len() - batch.n_failed(), batch.n_failed());
        Ok(batch)
    }

    fn solve_one(&self, problem: &mut BoundProblem) {
        match self.timeout {
            None => {
                problem.solve(&self.tolerances);
            }
            Some(timeout) => {
                let report = run_with_deadline(problem.job().clone(), self.tolerances, timeout);
                problem.record(report);
            }
        }
    }
}

/// Run `job` on a detached thread, waiting at most `timeout`.
fn run_with_deadline(job: BoundJob, tolerances: Tolerances, timeout: Duration) -> SolveReport {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("fri-bound".to_string())
        .spawn(move || {
            // receiver gone after timeout
            let _ = tx.send(job.run(&tolerances));
        });
    if spawned.is_err() {
        return SolveReport::failed(SolveStatus::SolverError);
    }

    match rx.recv_timeout(timeout) {
        Ok(report) => report,
        Err(RecvTimeoutError::Timeout) => SolveReport::failed(SolveStatus::TimedOut),
        Err(RecvTimeoutError::Disconnected) => SolveReport::failed(SolveStatus::SolverError),
    }
}

/// A batch whose problems all have a recorded outcome.
#[derive(Debug, Clone)]
pub struct SolvedBatch {
    problems: Vec<BoundProblem>,
}

impl SolvedBatch {
    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    /// Problems without an accepted status.
    pub fn n_failed(&self) -> usize {
        self.problems
            .iter()
            .filter(|p| !p.status().is_accepted())
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundProblem> {
        self.problems.iter()
    }

    pub fn into_problems(self) -> Vec<BoundProblem> {
        self.problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::bounds::{PresetConstraints, ProblemId};
    use crate::formulation::{
        BoundDirection, Budgets, FeatureRef, Formulation, ProblemData, Relaxation,
    };
    use crate::logging::Verbosity;
    use ndarray::array;

    fn problems() -> Vec<BoundProblem> {
        let x = array![[1.0, 0.0], [2.0, 0.0], [-1.0, 0.0], [-2.0, 0.0]];
        let y = array![1.0, 1.0, -1.0, -1.0];
        let formulation = Arc::new(Formulation::classification(y));
        let data = Arc::new(ProblemData::new(x, None));
        let presets = Arc::new(PresetConstraints::empty());
        let relaxations: Arc<[Relaxation]> = Relaxation::default_ladder().into();
        let budgets = Budgets {
            l1: 1.5,
            loss: 0.0,
            privileged_l1: None,
        };

        let mut problems = Vec::new();
        for j in 0..2 {
            for direction in [BoundDirection::Lower, BoundDirection::Upper] {
                let feature = FeatureRef::regular(j);
                let job = BoundJob::new(
                    formulation.clone(),
                    data.clone(),
                    None,
                    feature,
                    direction,
                    budgets,
                    presets.clone(),
                    relaxations.clone(),
                );
                problems.push(BoundProblem::new(ProblemId::feature(feature, j, direction), job));
            }
        }
        problems
    }

    fn values(batch: &SolvedBatch) -> Vec<f64> {
        batch.iter().map(|p| p.result().unwrap()).collect()
    }

    #[test]
    fn sequential_batch_solves_everything() {
        let mut logger = SolveLogger::new(Verbosity::Silent);
        let batch = SolveOrchestrator::new(1, None, Tolerances::default())
            .run(problems(), &mut logger)
            .unwrap();
        assert_eq!(batch.len(), 4);
        assert_eq!(batch.n_failed(), 0);
        let v = values(&batch);
        approx::assert_abs_diff_eq!(v[0], 1.0, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(v[1], 1.5, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(v[2], 0.0, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(v[3], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn parallel_batch_matches_sequential_order() {
        let mut logger = SolveLogger::new(Verbosity::Silent);
        let seq = SolveOrchestrator::new(1, None, Tolerances::default())
            .run(problems(), &mut logger)
            .unwrap();
        let par = SolveOrchestrator::new(3, None, Tolerances::default())
            .run(problems(), &mut logger)
            .unwrap();
        let ids: Vec<_> = seq.iter().map(|p| *p.id()).collect();
        let par_ids: Vec<_> = par.iter().map(|p| *p.id()).collect();
        assert_eq!(ids, par_ids);
        assert_eq!(values(&seq), values(&par));
    }

    #[test]
    fn generous_timeout_still_solves() {
        let mut logger = SolveLogger::new(Verbosity::Silent);
        let batch = SolveOrchestrator::new(2, Some(Duration::from_secs(60)), Tolerances::default())
            .run(problems(), &mut logger)
            .unwrap();
        assert_eq!(batch.n_failed(), 0);
    }

    #[test]
    fn zero_timeout_marks_timed_out() {
        let mut logger = SolveLogger::new(Verbosity::Silent);
        let batch = SolveOrchestrator::new(1, Some(Duration::ZERO), Tolerances::default())
            .run(problems(), &mut logger)
            .unwrap();
        for problem in batch.iter() {
            assert!(matches!(
                problem.status(),
                SolveStatus::TimedOut | SolveStatus::Optimal | SolveStatus::OptimalInaccurate
            ));
        }
    }
}
