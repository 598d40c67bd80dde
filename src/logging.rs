//! Verbosity levels, subscriber setup and the solve-batch logger.
//!
//! Components never install a subscriber themselves. Binaries, tests and
//! notebooks that want output call [`init_logging`] once; every later call is a
//! no-op. All messages go through `tracing` macros, additionally gated by the
//! [`Verbosity`] carried in the configuration so that a silent fit stays silent
//! even when a global subscriber is installed.

use std::sync::Once;
use std::time::Instant;

use tracing::{debug, info, warn};
use tracing::level_filters::LevelFilter;

use crate::bounds::ProblemId;
use crate::lp::SolveStatus;

// =============================================================================
// Verbosity
// =============================================================================

/// Verbosity level for engine output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum Verbosity {
    /// No output.
    #[default]
    Silent,
    /// Only failures (unresolved bounds, baseline problems).
    Warning,
    /// Batch start and summary.
    Info,
    /// Every solved problem.
    Debug,
}

impl Verbosity {
    fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Silent => LevelFilter::OFF,
            Verbosity::Warning => LevelFilter::WARN,
            Verbosity::Info => LevelFilter::INFO,
            Verbosity::Debug => LevelFilter::DEBUG,
        }
    }
}

// =============================================================================
// Subscriber setup
// =============================================================================

static INIT: Once = Once::new();

/// Install a `tracing-subscriber` formatter for the process.
///
/// Idempotent: only the first call has an effect, later calls (with any
/// verbosity) return without touching the global subscriber. If another
/// subscriber was already installed by the host application, that one is kept.
pub fn init_logging(verbosity: Verbosity) {
    INIT.call_once(|| {
        // host subscriber wins
        let _ = tracing_subscriber::fmt()
            .with_max_level(verbosity.level_filter())
            .with_target(false)
            .try_init();
    });
}

// =============================================================================
// SolveLogger
// =============================================================================

/// Logger for one batch of bound problems.
///
/// Cheap to copy; shared by reference across solver workers.
#[derive(Debug, Clone, Copy)]
pub struct SolveLogger {
    verbosity: Verbosity,
    started: Option<Instant>,
}

impl SolveLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            started: None,
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Mark the start of a batch.
    pub fn start_batch(&mut self, n_problems: usize, n_jobs: usize) {
        self.started = Some(Instant::now());
        if self.verbosity >= Verbosity::Info {
            info!(n_problems, n_jobs, "solving relevance bound problems");
        }
    }

    /// Record the outcome of one problem.
    pub fn problem_done(&self, id: &ProblemId, status: SolveStatus, attempts: usize) {
        if status.is_accepted() {
            if self.verbosity >= Verbosity::Debug {
                debug!(problem = %id, %status, attempts, "bound solved");
            }
        } else if id.is_probe() {
            if self.verbosity >= Verbosity::Debug {
                debug!(problem = %id, %status, "probe bound failed, defaulting to zero");
            }
        } else if self.verbosity >= Verbosity::Warning {
            warn!(problem = %id, %status, attempts, "bound could not be resolved");
        }
    }

    /// Summarize a finished batch.
    pub fn finish_batch(&self, n_solved: usize, n_failed: usize) {
        if self.verbosity >= Verbosity::Info {
            let elapsed_ms = self
                .started
                .map(|t| t.elapsed().as_millis() as u64)
                .unwrap_or_default();
            info!(n_solved, n_failed, elapsed_ms, "bound batch complete");
        }
    }

    pub fn info(&self, message: &str) {
        if self.verbosity >= Verbosity::Info {
            info!("{message}");
        }
    }

    pub fn warn(&self, message: &str) {
        if self.verbosity >= Verbosity::Warning {
            warn!("{message}");
        }
    }
}
