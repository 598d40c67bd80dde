//! Relevance model configuration with builder pattern.
//!
//! [`FriConfig`] uses the `bon` crate for builder generation; `build()`
//! validates the finished configuration.
//!
//! # Example
//!
//! ```
//! use fri::model::{FriConfig, ProblemKind};
//!
//! // All defaults
//! let config = FriConfig::builder().build().unwrap();
//! assert_eq!(config.n_probe_features, 40);
//!
//! let config = FriConfig::builder()
//!     .problem(ProblemKind::Regression)
//!     .epsilon(0.05)
//!     .n_jobs(4)
//!     .build()
//!     .unwrap();
//! ```

use std::time::Duration;

use bon::Builder;

use crate::aggregate::ThresholdStatistic;
use crate::formulation::Relaxation;
use crate::logging::Verbosity;
use crate::lp::Tolerances;
use crate::probes::ProbeStrategy;

use super::{OrdinalErrorType, ProblemKind};

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be non-negative, got {value}")]
    NegativeSlack { field: &'static str, value: f64 },

    #[error("c must be positive, got {0}")]
    InvalidC(f64),

    #[error("epsilon must be non-negative, got {0}")]
    InvalidEpsilon(f64),

    #[error("epsilon_floor must be non-negative, got {0}")]
    InvalidEpsilonFloor(f64),

    #[error("{problem} needs privileged features (n_privileged > 0)")]
    LupiWithoutPrivileged { problem: ProblemKind },

    #[error("{problem} has no privileged features, got n_privileged = {n_privileged}")]
    PrivilegedOnNonLupi {
        problem: ProblemKind,
        n_privileged: usize,
    },

    #[error("invalid noise threshold statistic: {0:?}")]
    InvalidThreshold(ThresholdStatistic),

    #[error("invalid solver tolerances: optimal {optimal}, inaccurate {inaccurate}")]
    InvalidTolerances { optimal: f64, inaccurate: f64 },

    #[error("invalid relaxation: relative {relative}, absolute {absolute}")]
    InvalidRelaxation { relative: f64, absolute: f64 },

    #[error("at least one relaxation step is required")]
    EmptyRelaxations,

    #[error("unknown problem type '{name}', expected one of: {valid}")]
    UnknownProblem { name: String, valid: &'static str },

    #[error("unknown ordinal error type '{name}', expected one of: {valid}")]
    UnknownOrdinalError { name: String, valid: &'static str },
}

// =============================================================================
// FriConfig
// =============================================================================

/// Configuration of a relevance fit.
///
/// # Structure
///
/// - **Problem**: family, privileged block size and baseline hyperparameters
/// - **Region**: slacks defining the near-optimal model set
/// - **Probes**: how many, how they are drawn and how the threshold is derived
/// - **Solver**: tolerances, relaxation ladder and per-problem timeout
/// - **Resources**: threads, seed, logging
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct FriConfig {
    // === Problem ===
    /// Problem family. Default: classification.
    #[builder(default)]
    pub problem: ProblemKind,

    /// Number of trailing columns that are privileged (LUPI only). Default: 0.
    #[builder(default = 0)]
    pub n_privileged: usize,

    /// Loss weight of the baseline fit. Default: 1.0.
    #[builder(default = 1.0)]
    pub c: f64,

    /// Tube half-width for regression. Default: 0.1.
    #[builder(default = 0.1)]
    pub epsilon: f64,

    /// Score used for ordinal baselines. Default: mmae.
    #[builder(default)]
    pub ordinal_error: OrdinalErrorType,

    // === Region ===
    /// Relative slack on the baseline L1 norm. Default: 0.1.
    #[builder(default = 0.1)]
    pub w_l1_slack: f64,

    /// Relative slack on the baseline loss. Default: 0.1.
    #[builder(default = 0.1)]
    pub loss_slack: f64,

    // === Probes & classification ===
    /// Probes per feature block. Default: 40.
    #[builder(default = 40)]
    pub n_probe_features: usize,

    #[builder(default)]
    pub probe_strategy: ProbeStrategy,

    /// Statistic over probe upper bounds. Default: max.
    #[builder(default)]
    pub threshold: ThresholdStatistic,

    /// Values below this are zero; also added to the noise threshold. Default: 1e-6.
    #[builder(default = 1e-6)]
    pub epsilon_floor: f64,

    /// Report intervals divided by the L1 budget. Default: true.
    #[builder(default = true)]
    pub normalize: bool,

    // === Solver ===
    #[builder(default)]
    pub tolerances: Tolerances,

    /// Budget widenings tried in order after a failed solve.
    #[builder(default = Relaxation::default_ladder())]
    pub relaxations: Vec<Relaxation>,

    /// Per-problem deadline. Default: none.
    pub timeout: Option<Duration>,

    // === Resources ===
    /// Worker threads: 0 = all cores, 1 = sequential. Default: 1.
    #[builder(default = 1)]
    pub n_jobs: usize,

    /// Seed for probe generation. Default: 42.
    #[builder(default = 42)]
    pub random_state: u64,

    #[builder(default)]
    pub verbosity: Verbosity,
}

impl<S: fri_config_builder::IsComplete> FriConfigBuilder<S> {
    /// Build and validate the configuration.
    pub fn build(self) -> Result<FriConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl FriConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("w_l1_slack", self.w_l1_slack), ("loss_slack", self.loss_slack)] {
            if value.is_nan() || value < 0.0 {
                return Err(ConfigError::NegativeSlack { field, value });
            }
        }
        if !self.c.is_finite() || self.c <= 0.0 {
            return Err(ConfigError::InvalidC(self.c));
        }
        if self.epsilon.is_nan() || self.epsilon < 0.0 {
            return Err(ConfigError::InvalidEpsilon(self.epsilon));
        }
        if self.epsilon_floor.is_nan() || self.epsilon_floor < 0.0 {
            return Err(ConfigError::InvalidEpsilonFloor(self.epsilon_floor));
        }

        match (self.problem.is_lupi(), self.n_privileged) {
            (true, 0) => {
                return Err(ConfigError::LupiWithoutPrivileged {
                    problem: self.problem,
                });
            }
            (false, n) if n > 0 => {
                return Err(ConfigError::PrivilegedOnNonLupi {
                    problem: self.problem,
                    n_privileged: n,
                });
            }
            _ => {}
        }

        if !self.threshold.is_valid() {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        if !self.tolerances.is_valid() {
            return Err(ConfigError::InvalidTolerances {
                optimal: self.tolerances.optimal,
                inaccurate: self.tolerances.inaccurate,
            });
        }
        if self.relaxations.is_empty() {
            return Err(ConfigError::EmptyRelaxations);
        }
        if let Some(bad) = self.relaxations.iter().find(|r| !r.is_valid()) {
            return Err(ConfigError::InvalidRelaxation {
                relative: bad.relative,
                absolute: bad.absolute,
            });
        }
        Ok(())
    }
}

impl Default for FriConfig {
    fn default() -> Self {
        Self::builder().__build_internal()
    }
}

// =============================================================================
// Tests
// =============================================================================
