//! Crate-level error type.
//!
//! Each area has its own error enum ([`DatasetError`], [`ConfigError`],
//! [`GenerationError`]); [`FriError`] wraps them and adds the engine failures
//! that are fatal for a caller: label-cardinality mismatches, preset ranges that
//! exceed the L1 budget, unresolved bounds and baseline failures.
//!
//! Per-problem solver failures are *not* errors: they are recorded as a
//! [`SolveStatus`] on the bound problem and only surface through
//! [`FriError::UnresolvedBound`] when a caller asks for the value of a real
//! feature's bound.

use crate::data::DatasetError;
use crate::formulation::BoundDirection;
use crate::lp::SolveStatus;
use crate::model::ConfigError;
use crate::testing::data::GenerationError;

/// Result alias used throughout the crate.
pub type FriResult<T> = Result<T, FriError>;

/// Errors reported by the relevance engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FriError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("{problem} expects {expected} distinct labels, found {found}")]
    LabelCardinality {
        problem: &'static str,
        expected: String,
        found: usize,
    },

    #[error("ordinal labels must be integer valued, found {value} at row {row}")]
    NonIntegerOrdinalLabel { row: usize, value: f64 },

    #[error(
        "preset for feature {feature} has magnitude {value} which exceeds the reference L1 norm {budget}"
    )]
    PresetOutOfBudget {
        feature: usize,
        value: f64,
        budget: f64,
    },

    #[error("preset refers to feature {feature} but the problem has {n_features} features")]
    PresetFeatureOutOfRange { feature: usize, n_features: usize },

    #[error("preset for feature {feature} is not a finite range: [{low}, {high}]")]
    PresetNotFinite { feature: usize, low: f64, high: f64 },

    #[error("{direction} bound of feature {feature} is unresolved (solver status: {status})")]
    UnresolvedBound {
        feature: usize,
        direction: BoundDirection,
        status: SolveStatus,
    },

    #[error("baseline model could not be fitted (solver status: {status})")]
    BaselineFailed { status: SolveStatus },

    #[error("invalid baseline model: {reason}")]
    InvalidBaseline { reason: String },

    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
}
