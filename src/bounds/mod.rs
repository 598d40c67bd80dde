//! Bound problems: one (target, direction) optimization each.
//!
//! - [`PresetConstraints`]: validated per-feature weight ranges
//! - [`BoundJob`]: the self-contained, thread-movable solve of one bound
//! - [`BoundProblem`]: a job plus its write-once status and value

mod preset;
mod problem;

pub use preset::{PresetConstraints, PresetRange};
pub use problem::{BoundJob, BoundProblem, ProblemId, SolveReport, Target};
