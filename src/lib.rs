//! fri: feature relevance intervals for sparse linear models.
//!
//! For every feature of a labeled dataset, fri computes the range of weight
//! magnitudes the feature can take among all linear models that are nearly as
//! sparse and nearly as accurate as a fitted baseline. Features are then
//! classified as strongly relevant (needed by every such model), weakly
//! relevant (used by some) or irrelevant, against a noise floor calibrated on
//! synthetic probe features.
//!
//! Supported problems: classification, regression and ordinal regression,
//! each also in a LUPI variant (learning using privileged information) where
//! trailing columns are only available at training time.
//!
//! # Example
//!
//! ```
//! use fri::model::{FriConfig, ProblemKind, RelevanceModel};
//! use fri::testing::data::{GenParams, gen_classification_data};
//!
//! fri::init_logging(fri::Verbosity::Warning);
//!
//! let params = GenParams { n_samples: 40, n_features: 3, n_strong: 1, ..Default::default() };
//! let dataset = gen_classification_data(&params, 1.0).unwrap();
//!
//! let config = FriConfig::builder()
//!     .problem(ProblemKind::Classification)
//!     .n_probe_features(10)
//!     .build()
//!     .unwrap();
//! let model = RelevanceModel::fit(&dataset, config).unwrap();
//! println!("{}", model.result());
//! ```

pub mod aggregate;
pub mod bounds;
pub mod data;
pub mod error;
pub mod formulation;
pub mod logging;
pub mod lp;
pub mod model;
pub mod orchestrator;
pub mod probes;
pub mod testing;
pub mod utils;

pub use aggregate::{FeatureOutcome, RelevanceClass, RelevanceInterval, RelevanceResult, ThresholdStatistic};
pub use bounds::PresetRange;
pub use data::Dataset;
pub use error::{FriError, FriResult};
pub use logging::{Verbosity, init_logging};
pub use model::{BaselineModel, FriConfig, ProblemKind, RelevanceModel};
pub use probes::ProbeStrategy;
