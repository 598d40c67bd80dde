//! High-level estimator API.
//!
//! - [`FriConfig`]: validated configuration built with `bon`
//! - [`BaselineModel`]: the fitted (or supplied) reference model
//! - [`RelevanceModel`]: fits a baseline and computes relevance intervals
//!
//! # Example
//!
//! ```
//! use fri::data::Dataset;
//! use fri::model::{FriConfig, ProblemKind, RelevanceModel};
//! use ndarray::{Array1, Array2};
//!
//! let x = Array2::from_shape_fn((10, 2), |(i, j)| if j == 0 { i as f64 } else { 1.0 });
//! let y = Array1::from_shape_fn(10, |i| 2.0 * i as f64);
//! let dataset = Dataset::new(x, y).unwrap();
//!
//! let config = FriConfig::builder()
//!     .problem(ProblemKind::Regression)
//!     .n_probe_features(5)
//!     .build()
//!     .unwrap();
//! let model = RelevanceModel::fit(&dataset, config).unwrap();
//! println!("{}", model.result());
//! ```

mod baseline;
mod config;
mod problem;
mod relevance;
mod score;

pub use baseline::{BaselineModel, BaselineParams};
pub use config::{ConfigError, FriConfig, FriConfigBuilder};
pub use problem::ProblemKind;
pub use relevance::{ProbeBounds, RelevanceModel};
pub use score::{OrdinalErrorType, r2_score, weighted_f1};
