//! Dataset container and label encoding.
//!
//! - [`Dataset`]: validated `[n_samples, n_features]` matrix plus targets
//! - [`encode_binary`] / [`encode_ordinal`]: label preparation for the
//!   classification and ordinal formulations

mod dataset;
mod labels;

pub use dataset::{Dataset, DatasetError};
pub use labels::{BinaryLabels, OrdinalLabels, encode_binary, encode_ordinal};
