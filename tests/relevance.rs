//! Integration tests grouped by concern.

mod common;

#[path = "relevance/scenarios.rs"]
mod scenarios;

#[path = "relevance/properties.rs"]
mod properties;

#[path = "relevance/errors.rs"]
mod errors;
