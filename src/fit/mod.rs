//! Per-crop fitting.
//!
//! Responsibilities:
//!
//! - assemble the fixed training subset for one crop
//! - fit the configured linear model
//! - evaluate it at the query climate vector

pub mod estimator;

pub use estimator::*;
