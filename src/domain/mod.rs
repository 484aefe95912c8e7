//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - historical observations (`HistoricalRecord`, `CropSeries`, `CropIndex`)
//! - query and output shapes (`ClimateVector`, `PredictionResult`)
//! - fit and service configuration (`FeatureMode`, `Solver`, `EstimatorOptions`, `ServiceConfig`)

pub mod types;

pub use types::*;
