//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - shared read-only across request handlers (`CropSeries`, `CropIndex`)
//! - serialized straight into HTTP responses (`PredictionResult`)
//! - selected from the command line or environment (`FeatureMode`, `Solver`)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Number of historical records each per-crop fit is trained on.
pub const TRAINING_ROWS: usize = 3;

/// Default number of crops returned by a ranking.
pub const DEFAULT_TOP_N: usize = 10;

/// Weather and soil covariates for one observation or query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateVector {
    pub temperature: f64,
    pub precipitation: f64,
    pub soil_temperature: f64,
    pub soil_moisture: f64,
}

impl ClimateVector {
    pub fn new(temperature: f64, precipitation: f64, soil_temperature: f64, soil_moisture: f64) -> Self {
        Self {
            temperature,
            precipitation,
            soil_temperature,
            soil_moisture,
        }
    }

    /// Components in canonical order.
    pub fn to_array(self) -> [f64; 4] {
        [
            self.temperature,
            self.precipitation,
            self.soil_temperature,
            self.soil_moisture,
        ]
    }
}

/// One row of the historical source.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalRecord {
    pub crop: String,
    pub yield_value: f64,
    pub climate: ClimateVector,
}

/// All history for one crop, in source order.
///
/// `yields[i]` was observed under `climates[i]`; both vectors always have the
/// same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CropSeries {
    yields: Vec<f64>,
    climates: Vec<ClimateVector>,
}

impl CropSeries {
    pub fn push(&mut self, yield_value: f64, climate: ClimateVector) {
        self.yields.push(yield_value);
        self.climates.push(climate);
    }

    pub fn yields(&self) -> &[f64] {
        &self.yields
    }

    pub fn climates(&self) -> &[ClimateVector] {
        &self.climates
    }

    pub fn len(&self) -> usize {
        self.yields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.yields.is_empty()
    }
}

impl FromIterator<(f64, ClimateVector)> for CropSeries {
    fn from_iter<I: IntoIterator<Item = (f64, ClimateVector)>>(iter: I) -> Self {
        let mut series = CropSeries::default();
        for (y, c) in iter {
            series.push(y, c);
        }
        series
    }
}

/// Distinct crop identities in first-occurrence order.
///
/// A crop's position is its stable id for the lifetime of the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CropIndex {
    names: Vec<String>,
}

impl CropIndex {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn name(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A single ranked crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub id: usize,
    pub crop: String,
    pub predicted_yield: f64,
}

/// Which covariates feed the per-crop regression.
///
/// `Full` is the historical model: three 4-component training rows and a
/// 4-component query, a rank-deficient 3x4 design. `Replica` keeps to the
/// narrower reading that soil moisture never enters the fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FeatureMode {
    /// Train and predict on all four covariates.
    #[default]
    Full,
    /// Train on temperature, precipitation and soil temperature only; the query
    /// is truncated to the same three components.
    Replica,
}

impl FeatureMode {
    pub fn width(self) -> usize {
        match self {
            FeatureMode::Replica => 3,
            FeatureMode::Full => 4,
        }
    }

    /// Feature row for a climate vector under this mode.
    pub fn features(self, climate: &ClimateVector) -> Vec<f64> {
        climate.to_array()[..self.width()].to_vec()
    }
}

/// Regression backend for the per-crop fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Solver {
    /// L1-regularized least squares by coordinate descent.
    #[default]
    Lasso,
    /// Unregularized least squares via SVD.
    Lstsq,
}

/// Per-crop fit settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorOptions {
    pub feature_mode: FeatureMode,
    pub solver: Solver,
    /// L1 penalty strength (Lasso only).
    pub alpha: f64,
    /// Coordinate descent sweep limit.
    pub max_iter: usize,
    /// Convergence tolerance (relative to `‖y‖²`, like the duality-gap test).
    pub tol: f64,
}

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self {
            feature_mode: FeatureMode::Full,
            solver: Solver::Lasso,
            alpha: 1e-30,
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

/// Ranking settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankOptions {
    pub estimator: EstimatorOptions,
    pub top_n: usize,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            estimator: EstimatorOptions::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Forecast proxy settings.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// A full server configuration as understood by `app`.
///
/// This is derived from CLI flags / environment (plus defaults).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_path: PathBuf,
    pub bind: SocketAddr,
    pub rank: RankOptions,
    pub weather: WeatherConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replica_mode_drops_soil_moisture() {
        let c = ClimateVector::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(FeatureMode::Replica.features(&c), vec![1.0, 2.0, 3.0]);
        assert_eq!(FeatureMode::Full.features(&c), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn crop_series_keeps_yields_and_climates_aligned() {
        let series: CropSeries = (0..4)
            .map(|i| (i as f64, ClimateVector::new(i as f64, 0.0, 0.0, 0.0)))
            .collect();
        assert_eq!(series.len(), 4);
        assert_eq!(series.yields().len(), series.climates().len());
        assert_eq!(series.climates()[2].temperature, 2.0);
    }

    #[test]
    fn prediction_result_serializes_with_expected_keys() {
        let r = PredictionResult {
            id: 3,
            crop: "Maize".to_string(),
            predicted_yield: 1.5,
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["id"], 3);
        assert_eq!(v["crop"], "Maize");
        assert_eq!(v["predicted_yield"], 1.5);
    }
}
