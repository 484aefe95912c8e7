//! Ranking: per-crop predictions, ordered by predicted yield.

pub mod format;

use std::cmp::Ordering;

use rayon::prelude::*;
use tracing::debug;

use crate::domain::{ClimateVector, PredictionResult, RankOptions};
use crate::error::EstimationError;
use crate::fit::estimate;
use crate::io::DatasetIndex;

pub use format::*;

/// Collapse a per-crop estimation outcome into a ranking score.
///
/// Failures score `0.0`: a crop that cannot be fitted still appears in the
/// ranking instead of being excluded.
pub fn yield_or_zero(crop: &str, outcome: Result<f64, EstimationError>) -> f64 {
    match outcome {
        Ok(value) => value,
        Err(err) => {
            debug!(crop, error = %err, "estimation failed; scoring as zero");
            0.0
        }
    }
}

/// Score every crop as `(predicted_yield, crop_id)`, in crop id order.
pub fn score_crops(index: &DatasetIndex, query: &ClimateVector, options: &RankOptions) -> Vec<(f64, usize)> {
    let names = index.crops().names();
    index
        .all_series()
        .par_iter()
        .enumerate()
        .map(|(id, series)| {
            let outcome = estimate(series, query, &options.estimator);
            (yield_or_zero(&names[id], outcome), id)
        })
        .collect()
}

/// Rank crops by predicted yield (descending) and keep the top `options.top_n`.
///
/// The sort is stable, so equal scores keep crop id order.
pub fn rank(index: &DatasetIndex, query: &ClimateVector, options: &RankOptions) -> Vec<PredictionResult> {
    let mut scored = score_crops(index, query, options);
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    scored
        .into_iter()
        .take(options.top_n)
        .filter_map(|(predicted_yield, id)| {
            index.crops().name(id).map(|crop| PredictionResult {
                id,
                crop: crop.to_string(),
                predicted_yield,
            })
        })
        .collect()
}
