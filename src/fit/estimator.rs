//! Per-crop regression.
//!
//! Given one crop's history and a query climate vector, we:
//! - take the first `TRAINING_ROWS` records as the training set
//! - build a design row per record according to the `FeatureMode`
//! - fit a linear model with intercept (Lasso or least squares)
//! - evaluate it at the query
//!
//! The estimator is a pure function of its inputs; there is no shared state, so
//! crops can be fitted in parallel.

use nalgebra::{DMatrix, DVector};

use crate::domain::{ClimateVector, CropSeries, EstimatorOptions, Solver, TRAINING_ROWS};
use crate::error::EstimationError;
use crate::math::{Centered, LassoParams, LinearFit, fit_lasso, solve_least_squares};

/// A fitted per-crop model.
#[derive(Debug, Clone)]
pub struct CropModel {
    fit: LinearFit,
    options: EstimatorOptions,
}

impl CropModel {
    pub fn coefficients(&self) -> &[f64] {
        self.fit.coef.as_slice()
    }

    pub fn intercept(&self) -> f64 {
        self.fit.intercept
    }

    /// Predict a yield for a full climate vector.
    ///
    /// In `FeatureMode::Replica` the query is cut down to the trained width.
    pub fn predict(&self, query: &ClimateVector) -> Result<f64, EstimationError> {
        self.predict_features(&self.options.feature_mode.features(query))
    }

    /// Predict from a raw feature row, which must match the trained width.
    pub fn predict_features(&self, features: &[f64]) -> Result<f64, EstimationError> {
        if features.iter().any(|v| !v.is_finite()) {
            return Err(EstimationError::NonFiniteInput("query"));
        }
        let value = self
            .fit
            .predict(features)
            .ok_or(EstimationError::DimensionMismatch {
                expected: self.fit.n_features(),
                got: features.len(),
            })?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EstimationError::NonFinitePrediction)
        }
    }
}

/// Fit a crop's model from the first `TRAINING_ROWS` records of its history.
pub fn fit_crop(series: &CropSeries, options: &EstimatorOptions) -> Result<CropModel, EstimationError> {
    if series.len() < TRAINING_ROWS {
        return Err(EstimationError::InsufficientHistory {
            need: TRAINING_ROWS,
            have: series.len(),
        });
    }

    let mode = options.feature_mode;
    let p = mode.width();

    let mut x = DMatrix::<f64>::zeros(TRAINING_ROWS, p);
    for (i, climate) in series.climates()[..TRAINING_ROWS].iter().enumerate() {
        for (j, v) in mode.features(climate).into_iter().enumerate() {
            x[(i, j)] = v;
        }
    }
    let y = DVector::from_row_slice(&series.yields()[..TRAINING_ROWS]);

    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(EstimationError::NonFiniteInput("training data"));
    }

    let centered = Centered::new(&x, &y);
    if centered.is_degenerate() {
        return Err(EstimationError::SingularDesign);
    }

    let fit = match options.solver {
        Solver::Lasso => fit_lasso(
            &centered,
            &LassoParams {
                alpha: options.alpha,
                max_iter: options.max_iter,
                tol: options.tol,
            },
        ),
        Solver::Lstsq => {
            let coef = solve_least_squares(&centered.x, &centered.y).ok_or(EstimationError::SingularDesign)?;
            centered.finish(coef)
        }
    };

    Ok(CropModel {
        fit,
        options: *options,
    })
}

/// Fit a crop and predict its yield for `query`.
pub fn estimate(
    series: &CropSeries,
    query: &ClimateVector,
    options: &EstimatorOptions,
) -> Result<f64, EstimationError> {
    fit_crop(series, options)?.predict(query)
}
