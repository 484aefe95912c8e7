//! Request handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::data::WeatherAverages;
use crate::domain::{ClimateVector, PredictionResult};
use crate::error::ValidationError;
use crate::report::rank;
use crate::server::{ApiError, AppState};

/// Request fields of `POST /predict`, in `ClimateVector` order.
const PREDICT_FIELDS: [&str; 4] = ["temp", "precip", "soil_tmp", "soil_moist"];

/// `POST /predict`: rank crops for the posted climate vector.
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Vec<PredictionResult>>, ApiError> {
    let Json(body) = payload.map_err(|e| ValidationError::MalformedBody(e.body_text()))?;
    let query = parse_climate_query(&body)?;

    // Fitting every crop is CPU-bound; keep it off the async workers.
    let index = Arc::clone(&state.index);
    let options = state.rank;
    let results = tokio::task::spawn_blocking(move || rank(&index, &query, &options))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!(
        crops = state.index.crops().len(),
        returned = results.len(),
        top = results.first().map(|r| r.crop.as_str()).unwrap_or(""),
        "ranked crops"
    );
    Ok(Json(results))
}

/// Turn a `/predict` body into a query vector.
///
/// Any absent or `null` field is reported as `MissingParameters`, before
/// types are checked.
pub fn parse_climate_query(body: &Value) -> Result<ClimateVector, ValidationError> {
    let obj = body
        .as_object()
        .ok_or_else(|| ValidationError::MalformedBody("expected a JSON object".to_string()))?;

    if PREDICT_FIELDS
        .iter()
        .any(|field| matches!(obj.get(*field), None | Some(Value::Null)))
    {
        return Err(ValidationError::MissingParameters);
    }

    let [temp, precip, soil_tmp, soil_moist] = PREDICT_FIELDS;
    Ok(ClimateVector::new(
        number_field(obj, temp)?,
        number_field(obj, precip)?,
        number_field(obj, soil_tmp)?,
        number_field(obj, soil_moist)?,
    ))
}

fn number_field(obj: &Map<String, Value>, name: &'static str) -> Result<f64, ValidationError> {
    obj.get(name)
        .and_then(Value::as_f64)
        .ok_or(ValidationError::NotANumber(name))
}

/// `GET /future_weather?latitude=..&longitude=..`: averaged hourly forecast.
pub async fn future_weather(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<WeatherAverages>, ApiError> {
    let coordinate = |name: &str| {
        params
            .get(name)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    };
    let (Some(latitude), Some(longitude)) = (coordinate("latitude"), coordinate("longitude")) else {
        return Err(ValidationError::MissingCoordinates.into());
    };

    info!(latitude, longitude, "forecast requested");
    let averages = state
        .weather
        .fetch_averages(latitude, longitude)
        .await
        .inspect_err(|e| warn!(error = %e, "forecast request failed"))?;

    Ok(Json(averages))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub crops: usize,
    pub records: usize,
}

/// `GET /health`: liveness plus dataset size.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        crops: state.index.crops().len(),
        records: state.index.n_records(),
    })
}
