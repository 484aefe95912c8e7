//! Open-Meteo forecast integration.
//!
//! We request hourly temperature, precipitation, soil temperature and soil
//! moisture for a coordinate pair and reduce each series to its mean. The
//! averages line up with the inputs of `POST /predict`.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::WeatherConfig;
use crate::error::UpstreamError;

const FORECAST_PATH: &str = "/v1/forecast";
const HOURLY_VARIABLES: &str = "temperature_2m,precipitation,soil_temperature_0cm,soil_moisture_0_to_1cm";

/// Mean of each hourly forecast series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAverages {
    pub average_temperature: f64,
    pub average_precipitation: f64,
    pub average_soil_temperature: f64,
    pub average_soil_moisture: f64,
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    forecast_url: String,
}

impl WeatherClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpstreamError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            forecast_url: format!("{}{FORECAST_PATH}", config.base_url.trim_end_matches('/')),
        })
    }

    /// Fetch the hourly forecast at `(latitude, longitude)` and average it.
    pub async fn fetch_averages(&self, latitude: f64, longitude: f64) -> Result<WeatherAverages, UpstreamError> {
        let latitude = latitude.to_string();
        let longitude = longitude.to_string();

        let resp = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("hourly", HOURLY_VARIABLES),
                ("temperature_unit", "fahrenheit"),
                ("wind_speed_unit", "mph"),
                ("precipitation_unit", "inch"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: ForecastResponse = resp.json().await?;
        debug!(hours = body.hourly.temperature_2m.len(), "forecast received");
        body.hourly.averages()
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: HourlySeries,
}

/// Hourly series; Open-Meteo reports unavailable hours as `null`.
#[derive(Debug, Deserialize)]
struct HourlySeries {
    temperature_2m: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
    soil_temperature_0cm: Vec<Option<f64>>,
    soil_moisture_0_to_1cm: Vec<Option<f64>>,
}

impl HourlySeries {
    fn averages(&self) -> Result<WeatherAverages, UpstreamError> {
        Ok(WeatherAverages {
            average_temperature: series_mean("temperature_2m", &self.temperature_2m)?,
            average_precipitation: series_mean("precipitation", &self.precipitation)?,
            average_soil_temperature: series_mean("soil_temperature_0cm", &self.soil_temperature_0cm)?,
            average_soil_moisture: series_mean("soil_moisture_0_to_1cm", &self.soil_moisture_0_to_1cm)?,
        })
    }
}

/// Arithmetic mean over the non-null entries of a series.
fn series_mean(name: &'static str, values: &[Option<f64>]) -> Result<f64, UpstreamError> {
    let present: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    if present.is_empty() {
        return Err(UpstreamError::EmptySeries(name));
    }
    Ok(present.iter().sum::<f64>() / present.len() as f64)
}
