//! HTTP service.
//!
//! Routes:
//!
//! - `POST /predict`: ranked crops for a climate vector
//! - `GET /future_weather`: averaged hourly forecast for a coordinate pair
//! - `GET /health`: liveness + dataset size
//!
//! The dataset index is built before the router and shared read-only through
//! `AppState`; handlers never mutate it.

pub mod error;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::data::WeatherClient;
use crate::domain::RankOptions;
use crate::error::{AppError, EXIT_SERVER};
use crate::io::DatasetIndex;

pub use error::ApiError;

/// Shared, read-only state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub index: Arc<DatasetIndex>,
    pub rank: RankOptions,
    pub weather: WeatherClient,
}

impl AppState {
    pub fn new(index: DatasetIndex, rank: RankOptions, weather: WeatherClient) -> Self {
        Self {
            index: Arc::new(index),
            rank,
            weather,
        }
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/future_weather", get(handlers::future_weather))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::new(EXIT_SERVER, format!("Failed to bind {addr}: {e}")))?;

    info!(%addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::new(EXIT_SERVER, format!("Server error: {e}")))?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available: run until the process is killed.
        std::future::pending::<()>().await;
    }
}
