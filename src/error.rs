//! Error types.
//!
//! `AppError` is the process-level error: it carries the exit code used by
//! `main`. The remaining enums describe failures inside a single layer:
//!
//! - `DataLoadError`: the historical dataset could not be loaded (fatal at startup)
//! - `EstimationError`: a single crop could not be fitted (recovered by the ranker)
//! - `ValidationError`: request input was missing or malformed (HTTP 400)
//! - `UpstreamError`: the forecast API failed (HTTP 500)

use std::path::PathBuf;

/// Exit code for configuration and dataset errors.
pub const EXIT_CONFIG: u8 = 2;
/// Exit code for forecast API failures in CLI mode.
pub const EXIT_UPSTREAM: u8 = 4;
/// Exit code for server runtime failures (bind, serve).
pub const EXIT_SERVER: u8 = 5;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<DataLoadError> for AppError {
    fn from(err: DataLoadError) -> Self {
        AppError::new(EXIT_CONFIG, err.to_string())
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        AppError::new(EXIT_UPSTREAM, err.to_string())
    }
}

/// Failure to build the dataset index.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("failed to open dataset '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read dataset header: {0}")]
    Header(String),

    #[error("missing required column: `{0}`")]
    MissingColumn(&'static str),

    #[error("no valid rows in dataset ({rows_read} read, {skipped} skipped)")]
    Empty { rows_read: usize, skipped: usize },
}

/// Failure to fit or evaluate one crop's regression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimationError {
    #[error("need at least {need} historical records, have {have}")]
    InsufficientHistory { need: usize, have: usize },

    #[error("design matrix is singular")]
    SingularDesign,

    #[error("query has {got} features, model expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("non-finite value in {0}")]
    NonFiniteInput(&'static str),

    #[error("model produced a non-finite prediction")]
    NonFinitePrediction,
}

/// Request input that cannot be turned into a query.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing parameters")]
    MissingParameters,

    #[error("Invalid parameter `{0}`: expected a number")]
    NotANumber(&'static str),

    #[error("Invalid request body: {0}")]
    MalformedBody(String),

    #[error("Missing latitude or longitude")]
    MissingCoordinates,
}

/// Failure talking to the forecast API.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("forecast request failed: {0}")]
    Request(String),

    #[error("forecast request timed out: {0}")]
    Timeout(String),

    #[error("forecast request failed with status {0}")]
    Status(u16),

    #[error("failed to parse forecast response: {0}")]
    Decode(String),

    #[error("forecast series `{0}` has no values")]
    EmptySeries(&'static str),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            UpstreamError::Status(status.as_u16())
        } else if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Request(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_parameters_message_is_stable() {
        assert_eq!(
            ValidationError::MissingParameters.to_string(),
            "Missing parameters"
        );
    }

    #[test]
    fn data_load_error_maps_to_config_exit_code() {
        let err: AppError = DataLoadError::MissingColumn("item").into();
        assert_eq!(err.exit_code(), EXIT_CONFIG);
        assert_eq!(err.to_string(), "missing required column: `item`");
    }

    #[test]
    fn upstream_error_maps_to_upstream_exit_code() {
        let err: AppError = UpstreamError::Status(503).into();
        assert_eq!(err.exit_code(), EXIT_UPSTREAM);
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn estimation_error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<EstimationError>();
        assert_impl::<DataLoadError>();
        assert_impl::<UpstreamError>();
    }
}
