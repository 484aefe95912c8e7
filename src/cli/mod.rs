//! Command-line parsing for the crop-yield ranking service.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting and serving code. Every model/dataset option can also be supplied
//! through the environment (or a `.env` file), which is how the service is
//! normally configured when deployed.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_TOP_N, FeatureMode, Solver};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "cropyield", version, about = "Crop yield ranking service")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the dataset and serve the HTTP API.
    Serve(ServeArgs),
    /// Rank crops for one climate vector and print the table.
    Rank(RankArgs),
    /// Fetch and print averaged forecast figures for a coordinate pair.
    Weather(WeatherArgs),
}

/// Dataset and model options shared by `serve` and `rank`.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Historical yield CSV.
    #[arg(short = 'd', long = "data", env = "CROP_DATA_PATH", default_value = "data/crop_yields.csv")]
    pub data_path: PathBuf,

    /// Which covariates feed the per-crop fit.
    #[arg(long, env = "CROP_FEATURE_MODE", value_enum, default_value_t = FeatureMode::Full)]
    pub feature_mode: FeatureMode,

    /// Regression backend.
    #[arg(long, env = "CROP_SOLVER", value_enum, default_value_t = Solver::Lasso)]
    pub solver: Solver,

    /// L1 penalty strength for the Lasso solver.
    #[arg(long, env = "CROP_ALPHA", default_value_t = 1e-30)]
    pub alpha: f64,

    /// Maximum coordinate descent sweeps.
    #[arg(long, env = "CROP_MAX_ITER", default_value_t = 1000)]
    pub max_iter: usize,

    /// Coordinate descent convergence tolerance.
    #[arg(long, env = "CROP_TOL", default_value_t = 1e-4)]
    pub tol: f64,

    /// Number of crops returned per ranking.
    #[arg(long, env = "CROP_TOP", default_value_t = DEFAULT_TOP_N)]
    pub top: usize,
}

/// Forecast API options.
#[derive(Debug, Args, Clone)]
pub struct WeatherApiArgs {
    /// Forecast API base URL.
    #[arg(long, env = "WEATHER_BASE_URL", default_value = "https://api.open-meteo.com")]
    pub weather_base_url: String,

    /// Forecast request timeout (seconds).
    #[arg(long, env = "WEATHER_TIMEOUT_SECS", default_value_t = 10)]
    pub weather_timeout_secs: u64,
}

#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(short, long, env = "CROP_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub weather: WeatherApiArgs,
}

#[derive(Debug, Args, Clone)]
pub struct RankArgs {
    /// Air temperature.
    #[arg(long, allow_negative_numbers = true)]
    pub temp: f64,

    /// Precipitation.
    #[arg(long)]
    pub precip: f64,

    /// Soil temperature.
    #[arg(long, allow_negative_numbers = true)]
    pub soil_tmp: f64,

    /// Soil moisture.
    #[arg(long)]
    pub soil_moist: f64,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Debug, Args, Clone)]
pub struct WeatherArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub longitude: f64,

    #[command(flatten)]
    pub weather: WeatherApiArgs,
}
