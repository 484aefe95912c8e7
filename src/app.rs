//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - initializes logging
//! - loads the dataset index
//! - serves the HTTP API, or runs a one-off ranking / forecast lookup

use clap::Parser;

use crate::cli::{Command, ModelArgs, RankArgs, ServeArgs, WeatherApiArgs, WeatherArgs};
use crate::data::WeatherClient;
use crate::domain::{ClimateVector, EstimatorOptions, RankOptions, ServiceConfig, WeatherConfig};
use crate::error::{AppError, EXIT_CONFIG, EXIT_SERVER};
use crate::server::AppState;

pub mod pipeline;

/// Entry point for the `cropyield` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    crate::logging::init(cli.verbose);

    match cli.command {
        Command::Serve(args) => handle_serve(args),
        Command::Rank(args) => handle_rank(args),
        Command::Weather(args) => handle_weather(args),
    }
}

fn handle_serve(args: ServeArgs) -> Result<(), AppError> {
    let config = service_config_from_args(&args);
    validate_rank_options(&config.rank)?;

    // The dataset must load before any traffic is accepted.
    let index = pipeline::load_index(&config.data_path, &config.rank)?;
    let weather = WeatherClient::new(&config.weather).map_err(|e| AppError::new(EXIT_CONFIG, e.to_string()))?;
    let state = AppState::new(index, config.rank, weather);

    runtime()?.block_on(crate::server::serve(state, config.bind))
}

fn handle_rank(args: RankArgs) -> Result<(), AppError> {
    let options = rank_options_from_args(&args.model);
    validate_rank_options(&options)?;

    let index = pipeline::load_index(&args.model.data_path, &options)?;
    let query = ClimateVector::new(args.temp, args.precip, args.soil_tmp, args.soil_moist);
    let results = crate::report::rank(&index, &query, &options);

    println!("{}", crate::report::format_dataset_summary(&index, &options));
    println!("{}", crate::report::format_rankings(&results, &query));
    Ok(())
}

fn handle_weather(args: WeatherArgs) -> Result<(), AppError> {
    let client = WeatherClient::new(&weather_config_from_args(&args.weather))?;
    let averages = runtime()?.block_on(client.fetch_averages(args.latitude, args.longitude))?;

    println!(
        "{}",
        crate::report::format_weather(args.latitude, args.longitude, &averages)
    );
    Ok(())
}

fn runtime() -> Result<tokio::runtime::Runtime, AppError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::new(EXIT_SERVER, format!("Failed to start async runtime: {e}")))
}

pub fn service_config_from_args(args: &ServeArgs) -> ServiceConfig {
    ServiceConfig {
        data_path: args.model.data_path.clone(),
        bind: args.bind,
        rank: rank_options_from_args(&args.model),
        weather: weather_config_from_args(&args.weather),
    }
}

pub fn rank_options_from_args(args: &ModelArgs) -> RankOptions {
    RankOptions {
        estimator: EstimatorOptions {
            feature_mode: args.feature_mode,
            solver: args.solver,
            alpha: args.alpha,
            max_iter: args.max_iter,
            tol: args.tol,
        },
        top_n: args.top,
    }
}

pub fn weather_config_from_args(args: &WeatherApiArgs) -> WeatherConfig {
    WeatherConfig {
        base_url: args.weather_base_url.clone(),
        timeout: std::time::Duration::from_secs(args.weather_timeout_secs),
    }
}

fn validate_rank_options(options: &RankOptions) -> Result<(), AppError> {
    let est = &options.estimator;
    if !(est.alpha.is_finite() && est.alpha >= 0.0) {
        return Err(AppError::new(EXIT_CONFIG, "Invalid alpha: must be finite and >= 0."));
    }
    if !(est.tol.is_finite() && est.tol > 0.0) {
        return Err(AppError::new(EXIT_CONFIG, "Invalid tol: must be finite and > 0."));
    }
    if est.max_iter == 0 {
        return Err(AppError::new(EXIT_CONFIG, "Invalid max-iter: must be >= 1."));
    }
    if options.top_n == 0 {
        return Err(AppError::new(EXIT_CONFIG, "Invalid top: must be >= 1."));
    }
    Ok(())
}

/// Rewrite argv so `cropyield` defaults to `cropyield serve`.
///
/// Rules:
/// - `cropyield`                        -> `cropyield serve`
/// - `cropyield --bind 0.0.0.0:80 ...`  -> `cropyield serve --bind 0.0.0.0:80 ...`
/// - `cropyield --help/--version/-h`    -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("serve".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "serve" | "rank" | "weather");
    if is_subcommand {
        return argv;
    }

    // Global verbosity flags may precede the subcommand.
    let first_non_verbose = argv
        .iter()
        .skip(1)
        .position(|a| !is_verbose_flag(a))
        .map(|p| p + 1);
    match first_non_verbose {
        None => argv.push("serve".to_string()),
        Some(idx) if matches!(argv[idx].as_str(), "serve" | "rank" | "weather") => {}
        Some(idx) if argv[idx].starts_with('-') => argv.insert(idx, "serve".to_string()),
        Some(_) => {}
    }
    argv
}

fn is_verbose_flag(arg: &str) -> bool {
    arg == "--verbose" || (arg.len() > 1 && arg.starts_with('-') && arg[1..].chars().all(|c| c == 'v'))
}
