use tracing_subscriber::EnvFilter;

/// Targets that receive the verbosity-derived level.
const CRATE_TARGETS: &[&str] = &["crop_yield", "cropyield", "tower_http"];

/// Initialize tracing based on CLI verbosity level.
///
/// Mapping:
/// - 0 (none) -> info
/// - 1 (-v)   -> debug
/// - 2+ (-vv) -> trace
///
/// `RUST_LOG` env var overrides the CLI flag if set.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let default_filter: String = CRATE_TARGETS
        .iter()
        .map(|t| format!("{t}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // `try_init` so repeated initialization (tests, embedding) is harmless.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
