//! Formatted terminal output for the CLI subcommands.
//!
//! We keep formatting code in one place so:
//! - the fitting/ranking code stays clean and testable
//! - output changes are localized

use crate::data::WeatherAverages;
use crate::domain::{ClimateVector, PredictionResult, RankOptions};
use crate::io::DatasetIndex;

/// Format the dataset summary printed before a CLI ranking.
pub fn format_dataset_summary(index: &DatasetIndex, options: &RankOptions) -> String {
    let stats = index.stats();
    let mut out = String::new();

    out.push_str("=== cropyield - crop ranking ===\n");
    out.push_str(&format!(
        "Rows: read={} used={} skipped={} | missing values={}\n",
        stats.rows_read,
        stats.rows_used,
        index.row_errors().len(),
        stats.missing_values
    ));
    out.push_str(&format!(
        "Crops: n={} | under 3 records={}\n",
        stats.n_crops, stats.n_short_crops
    ));
    out.push_str(&format!(
        "Model: {:?} | features={:?} | alpha={:e}\n",
        options.estimator.solver, options.estimator.feature_mode, options.estimator.alpha
    ));

    out
}

/// Format a ranking table.
pub fn format_rankings(results: &[PredictionResult], query: &ClimateVector) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Query: temp={} precip={} soil_tmp={} soil_moist={}\n\n",
        query.temperature, query.precipitation, query.soil_temperature, query.soil_moisture
    ));

    out.push_str(format!("{:>4} {:>6} {:<32} {:>16}\n", "rank", "id", "crop", "predicted_yield").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<4} {:-<6} {:-<32} {:-<16}\n", "", "", "", "").trim_end());
    out.push('\n');

    for (pos, r) in results.iter().enumerate() {
        out.push_str(
            format!(
                "{:>4} {:>6} {:<32} {:>16.4}\n",
                pos + 1,
                r.id,
                truncate(&r.crop, 32),
                r.predicted_yield
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Format averaged forecast figures.
pub fn format_weather(latitude: f64, longitude: f64, averages: &WeatherAverages) -> String {
    let mut out = String::new();
    out.push_str(&format!("Forecast averages at ({latitude}, {longitude}):\n"));
    out.push_str(&format!("- temperature      : {:.3} °F\n", averages.average_temperature));
    out.push_str(&format!("- precipitation    : {:.4} in\n", averages.average_precipitation));
    out.push_str(&format!("- soil temperature : {:.3} °F\n", averages.average_soil_temperature));
    out.push_str(&format!("- soil moisture    : {:.4} m³/m³\n", averages.average_soil_moisture));
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
