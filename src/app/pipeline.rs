//! Shared dataset workflow used by both the `serve` and `rank` front-ends.
//!
//! Keeping this in one place avoids duplicating the startup steps:
//! CSV load -> feature column check -> row-error reporting -> summary logging
//!
//! The front-ends can then focus on presentation (HTTP vs printed table).

use std::path::Path;

use tracing::{info, warn};

use crate::domain::{FeatureMode, RankOptions};
use crate::error::{AppError, DataLoadError};
use crate::io::{COL_SOIL_MOIST, DatasetIndex, load_dataset};

/// Row errors listed individually before switching to a count.
const MAX_LOGGED_ROW_ERRORS: usize = 20;

/// Load the dataset, check it suits the options, and log what was skipped.
pub fn load_index(path: &Path, options: &RankOptions) -> Result<DatasetIndex, AppError> {
    let index = load_dataset(path)?;
    check_feature_columns(&index, options)?;
    let stats = index.stats();

    for e in index.row_errors().iter().take(MAX_LOGGED_ROW_ERRORS) {
        warn!(line = e.line, "skipped row: {}", e.message);
    }
    if index.row_errors().len() > MAX_LOGGED_ROW_ERRORS {
        warn!(
            more = index.row_errors().len() - MAX_LOGGED_ROW_ERRORS,
            "further skipped rows not listed"
        );
    }
    if stats.missing_values > 0 {
        warn!(
            cells = stats.missing_values,
            "blank or non-numeric values kept as NaN; crops with one in their first records rank at zero"
        );
    }

    info!(
        path = %path.display(),
        rows = stats.rows_used,
        crops = stats.n_crops,
        short_crops = stats.n_short_crops,
        "dataset loaded"
    );

    Ok(index)
}

/// Full mode trains on soil moisture, so the column must exist.
pub fn check_feature_columns(index: &DatasetIndex, options: &RankOptions) -> Result<(), DataLoadError> {
    if options.estimator.feature_mode == FeatureMode::Full && !index.has_soil_moisture() {
        return Err(DataLoadError::MissingColumn(COL_SOIL_MOIST));
    }
    Ok(())
}
