//! CSV ingest and crop grouping.
//!
//! This module turns the historical yield CSV into a `DatasetIndex`: the
//! ordered set of distinct crops plus, per crop, its yields and climate
//! vectors in source row order.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear `DataLoadError`)
//! - **Row-level validation**: rows without a crop label are skipped and
//!   reported; unparsable numeric cells stay in place as `NaN`, so every row
//!   keeps its position in the crop's history
//! - **Deterministic behavior**: crop ids follow first-occurrence order
//! - **Separation of concerns**: no fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{ClimateVector, CropIndex, CropSeries, HistoricalRecord, TRAINING_ROWS};
use crate::error::DataLoadError;

const COL_CROP: &str = "item";
const COL_VALUE: &str = "value";
const COL_TEMP: &str = "median_temp";
const COL_PRECIP: &str = "med_precip";
const COL_SOIL_TMP: &str = "med_soil_tmp";
pub const COL_SOIL_MOIST: &str = "med_soil_moist";

const REQUIRED_COLUMNS: [&str; 5] = [COL_CROP, COL_VALUE, COL_TEMP, COL_PRECIP, COL_SOIL_TMP];

/// A source row skipped during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Summary stats about the loaded dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub rows_read: usize,
    pub rows_used: usize,
    pub n_crops: usize,
    /// Crops with fewer records than a fit needs; they always rank at zero.
    pub n_short_crops: usize,
    /// Numeric cells that were blank or unparsable and are held as `NaN`.
    pub missing_values: usize,
}

/// Historical data grouped by crop.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetIndex {
    crops: CropIndex,
    series: Vec<CropSeries>,
    has_soil_moisture: bool,
    stats: DatasetStats,
    row_errors: Vec<RowError>,
}

impl DatasetIndex {
    /// Group records by crop, preserving first-occurrence order of crops and
    /// source order within each crop.
    pub fn from_records(records: &[HistoricalRecord], has_soil_moisture: bool) -> Self {
        let mut ids: HashMap<&str, usize> = HashMap::new();
        let mut names = Vec::new();
        let mut series: Vec<CropSeries> = Vec::new();

        for record in records {
            let id = *ids.entry(record.crop.as_str()).or_insert_with(|| {
                names.push(record.crop.clone());
                series.push(CropSeries::default());
                names.len() - 1
            });
            series[id].push(record.yield_value, record.climate);
        }

        let stats = DatasetStats {
            rows_read: records.len(),
            rows_used: records.len(),
            n_crops: names.len(),
            n_short_crops: series.iter().filter(|s| s.len() < TRAINING_ROWS).count(),
            missing_values: 0,
        };

        Self {
            crops: CropIndex::new(names),
            series,
            has_soil_moisture,
            stats,
            row_errors: Vec::new(),
        }
    }

    pub fn crops(&self) -> &CropIndex {
        &self.crops
    }

    pub fn series(&self, crop_id: usize) -> Option<&CropSeries> {
        self.series.get(crop_id)
    }

    /// Per-crop series, indexed by crop id.
    pub fn all_series(&self) -> &[CropSeries] {
        &self.series
    }

    /// `(crop_id, name, series)` in crop id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str, &CropSeries)> {
        self.crops
            .names()
            .iter()
            .zip(self.series.iter())
            .enumerate()
            .map(|(id, (name, series))| (id, name.as_str(), series))
    }

    pub fn has_soil_moisture(&self) -> bool {
        self.has_soil_moisture
    }

    pub fn stats(&self) -> &DatasetStats {
        &self.stats
    }

    pub fn row_errors(&self) -> &[RowError] {
        &self.row_errors
    }

    pub fn n_records(&self) -> usize {
        self.stats.rows_used
    }
}

/// Load the dataset CSV at `path`.
pub fn load_dataset(path: &Path) -> Result<DatasetIndex, DataLoadError> {
    let file = File::open(path).map_err(|source| DataLoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_reader(file)
}

/// Load a dataset from any CSV reader (header row required).
pub fn load_from_reader<R: Read>(reader: R) -> Result<DatasetIndex, DataLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| DataLoadError::Header(e.to_string()))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;
    let has_soil_moisture = header_map.contains_key(COL_SOIL_MOIST);

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut missing_values = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map, has_soil_moisture) {
            Ok((row, missing)) => {
                missing_values += missing;
                records.push(row);
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if records.is_empty() {
        return Err(DataLoadError::Empty {
            rows_read,
            skipped: row_errors.len(),
        });
    }

    let mut index = DatasetIndex::from_records(&records, has_soil_moisture);
    index.stats.rows_read = rows_read;
    index.stats.missing_values = missing_values;
    index.row_errors = row_errors;
    Ok(index)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), DataLoadError> {
    for name in REQUIRED_COLUMNS {
        if !header_map.contains_key(name) {
            return Err(DataLoadError::MissingColumn(name));
        }
    }
    Ok(())
}

/// Parse one data row.
///
/// Only a missing crop label rejects the row. A blank or unparsable number
/// becomes `NaN` so the record still occupies its slot in the crop's source
/// order; the estimator rejects it if it lands in the training window.
fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    has_soil_moisture: bool,
) -> Result<(HistoricalRecord, usize), String> {
    let crop = get_required(record, header_map, COL_CROP)?.to_string();

    let mut missing = 0usize;
    let mut number = |name: &str| match get_required(record, header_map, name).ok().and_then(parse_f64) {
        Some(v) => v,
        None => {
            missing += 1;
            f64::NAN
        }
    };

    let yield_value = number(COL_VALUE);
    let temperature = number(COL_TEMP);
    let precipitation = number(COL_PRECIP);
    let soil_temperature = number(COL_SOIL_TMP);
    let soil_moisture = if has_soil_moisture {
        number(COL_SOIL_MOIST)
    } else {
        f64::NAN
    };

    let row = HistoricalRecord {
        crop,
        yield_value,
        climate: ClimateVector::new(temperature, precipitation, soil_temperature, soil_moisture),
    };
    Ok((row, missing))
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_f64(s: &str) -> Option<f64> {
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
