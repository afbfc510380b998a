//! Export acquired fares to the output CSV artifact.
//!
//! Fixed columns come first, followed by every price-metric label seen in the
//! run (first-appearance order). Rows from units without metrics leave those
//! cells empty. A label that clashes with a fixed column is written as
//! `metric_<label>`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;

use crate::domain::{FIXED_COLUMNS, FareRecord};
use crate::error::AppError;

/// `flight_prices_<YYYY-MM-DD>.csv`
pub fn artifact_file_name(acquired_on: NaiveDate) -> String {
    format!("flight_prices_{}.csv", acquired_on.format("%Y-%m-%d"))
}

/// Union of metric labels over all records, in first-appearance order.
pub fn metric_columns(records: &[FareRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for label in record.metrics.labels() {
            if !columns.iter().any(|c| c == label) {
                columns.push(label.to_string());
            }
        }
    }
    columns
}

/// Header cell for a metric label.
pub fn metric_header(label: &str) -> String {
    if FIXED_COLUMNS.contains(&label) {
        format!("metric_{label}")
    } else {
        label.to_string()
    }
}

pub fn write_fares<W: Write>(writer: W, records: &[FareRecord]) -> Result<(), csv::Error> {
    let metrics = metric_columns(records);
    let mut out = csv::Writer::from_writer(writer);

    let header = FIXED_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(metrics.iter().map(|label| metric_header(label)));
    out.write_record(header)?;

    for record in records {
        let fixed = record.fixed_cells();
        let extra = metrics
            .iter()
            .map(|label| record.metrics.get(label).unwrap_or_default().to_string());
        out.write_record(fixed.into_iter().chain(extra))?;
    }

    out.flush()?;
    Ok(())
}

/// Write the artifact to `path`. The header is written even with no records.
pub fn write_fares_csv(path: &Path, records: &[FareRecord]) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::output(format!("Failed to create output CSV '{}': {e}", path.display()))
    })?;
    write_fares(file, records)
        .map_err(|e| AppError::output(format!("Failed to write output CSV '{}': {e}", path.display())))
}
