//! Human-readable run summaries.

use std::path::Path;

use crate::app::pipeline::{Acquisition, UnitOutcome};
use crate::fares::MetricsStatus;
use crate::storage::UploadOutcome;

/// Status message sent after storage attempts complete.
pub fn format_status_message(quotes: usize, uploads: &[UploadOutcome]) -> String {
    let mut out = String::new();
    out.push_str("Flight prices acquisition.\n");
    out.push_str(&format!("Acquired {quotes} quotes."));
    for upload in uploads {
        out.push_str(&format!("\n{} upload: {}", upload.target, upload.success));
    }
    out
}

/// One-paragraph terminal summary of an acquisition run.
pub fn format_run_summary(acquisition: &Acquisition, artifact: &Path) -> String {
    let units = acquisition.units.len();
    let failed = acquisition.failed_units();
    let mut dropped_batches = 0usize;
    let mut without_metrics = 0usize;
    for unit in &acquisition.units {
        if let UnitOutcome::Complete {
            dropped_batches: d,
            metrics,
            ..
        } = &unit.outcome
        {
            dropped_batches += d;
            if matches!(metrics, MetricsStatus::Unavailable(_)) {
                without_metrics += 1;
            }
        }
    }

    format!(
        "Acquired {} quotes over {units} route windows ({failed} failed, {dropped_batches} pricing batches dropped, {without_metrics} without price metrics).\nWrote {}",
        acquisition.records.len(),
        artifact.display()
    )
}
