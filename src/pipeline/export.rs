//! CSV export of scored results.
//!
//! Layout: derived fields first, then the schema features in model order,
//! then the ground-truth column if the upload had one, then any other
//! pass-through columns in upload order.

use crate::error::{PipelineError, PipelineResult};
use crate::schema::FeatureSchema;
use crate::types::ScoredBatch;
use csv::Writer;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Download file name for scored results.
pub const RESULTS_FILE_NAME: &str = "resultados_classificacao.csv";

/// Media type of the exported file.
pub const RESULTS_MEDIA_TYPE: &str = "text/csv";

pub const PREDICTED_CLASS_COLUMN: &str = "Predicted_Class";
pub const PROBABILITY_PCT_COLUMN: &str = "Fraud_Probability_Pct";
pub const PREDICTION_COLUMN: &str = "Prediction";
pub const PROBABILITY_COLUMN: &str = "Fraud_Probability";

/// Columns written by every export; an upload's own copies are replaced.
pub const DERIVED_COLUMNS: [&str; 4] = [
    PREDICTED_CLASS_COLUMN,
    PROBABILITY_PCT_COLUMN,
    PREDICTION_COLUMN,
    PROBABILITY_COLUMN,
];

pub fn is_derived_column(name: &str) -> bool {
    DERIVED_COLUMNS.contains(&name)
}

/// Header row for a scored batch.
pub fn header(batch: &ScoredBatch, schema: &FeatureSchema) -> Vec<String> {
    let mut header: Vec<String> = DERIVED_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.extend(schema.columns().iter().cloned());
    if batch.has_ground_truth() {
        header.push(schema.label_column().to_string());
    }
    header.extend(batch.extra_columns().iter().cloned());
    header
}

/// Encode a scored batch as UTF-8 CSV with a header row.
pub fn encode(batch: &ScoredBatch, schema: &FeatureSchema) -> PipelineResult<Vec<u8>> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(header(batch, schema))?;

    for tx in batch.transactions() {
        let mut row = Vec::with_capacity(DERIVED_COLUMNS.len() + schema.len() + 1);
        row.push(tx.label_text().to_string());
        row.push(format_number(tx.probability_pct()));
        row.push(tx.label.as_u8().to_string());
        row.push(format_number(tx.fraud_probability));
        row.extend(tx.record.features().iter().map(|&v| format_number(v)));
        if batch.has_ground_truth() {
            row.push(
                tx.record
                    .ground_truth
                    .map(|l| l.to_string())
                    .unwrap_or_default(),
            );
        }
        row.extend(tx.record.extras.iter().cloned());
        wtr.write_record(&row)?;
    }

    wtr.into_inner().map_err(|e| {
        let io_err = io::Error::new(e.error().kind(), e.error().to_string());
        PipelineError::Export(csv::Error::from(io_err))
    })
}

/// Write encoded results into `dir`, creating it when needed.
pub fn write_results(dir: &Path, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    fs::write(&path, bytes)?;
    Ok(path)
}

/// Shortest text that parses back to exactly the same value; missing
/// values become empty cells.
fn format_number(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}
