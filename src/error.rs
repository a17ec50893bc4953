//! Error taxonomy for a scoring run.

use std::collections::BTreeSet;
use thiserror::Error;

/// Result alias used throughout the pipeline stages.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Failure of a single pipeline run. Every variant is scoped to the run that
/// produced it; the shared model and dataset are never left modified.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read transaction batch: {0}")]
    Parse(#[from] ParseError),

    #[error("incomplete file, missing columns: {}", join_columns(.missing))]
    Schema { missing: BTreeSet<String> },

    #[error("batch contains no transactions")]
    EmptyBatch,

    #[error("classification failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("failed to encode results: {0}")]
    Export(#[from] csv::Error),

    #[error("cannot handle `{event}` while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },
}

impl PipelineError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Parse(_) => "parse",
            PipelineError::Schema { .. } => "schema",
            PipelineError::EmptyBatch => "empty_batch",
            PipelineError::Inference(_) => "inference",
            PipelineError::Export(_) => "export",
            PipelineError::InvalidTransition { .. } => "invalid_transition",
        }
    }

    /// Missing columns, when this is a schema failure.
    pub fn missing_columns(&self) -> Option<&BTreeSet<String>> {
        match self {
            PipelineError::Schema { missing } => Some(missing),
            _ => None,
        }
    }
}

/// The uploaded file is not valid tabular text.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("file has no header row")]
    MissingHeader,

    #[error("column `{0}` appears more than once in the header")]
    DuplicateColumn(String),

    #[error("line {line}: column `{column}` has non-numeric value `{value}`")]
    InvalidNumber {
        line: u64,
        column: String,
        value: String,
    },

    #[error("line {line}: label column `{column}` must be 0 or 1, got `{value}`")]
    InvalidLabel {
        line: u64,
        column: String,
        value: String,
    },
}

/// The scoring capability failed or returned an inconsistent result.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model `{model}` failed in {operation}")]
    Model {
        model: String,
        operation: &'static str,
        #[source]
        cause: anyhow::Error,
    },

    #[error("{operation} returned {actual} results for {expected} rows")]
    LengthMismatch {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("row {row}: predicted label {label} is not 0 or 1")]
    InvalidLabel { row: usize, label: i64 },

    #[error("row {row}: fraud probability {probability} is outside [0, 1]")]
    ProbabilityOutOfRange { row: usize, probability: f64 },

    #[error("probability matrix has no class columns")]
    MissingPositiveClass,
}

fn join_columns(columns: &BTreeSet<String>) -> String {
    columns.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
