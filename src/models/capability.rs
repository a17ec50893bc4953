//! Scoring model capability consumed by the pipeline.

use anyhow::Result;
use ndarray::{Array2, ArrayView2};

/// Column of `predict_proba` holding the fraud (positive-class) probability.
pub const POSITIVE_CLASS: usize = 1;

/// A pre-trained binary classifier.
///
/// Rows are always passed in feature-schema order. Implementations must be
/// free of side effects visible to the caller and deterministic for equal
/// input; the pipeline relies on both and never retries.
pub trait ScoringModel: Send + Sync {
    /// Model name used in logs and error reports.
    fn name(&self) -> &str;

    /// Predicted class per row (expected to be 0 or 1).
    fn predict(&self, rows: ArrayView2<'_, f64>) -> Result<Vec<i64>>;

    /// Class probabilities per row, one column per class.
    fn predict_proba(&self, rows: ArrayView2<'_, f64>) -> Result<Array2<f64>>;
}
