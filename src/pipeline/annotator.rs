//! Merge model output back onto the uploaded rows.

use crate::error::InferenceError;
use crate::pipeline::scorer::Prediction;
use crate::types::{Batch, ScoredBatch, ScoredTransaction};

/// Pair row `i` of the batch with prediction `i`.
pub fn annotate(batch: &Batch, predictions: Vec<Prediction>) -> Result<ScoredBatch, InferenceError> {
    if batch.len() != predictions.len() {
        return Err(InferenceError::LengthMismatch {
            operation: "annotate",
            expected: batch.len(),
            actual: predictions.len(),
        });
    }

    let transactions = batch
        .records()
        .iter()
        .cloned()
        .zip(predictions)
        .map(|(record, prediction)| ScoredTransaction {
            record,
            label: prediction.label,
            fraud_probability: prediction.fraud_probability,
        })
        .collect();

    Ok(ScoredBatch::new(
        transactions,
        batch.extra_columns().to_vec(),
        batch.has_ground_truth(),
    ))
}
