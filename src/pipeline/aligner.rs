//! Feature alignment: project a validated batch onto the model's input order.
//!
//! Matches the column order used when the model was trained. Pass-through
//! columns never reach the model; they stay on the batch for annotation.

use crate::schema::FEATURE_COUNT;
use crate::types::Batch;
use ndarray::{Array2, ArrayView2};

/// Feature matrix in model order, one row per transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedBatch {
    features: Array2<f64>,
}

impl AlignedBatch {
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    pub fn nrows(&self) -> usize {
        self.features.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.features.ncols()
    }
}

/// Build the `n × FEATURE_COUNT` matrix for a validated batch.
pub fn align(batch: &Batch) -> AlignedBatch {
    let mut features = Array2::<f64>::zeros((batch.len(), FEATURE_COUNT));
    for (mut row, tx) in features.rows_mut().into_iter().zip(batch.records()) {
        for (slot, value) in row.iter_mut().zip(tx.features()) {
            *slot = value;
        }
    }
    AlignedBatch { features }
}
