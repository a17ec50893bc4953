//! Batch scoring against the model capability.

use crate::error::InferenceError;
use crate::models::capability::{ScoringModel, POSITIVE_CLASS};
use crate::pipeline::aligner::AlignedBatch;
use crate::types::FraudLabel;
use tracing::debug;

/// Model output for one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: FraudLabel,
    pub fraud_probability: f64,
}

/// Scores whole batches with a single `predict` and a single `predict_proba`
/// call each.
pub struct BatchScorer<'m> {
    model: &'m dyn ScoringModel,
}

impl<'m> BatchScorer<'m> {
    pub fn new(model: &'m dyn ScoringModel) -> Self {
        Self { model }
    }

    /// One prediction per input row, in input order.
    pub fn score(&self, batch: &AlignedBatch) -> Result<Vec<Prediction>, InferenceError> {
        let expected = batch.nrows();
        let model_name = self.model.name();

        let labels = self
            .model
            .predict(batch.view())
            .map_err(|cause| InferenceError::Model {
                model: model_name.to_string(),
                operation: "predict",
                cause,
            })?;
        check_len("predict", expected, labels.len())?;

        let probabilities = self
            .model
            .predict_proba(batch.view())
            .map_err(|cause| InferenceError::Model {
                model: model_name.to_string(),
                operation: "predict_proba",
                cause,
            })?;
        check_len("predict_proba", expected, probabilities.nrows())?;

        // A single-column matrix already holds the positive-class probability
        let column = match probabilities.ncols() {
            0 => return Err(InferenceError::MissingPositiveClass),
            1 => 0,
            _ => POSITIVE_CLASS,
        };

        let predictions = labels
            .into_iter()
            .zip(probabilities.column(column))
            .enumerate()
            .map(|(row, (raw_label, &probability))| {
                let label = FraudLabel::from_raw(raw_label).ok_or(InferenceError::InvalidLabel {
                    row,
                    label: raw_label,
                })?;
                if !(0.0..=1.0).contains(&probability) {
                    return Err(InferenceError::ProbabilityOutOfRange { row, probability });
                }
                Ok(Prediction {
                    label,
                    fraud_probability: probability,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            model = %model_name,
            rows = predictions.len(),
            "Batch scored"
        );

        Ok(predictions)
    }
}

fn check_len(operation: &'static str, expected: usize, actual: usize) -> Result<(), InferenceError> {
    if expected == actual {
        Ok(())
    } else {
        Err(InferenceError::LengthMismatch {
            operation,
            expected,
            actual,
        })
    }
}
