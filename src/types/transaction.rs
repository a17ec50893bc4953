//! Transaction data structures for credit card fraud scoring

use crate::schema::{FEATURE_COUNT, PCA_COMPONENTS};

/// One credit card transaction in the reference dataset's layout.
///
/// Fields mirror the public dataset: `Time`, `V1`..`V28` and `Amount`.
/// Missing numeric cells are held as `NaN` so the model sees them as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    /// Seconds elapsed since the first transaction in the dataset
    pub time: f64,

    /// Anonymized principal components `V1`..`V28`
    pub components: [f64; PCA_COMPONENTS],

    /// Transaction amount
    pub amount: f64,

    /// Ground truth (0 = legitimate, 1 = fraud) when the source carries it
    pub ground_truth: Option<u8>,

    /// Non-schema columns, verbatim, in the order of `Batch::extra_columns`
    pub extras: Vec<String>,
}

impl TransactionRecord {
    /// Create a record with no ground truth and no pass-through columns.
    pub fn new(time: f64, components: [f64; PCA_COMPONENTS], amount: f64) -> Self {
        Self {
            time,
            components,
            amount,
            ground_truth: None,
            extras: Vec::new(),
        }
    }

    /// Feature values in model order (`Time`, `V1`..`V28`, `Amount`).
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        let mut features = [0.0; FEATURE_COUNT];
        features[0] = self.time;
        features[1..=PCA_COMPONENTS].copy_from_slice(&self.components);
        features[FEATURE_COUNT - 1] = self.amount;
        features
    }

    pub fn with_ground_truth(mut self, label: u8) -> Self {
        self.ground_truth = Some(label);
        self
    }

    pub fn is_fraud(&self) -> bool {
        self.ground_truth == Some(1)
    }
}

/// A validated batch of transactions sharing one column set.
///
/// Only the schema validator constructs a `Batch`, so every batch that
/// reaches alignment is known to carry all required columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    records: Vec<TransactionRecord>,
    extra_columns: Vec<String>,
    has_ground_truth: bool,
}

impl Batch {
    pub(crate) fn new(
        records: Vec<TransactionRecord>,
        extra_columns: Vec<String>,
        has_ground_truth: bool,
    ) -> Self {
        Self {
            records,
            extra_columns,
            has_ground_truth,
        }
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    /// Pass-through column names, in upload order.
    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    /// Whether the upload carried the ground-truth label column.
    pub fn has_ground_truth(&self) -> bool {
        self.has_ground_truth
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_in_model_order() {
        let mut components = [0.0; PCA_COMPONENTS];
        for (i, c) in components.iter_mut().enumerate() {
            *c = (i + 1) as f64;
        }
        let tx = TransactionRecord::new(10.0, components, 99.5);

        let features = tx.features();
        assert_eq!(features[0], 10.0);
        assert_eq!(features[1], 1.0);
        assert_eq!(features[28], 28.0);
        assert_eq!(features[29], 99.5);
    }
}
