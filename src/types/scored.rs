//! Scored transaction data structures

use crate::types::transaction::TransactionRecord;
use serde::{Deserialize, Serialize};

/// Predicted class as returned by the model's `predict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudLabel {
    NotFraud,
    Fraud,
}

impl FraudLabel {
    /// Map a raw model label; anything other than 0 or 1 is rejected.
    pub fn from_raw(label: i64) -> Option<Self> {
        match label {
            0 => Some(FraudLabel::NotFraud),
            1 => Some(FraudLabel::Fraud),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            FraudLabel::NotFraud => 0,
            FraudLabel::Fraud => 1,
        }
    }

    /// Human-readable class name shown to analysts.
    pub fn as_text(self) -> &'static str {
        match self {
            FraudLabel::NotFraud => "Not Fraud",
            FraudLabel::Fraud => "Fraud",
        }
    }

    /// Inverse of [`FraudLabel::as_text`].
    pub fn from_text(text: &str) -> Option<Self> {
        match text {
            "Not Fraud" => Some(FraudLabel::NotFraud),
            "Fraud" => Some(FraudLabel::Fraud),
            _ => None,
        }
    }
}

/// A transaction annotated with the model's output.
///
/// `label` comes straight from `predict` and is never re-derived from
/// `fraud_probability`; the two are not reconciled.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTransaction {
    pub record: TransactionRecord,
    pub label: FraudLabel,
    /// Positive-class probability, unrounded
    pub fraud_probability: f64,
}

impl ScoredTransaction {
    pub fn label_text(&self) -> &'static str {
        self.label.as_text()
    }

    pub fn is_fraud(&self) -> bool {
        self.label == FraudLabel::Fraud
    }

    /// Probability as a percentage rounded to two decimals, for display only.
    pub fn probability_pct(&self) -> f64 {
        round_to(self.fraud_probability * 100.0, 2)
    }
}

/// Scored rows of one run, with the column layout of the upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredBatch {
    transactions: Vec<ScoredTransaction>,
    extra_columns: Vec<String>,
    has_ground_truth: bool,
}

impl ScoredBatch {
    pub(crate) fn new(
        transactions: Vec<ScoredTransaction>,
        extra_columns: Vec<String>,
        has_ground_truth: bool,
    ) -> Self {
        Self {
            transactions,
            extra_columns,
            has_ground_truth,
        }
    }

    pub fn transactions(&self) -> &[ScoredTransaction] {
        &self.transactions
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub fn has_ground_truth(&self) -> bool {
        self.has_ground_truth
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
