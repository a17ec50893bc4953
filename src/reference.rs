//! Reference dataset and the descriptive statistics shown on the dashboard.
//!
//! The dataset is only described here, never used for scoring.

use crate::pipeline::validator;
use crate::reader::read_batch;
use crate::schema::FeatureSchema;
use crate::types::TransactionRecord;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

/// Smallest and largest head sample the dashboard offers.
pub const SAMPLE_ROWS_MIN: usize = 5;
pub const SAMPLE_ROWS_MAX: usize = 50;

/// Labelled transactions used for dataset statistics.
#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    records: Vec<TransactionRecord>,
}

impl ReferenceDataset {
    /// Load the labelled dataset from a CSV file.
    pub fn load<P: AsRef<Path>>(path: P, label_column: &str) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open reference dataset {}", path.display()))?;

        let dataset = Self::from_reader(BufReader::new(file), label_column)
            .with_context(|| format!("Failed to load reference dataset {}", path.display()))?;

        info!(
            path = %path.display(),
            transactions = dataset.len(),
            frauds = dataset.overview().fraud_count,
            "Reference dataset loaded"
        );
        Ok(dataset)
    }

    /// Read a labelled dataset; every row must carry a ground-truth label.
    pub fn from_reader<R: Read>(reader: R, label_column: &str) -> Result<Self> {
        let schema = FeatureSchema::new(label_column);
        let raw = read_batch(reader, &schema)?;
        if raw.column_index(label_column).is_none() {
            anyhow::bail!("Reference dataset has no `{}` column", label_column);
        }

        let batch = validator::validate(&raw, &schema)?;
        if let Some(row) = batch.records().iter().position(|r| r.ground_truth.is_none()) {
            anyhow::bail!("Reference row {} has no `{}` value", row + 1, label_column);
        }

        Ok(Self {
            records: batch.records().to_vec(),
        })
    }

    pub fn from_records(records: Vec<TransactionRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Headline counts for the dataset.
    pub fn overview(&self) -> DatasetOverview {
        DatasetOverview {
            total: self.records.len(),
            fraud_count: self.records.iter().filter(|r| r.is_fraud()).count(),
        }
    }

    /// Amount distribution per class over shared bin edges.
    pub fn amount_histograms(&self, bins: usize) -> ClassHistograms {
        let (legit, fraud) = self.amounts_by_class();
        let edges = bin_edges(legit.iter().chain(&fraud).copied(), bins);
        ClassHistograms {
            legitimate: Histogram::with_edges(&legit, &edges),
            fraud: Histogram::with_edges(&fraud, &edges),
        }
    }

    /// Time distribution over all transactions.
    pub fn time_histogram(&self, bins: usize) -> Histogram {
        let times: Vec<f64> = self.records.iter().map(|r| r.time).collect();
        let edges = bin_edges(times.iter().copied(), bins);
        Histogram::with_edges(&times, &edges)
    }

    /// Box-plot statistics of the amount for each class.
    pub fn amount_box_stats(&self) -> ClassBoxStats {
        let (legit, fraud) = self.amounts_by_class();
        ClassBoxStats {
            legitimate: BoxStats::from_values(&legit),
            fraud: BoxStats::from_values(&fraud),
        }
    }

    /// First `n` rows, with `n` clamped to the dashboard's slider range.
    pub fn head(&self, n: usize) -> &[TransactionRecord] {
        let n = n.clamp(SAMPLE_ROWS_MIN, SAMPLE_ROWS_MAX).min(self.records.len());
        &self.records[..n]
    }

    fn amounts_by_class(&self) -> (Vec<f64>, Vec<f64>) {
        let (fraud, legit): (Vec<&TransactionRecord>, Vec<&TransactionRecord>) =
            self.records.iter().partition(|r| r.is_fraud());
        (
            legit.iter().map(|r| r.amount).filter(|a| a.is_finite()).collect(),
            fraud.iter().map(|r| r.amount).filter(|a| a.is_finite()).collect(),
        )
    }
}

/// Headline dataset metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatasetOverview {
    pub total: usize,
    pub fraud_count: usize,
}

impl DatasetOverview {
    /// Fraud share in percent; zero for an empty dataset.
    pub fn fraud_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.fraud_count as f64 / self.total as f64
        }
    }
}

/// Counts over `edges.len() - 1` bins; the last bin is closed on the right.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
}

impl Histogram {
    fn with_edges(values: &[f64], edges: &[f64]) -> Self {
        let bins = edges.len().saturating_sub(1);
        let mut counts = vec![0u64; bins];
        if bins == 0 {
            return Self {
                edges: edges.to_vec(),
                counts,
            };
        }

        let lo = edges[0];
        let hi = edges[bins];
        let width = (hi - lo) / bins as f64;
        for &v in values.iter().filter(|v| v.is_finite()) {
            if v < lo || v > hi {
                continue;
            }
            let idx = if width > 0.0 {
                (((v - lo) / width) as usize).min(bins - 1)
            } else {
                0
            };
            counts[idx] += 1;
        }

        Self {
            edges: edges.to_vec(),
            counts,
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassHistograms {
    pub legitimate: Histogram,
    pub fraud: Histogram,
}

/// Quartiles, Tukey whiskers and outlier count of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxStats {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: usize,
}

impl BoxStats {
    /// `None` for an empty sample.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;

        let inside: Vec<f64> = sorted
            .iter()
            .copied()
            .filter(|v| (low_fence..=high_fence).contains(v))
            .collect();

        Some(Self {
            count: sorted.len(),
            min: sorted[0],
            q1,
            median,
            q3,
            max: sorted[sorted.len() - 1],
            lower_whisker: inside.first().copied().unwrap_or(q1),
            upper_whisker: inside.last().copied().unwrap_or(q3),
            outliers: sorted.len() - inside.len(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassBoxStats {
    pub legitimate: Option<BoxStats>,
    pub fraud: Option<BoxStats>,
}

/// Equal-width bin edges spanning the finite values.
fn bin_edges(values: impl Iterator<Item = f64>, bins: usize) -> Vec<f64> {
    let bins = bins.max(1);
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if lo > hi {
        return Vec::new();
    }
    // A constant sample still gets a unit-wide range
    let (lo, hi) = if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) };

    let width = (hi - lo) / bins as f64;
    (0..=bins)
        .map(|i| if i == bins { hi } else { lo + width * i as f64 })
        .collect()
}

/// Linear-interpolation quantile of a sorted, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
