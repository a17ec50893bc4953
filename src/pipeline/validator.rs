//! Schema validation of an uploaded batch.

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::export::is_derived_column;
use crate::reader::{Cell, RawBatch};
use crate::schema::{FeatureSchema, PCA_COMPONENTS};
use crate::types::{Batch, TransactionRecord};
use std::collections::BTreeSet;

/// Required columns absent from `columns`. Extra columns are ignored.
pub fn missing_columns(columns: &[String], schema: &FeatureSchema) -> BTreeSet<String> {
    let present: BTreeSet<&str> = columns.iter().map(String::as_str).collect();
    schema
        .columns()
        .iter()
        .filter(|c| !present.contains(c.as_str()))
        .cloned()
        .collect()
}

/// Check the batch's column set once and materialize typed records.
///
/// The raw batch is borrowed so a caller can keep it after a rejection.
pub fn validate(raw: &RawBatch, schema: &FeatureSchema) -> PipelineResult<Batch> {
    let missing = missing_columns(raw.columns(), schema);
    if !missing.is_empty() {
        return Err(PipelineError::Schema { missing });
    }
    if raw.is_empty() {
        return Err(PipelineError::EmptyBatch);
    }

    let layout = ColumnLayout::resolve(raw, schema);
    let records = raw.rows().iter().map(|row| layout.record(row)).collect();
    let extra_columns = layout
        .extras
        .iter()
        .map(|&i| raw.columns()[i].clone())
        .collect();

    Ok(Batch::new(records, extra_columns, layout.label.is_some()))
}

/// Positions of every schema column within an upload.
struct ColumnLayout {
    features: Vec<usize>,
    label: Option<usize>,
    extras: Vec<usize>,
}

impl ColumnLayout {
    /// Only called once every required column is known to be present.
    fn resolve(raw: &RawBatch, schema: &FeatureSchema) -> Self {
        let features = schema
            .columns()
            .iter()
            .filter_map(|c| raw.column_index(c))
            .collect();
        let label = raw.column_index(schema.label_column());
        let extras = raw
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                !schema.is_feature(c) && !schema.is_label(c) && !is_derived_column(c)
            })
            .map(|(i, _)| i)
            .collect();

        Self {
            features,
            label,
            extras,
        }
    }

    fn record(&self, row: &[Cell]) -> TransactionRecord {
        let value = |i: usize| row[i].as_number().unwrap_or(f64::NAN);

        let mut components = [0.0; PCA_COMPONENTS];
        for (slot, &i) in components.iter_mut().zip(&self.features[1..=PCA_COMPONENTS]) {
            *slot = value(i);
        }

        let ground_truth = self
            .label
            .and_then(|i| row[i].as_number())
            .map(|v| v as u8);

        let extras = self
            .extras
            .iter()
            .map(|&i| match &row[i] {
                Cell::Text(text) => text.clone(),
                _ => String::new(),
            })
            .collect();

        TransactionRecord {
            time: value(self.features[0]),
            components,
            amount: value(self.features[PCA_COMPONENTS + 1]),
            ground_truth,
            extras,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_batch;
    use crate::schema::component_name;

    fn header(skip: &[&str], extra: &[&str]) -> Vec<String> {
        FeatureSchema::default()
            .columns()
            .iter()
            .filter(|c| !skip.contains(&c.as_str()))
            .cloned()
            .chain(extra.iter().map(|s| s.to_string()))
            .collect()
    }

    fn csv_text(columns: &[String], rows: usize) -> String {
        let mut text = columns.join(",");
        text.push('\n');
        for r in 0..rows {
            let values: Vec<String> = columns
                .iter()
                .enumerate()
                .map(|(i, c)| match c.as_str() {
                    "Class" => (r % 2).to_string(),
                    "note" => format!("row{}", r),
                    _ => format!("{}.5", i + r),
                })
                .collect();
            text.push_str(&values.join(","));
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_superset_validates() {
        let schema = FeatureSchema::default();
        let columns = header(&[], &["Class", "note"]);
        assert!(missing_columns(&columns, &schema).is_empty());

        let raw = read_batch(csv_text(&columns, 3).as_bytes(), &schema).unwrap();
        let batch = validate(&raw, &schema).unwrap();

        assert_eq!(batch.len(), 3);
        assert!(batch.has_ground_truth());
        assert_eq!(batch.extra_columns(), &["note"]);
        assert_eq!(batch.records()[1].ground_truth, Some(1));
        assert_eq!(batch.records()[2].extras, vec!["row2".to_string()]);
    }

    #[test]
    fn test_result_columns_are_not_carried_as_extras() {
        let schema = FeatureSchema::default();
        let columns = header(&[], &["Prediction", "note", "Fraud_Probability"]);
        let raw = read_batch(csv_text(&columns, 2).as_bytes(), &schema).unwrap();

        let batch = validate(&raw, &schema).unwrap();
        assert_eq!(batch.extra_columns(), &["note"]);
        assert_eq!(batch.records()[0].extras, vec!["row0".to_string()]);
    }

    #[test]
    fn test_reports_exactly_missing_columns() {
        let schema = FeatureSchema::default();
        let columns = header(&["V5", "Amount"], &[]);
        let raw = read_batch(csv_text(&columns, 3).as_bytes(), &schema).unwrap();

        let err = validate(&raw, &schema).unwrap_err();
        let missing = err.missing_columns().cloned().unwrap();
        let expected: BTreeSet<String> =
            ["Amount", "V5"].iter().map(|s| s.to_string()).collect();
        assert_eq!(missing, expected);
    }

    #[test]
    fn test_shuffled_columns_are_reordered() {
        let schema = FeatureSchema::default();
        let mut columns = header(&[], &[]);
        columns.reverse();
        let raw = read_batch(csv_text(&columns, 1).as_bytes(), &schema).unwrap();

        let batch = validate(&raw, &schema).unwrap();
        let tx = &batch.records()[0];

        // Reversed header: Amount is column 0, Time is column 29
        assert_eq!(tx.amount, 0.5);
        assert_eq!(tx.time, 29.5);
        assert_eq!(tx.components[0], 28.5);
        assert!(!batch.has_ground_truth());
        assert_eq!(schema.position(&component_name(1)), Some(1));
    }

    #[test]
    fn test_empty_batch_rejected_after_schema_check() {
        let schema = FeatureSchema::default();
        let raw = read_batch(csv_text(&header(&[], &[]), 0).as_bytes(), &schema).unwrap();
        assert!(matches!(validate(&raw, &schema), Err(PipelineError::EmptyBatch)));

        let raw = read_batch(csv_text(&header(&["V1"], &[]), 0).as_bytes(), &schema).unwrap();
        assert!(matches!(validate(&raw, &schema), Err(PipelineError::Schema { .. })));
    }
}
