//! End-to-end tests for the batch scoring pipeline with stub models.

use anyhow::Result;
use fraud_scoring_pipeline::metrics::PipelineMetrics;
use fraud_scoring_pipeline::pipeline::export::{self, PREDICTED_CLASS_COLUMN, PROBABILITY_COLUMN};
use fraud_scoring_pipeline::reader::{read_batch, Cell};
use fraud_scoring_pipeline::{
    FeatureSchema, FraudLabel, PipelineError, ScoringModel, ScoringPipeline, ScoringSession,
    SessionEvent,
};
use ndarray::{Array2, ArrayView2};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Flags rows whose `Amount` exceeds 100; probability is amount / 1000.
#[derive(Default)]
struct AmountModel {
    calls: AtomicUsize,
}

impl AmountModel {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn amount(row: ndarray::ArrayView1<'_, f64>) -> f64 {
        row[row.len() - 1]
    }
}

impl ScoringModel for AmountModel {
    fn name(&self) -> &str {
        "amount_stub"
    }

    fn predict(&self, rows: ArrayView2<'_, f64>) -> Result<Vec<i64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(rows
            .rows()
            .into_iter()
            .map(|r| (Self::amount(r) > 100.0) as i64)
            .collect())
    }

    fn predict_proba(&self, rows: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut proba = Array2::zeros((rows.nrows(), 2));
        for (i, r) in rows.rows().into_iter().enumerate() {
            let p = (Self::amount(r) / 1000.0).clamp(0.0, 1.0);
            proba[[i, 0]] = 1.0 - p;
            proba[[i, 1]] = p;
        }
        Ok(proba)
    }
}

struct FailingModel;

impl ScoringModel for FailingModel {
    fn name(&self) -> &str {
        "failing_stub"
    }

    fn predict(&self, _rows: ArrayView2<'_, f64>) -> Result<Vec<i64>> {
        anyhow::bail!("runtime unavailable")
    }

    fn predict_proba(&self, _rows: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        anyhow::bail!("runtime unavailable")
    }
}

fn pipeline(model: &dyn ScoringModel) -> ScoringPipeline<'_> {
    ScoringPipeline::new(model, FeatureSchema::default(), Arc::new(PipelineMetrics::new()))
}

/// CSV with the full schema (minus `drop`), one row per amount.
fn batch_csv(amounts: &[f64], drop: Option<&str>, extra: &[(&str, &str)]) -> String {
    let schema = FeatureSchema::default();
    let columns: Vec<&str> = schema
        .columns()
        .iter()
        .map(|c| c.as_str())
        .filter(|c| Some(*c) != drop)
        .collect();

    let mut out = columns.join(",");
    for (name, _) in extra {
        out.push(',');
        out.push_str(name);
    }
    out.push('\n');

    for (i, amount) in amounts.iter().enumerate() {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| match *c {
                "Time" => i.to_string(),
                "Amount" => amount.to_string(),
                _ => "0.5".to_string(),
            })
            .collect();
        out.push_str(&cells.join(","));
        for (_, value) in extra {
            out.push(',');
            out.push_str(value);
        }
        out.push('\n');
    }
    out
}

fn amounts_with_frauds(total: usize, frauds: usize) -> Vec<f64> {
    (0..total)
        .map(|i| if i < frauds { 500.0 } else { 20.0 })
        .collect()
}

#[test]
fn test_missing_column_never_reaches_model() {
    let model = AmountModel::default();
    let pipeline = pipeline(&model);
    let data = batch_csv(&[10.0, 20.0, 30.0], Some("V5"), &[]);
    let err = pipeline.run(data.as_bytes()).unwrap_err();

    match &err {
        PipelineError::Schema { missing } => {
            assert_eq!(missing.iter().collect::<Vec<_>>(), vec!["V5"]);
        }
        other => panic!("expected schema error, got {other:?}"),
    }
    assert_eq!(model.calls(), 0);
}

#[test]
fn test_summary_counts_flagged_rows() {
    let model = AmountModel::default();
    let pipeline = pipeline(&model);

    let data = batch_csv(&amounts_with_frauds(100, 5), None, &[]);
    let outcome = pipeline.run(data.as_bytes()).unwrap();

    assert_eq!(outcome.summary.total(), 100);
    assert_eq!(outcome.summary.fraud_count(), 5);
    assert_eq!(format!("{:.2}", outcome.summary.fraud_percent()), "5.00");
    assert_eq!(outcome.scored.len(), 100);
    assert_eq!(model.calls(), 2);

    let report = outcome.report(pipeline.model_name(), None);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["model"], "amount_stub");
    assert_eq!(json["fraud_count"], 5);
}

#[test]
fn test_probabilities_stay_in_bounds() {
    let model = AmountModel::default();
    let pipeline = pipeline(&model);

    let data = batch_csv(&[0.0, 50.0, 999.0, 5000.0], None, &[]);
    let outcome = pipeline.run(data.as_bytes()).unwrap();

    for tx in outcome.scored.transactions() {
        assert!((0.0..=1.0).contains(&tx.fraud_probability));
        assert!((0.0..=100.0).contains(&tx.probability_pct()));
        assert_eq!(tx.is_fraud(), tx.label == FraudLabel::Fraud);
    }
}

#[test]
fn test_scoring_is_deterministic() {
    let model = AmountModel::default();
    let pipeline = pipeline(&model);
    let data = batch_csv(&[12.5, 130.0, 99.99, 101.0], None, &[]);

    let first = pipeline.run(data.as_bytes()).unwrap();
    let second = pipeline.run(data.as_bytes()).unwrap();

    assert_eq!(first.summary, second.summary);
    assert_eq!(
        pipeline.export(&first.scored).unwrap(),
        pipeline.export(&second.scored).unwrap()
    );
}

#[test]
fn test_export_reads_back() {
    let model = AmountModel::default();
    let pipeline = pipeline(&model);

    let data = batch_csv(&[10.0, 250.0, 40.0], None, &[("merchant", "acme")]);
    let outcome = pipeline.run(data.as_bytes()).unwrap();
    let bytes = pipeline.export(&outcome.scored).unwrap();

    let raw = read_batch(bytes.as_slice(), pipeline.schema()).unwrap();
    assert_eq!(raw.len(), 3);
    assert_eq!(raw.columns()[0], PREDICTED_CLASS_COLUMN);
    assert_eq!(raw.columns().last().map(|s| s.as_str()), Some("merchant"));

    let label_idx = raw.column_index(PREDICTED_CLASS_COLUMN).unwrap();
    let prob_idx = raw.column_index(PROBABILITY_COLUMN).unwrap();
    let merchant_idx = raw.column_index("merchant").unwrap();

    for (row, tx) in raw.rows().iter().zip(outcome.scored.transactions()) {
        match (&row[label_idx], &row[prob_idx]) {
            (Cell::Text(label), Cell::Text(prob)) => {
                assert_eq!(FraudLabel::from_text(label), Some(tx.label));
                assert_eq!(prob.parse::<f64>().unwrap(), tx.fraud_probability);
            }
            other => panic!("unexpected cells {other:?}"),
        }
        assert_eq!(row[merchant_idx], Cell::Text("acme".to_string()));
    }
}

#[test]
fn test_rescoring_an_export_replaces_result_columns() {
    let model = AmountModel::default();
    let pipeline = pipeline(&model);

    let data = batch_csv(&[10.0, 250.0, 40.0], None, &[("merchant", "acme")]);
    let first = pipeline.run(data.as_bytes()).unwrap();
    let first_export = pipeline.export(&first.scored).unwrap();

    let second = pipeline.run(first_export.as_slice()).unwrap();
    assert_eq!(second.scored.extra_columns(), &["merchant"]);
    let second_export = pipeline.export(&second.scored).unwrap();

    let raw = read_batch(second_export.as_slice(), pipeline.schema()).unwrap();
    assert_eq!(raw.len(), 3);
    for column in export::DERIVED_COLUMNS {
        assert_eq!(raw.columns().iter().filter(|c| *c == column).count(), 1);
    }
    assert_eq!(raw.columns().len(), 4 + pipeline.schema().len() + 1);

    let label_idx = raw.column_index(PREDICTED_CLASS_COLUMN).unwrap();
    let prob_idx = raw.column_index(PROBABILITY_COLUMN).unwrap();
    for (row, tx) in raw.rows().iter().zip(second.scored.transactions()) {
        match (&row[label_idx], &row[prob_idx]) {
            (Cell::Text(label), Cell::Text(prob)) => {
                assert_eq!(FraudLabel::from_text(label), Some(tx.label));
                assert_eq!(prob.parse::<f64>().unwrap(), tx.fraud_probability);
            }
            other => panic!("unexpected cells {other:?}"),
        }
    }
    assert_eq!(first_export, second_export);
}

#[test]
fn test_ground_truth_passes_through() {
    let model = AmountModel::default();
    let pipeline = pipeline(&model);

    let data = batch_csv(&[10.0, 250.0], None, &[("Class", "1")]);
    let outcome = pipeline.run(data.as_bytes()).unwrap();
    assert!(outcome.scored.has_ground_truth());

    let header = export::header(&outcome.scored, pipeline.schema());
    let class_idx = header.iter().position(|c| c == "Class").unwrap();
    assert_eq!(class_idx, 4 + pipeline.schema().len());

    let text = String::from_utf8(pipeline.export(&outcome.scored).unwrap()).unwrap();
    for line in text.lines().skip(1) {
        assert_eq!(line.split(',').nth(class_idx), Some("1"));
    }
}

#[test]
fn test_empty_batch_is_rejected() {
    let model = AmountModel::default();
    let pipeline = pipeline(&model);

    let data = batch_csv(&[], None, &[]);
    let err = pipeline.run(data.as_bytes()).unwrap_err();
    assert!(matches!(err, PipelineError::EmptyBatch));
    assert_eq!(model.calls(), 0);
}

#[test]
fn test_session_happy_path() {
    let model = AmountModel::default();
    let pipeline = pipeline(&model);
    let mut session = ScoringSession::new(&pipeline);
    assert_eq!(session.state().name(), "idle");

    let data = batch_csv(&amounts_with_frauds(10, 2), None, &[]);
    session
        .handle(SessionEvent::FileReceived(data.into_bytes()))
        .unwrap();
    assert_eq!(session.state().name(), "validated");
    assert!(session.summary().is_none());

    session.handle(SessionEvent::ClassifyRequested).unwrap();
    assert_eq!(session.state().name(), "scored");
    let summary = session.summary().unwrap().unwrap();
    assert_eq!(summary.fraud_count(), 2);

    session.handle(SessionEvent::DownloadRequested).unwrap();
    assert_eq!(session.state().name(), "exported");
    let file = session.state().exported_file().unwrap();
    assert!(file.starts_with(PREDICTED_CLASS_COLUMN.as_bytes()));

    // Re-classifying the same upload is allowed
    session.handle(SessionEvent::ClassifyRequested).unwrap();
    assert_eq!(session.state().name(), "scored");
}

#[test]
fn test_session_schema_failure_blocks_classification() {
    let model = AmountModel::default();
    let pipeline = pipeline(&model);
    let mut session = ScoringSession::new(&pipeline);

    let data = batch_csv(&[1.0, 2.0, 3.0], Some("V5"), &[]);
    let err = session
        .handle(SessionEvent::FileReceived(data.into_bytes()))
        .unwrap_err();
    assert_eq!(err.kind(), "schema");
    assert_eq!(session.state().name(), "uploaded");

    let err = session.handle(SessionEvent::ClassifyRequested).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidTransition { .. }));
    assert_eq!(session.state().name(), "uploaded");
    assert!(session.state().exported_file().is_none());
    assert_eq!(model.calls(), 0);
}

#[test]
fn test_session_recovers_from_inference_failure() {
    let model = FailingModel;
    let pipeline = pipeline(&model);
    let mut session = ScoringSession::new(&pipeline);

    let data = batch_csv(&[10.0, 20.0], None, &[]);
    session
        .handle(SessionEvent::FileReceived(data.clone().into_bytes()))
        .unwrap();

    let err = session.handle(SessionEvent::ClassifyRequested).unwrap_err();
    assert_eq!(err.kind(), "inference");
    assert_eq!(session.state().name(), "validated");
    assert!(session.state().scored().is_none());

    let err = session.handle(SessionEvent::DownloadRequested).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidTransition { .. }));

    session
        .handle(SessionEvent::FileReceived(data.into_bytes()))
        .unwrap();
    assert_eq!(session.state().name(), "validated");

    let failures = pipeline.metrics().get_failures_by_kind();
    assert_eq!(failures.get("inference"), Some(&1));
}

#[test]
fn test_session_parse_failure_returns_to_idle() {
    let model = AmountModel::default();
    let pipeline = pipeline(&model);
    let mut session = ScoringSession::new(&pipeline);

    let err = session
        .handle(SessionEvent::FileReceived(b"Time,Time\n1,2\n".to_vec()))
        .unwrap_err();
    assert_eq!(err.kind(), "parse");
    assert_eq!(session.state().name(), "idle");

    let err = session.handle(SessionEvent::DownloadRequested).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidTransition { .. }));
}
