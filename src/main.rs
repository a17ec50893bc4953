//! Fraud Scoring Pipeline - Main Entry Point
//!
//! Usage:
//!   fraud-scoring score <batch.csv> [output_dir]
//!   fraud-scoring overview

use anyhow::{Context, Result};
use fraud_scoring_pipeline::{
    config::{AppConfig, LoggingConfig},
    metrics::PipelineMetrics,
    models::shared,
    pipeline::{export, ScoringPipeline},
    FeatureSchema, PipelineError,
};
use serde_json::json;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: fraud-scoring score <batch.csv> [output_dir] | fraud-scoring overview";

fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    info!("Starting Fraud Scoring Pipeline");

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(|s| s.as_str()) {
        Some("score") => {
            let input = args.get(2).context(USAGE)?;
            let output_dir = args
                .get(3)
                .map(|s| s.as_str())
                .unwrap_or(&config.export.output_dir);
            score(&config, Path::new(input), Path::new(output_dir))
        }
        Some("overview") => overview(&config),
        _ => anyhow::bail!(USAGE),
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.is_json() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Score one batch file and write the annotated results.
fn score(config: &AppConfig, input: &Path, output_dir: &Path) -> Result<()> {
    let model = shared::scoring_model(&config.models)?;
    let metrics = Arc::new(PipelineMetrics::new());
    let pipeline = ScoringPipeline::new(
        model,
        FeatureSchema::new(config.dataset.label_column.as_str()),
        metrics.clone(),
    );

    let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;

    let outcome = match pipeline.run(BufReader::new(file)) {
        Ok(outcome) => outcome,
        Err(e) => {
            if let PipelineError::Schema { missing } = &e {
                error!(missing = ?missing, "Uploaded file is incomplete");
            } else {
                error!(kind = e.kind(), error = %e, "Scoring run failed");
            }
            metrics.print_summary();
            return Err(e.into());
        }
    };

    let bytes = pipeline.export(&outcome.scored)?;
    let path = export::write_results(output_dir, &config.export.file_name, &bytes)
        .with_context(|| format!("Failed to write results to {}", output_dir.display()))?;

    info!(
        path = %path.display(),
        media_type = export::RESULTS_MEDIA_TYPE,
        bytes = bytes.len(),
        "Results written"
    );

    let report = outcome.report(pipeline.model_name(), Some(path.display().to_string()));
    println!("{}", serde_json::to_string_pretty(&report)?);

    metrics.print_summary();
    Ok(())
}

/// Describe the reference dataset.
fn overview(config: &AppConfig) -> Result<()> {
    let dataset = shared::reference_dataset(&config.dataset)?;
    let bins = config.dataset.histogram_bins;

    let overview = dataset.overview();
    info!(
        total = overview.total,
        frauds = overview.fraud_count,
        fraud_percent = %format!("{:.3}%", overview.fraud_percent()),
        "Reference dataset overview"
    );

    let sample: Vec<_> = dataset
        .head(config.dataset.sample_rows)
        .iter()
        .map(|r| {
            json!({
                "time": r.time,
                "amount": r.amount,
                "class": r.ground_truth,
            })
        })
        .collect();

    let report = json!({
        "total": overview.total,
        "fraud_count": overview.fraud_count,
        "fraud_percent": format!("{:.3}", overview.fraud_percent()),
        "amount_histograms": dataset.amount_histograms(bins),
        "time_histogram": dataset.time_histogram(bins),
        "amount_box_stats": dataset.amount_box_stats(),
        "sample": sample,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
