//! Synthetic Batch Generator
//!
//! Writes a CSV batch in the reference dataset's layout for pipeline testing.
//!
//! Usage: generate_batch [output.csv] [count] [fraud_rate] [with_class] [drop_column]

use anyhow::{Context, Result};
use fraud_scoring_pipeline::schema::{FeatureSchema, PCA_COMPONENTS};
use fraud_scoring_pipeline::types::TransactionRecord;
use rand::Rng;
use tracing::info;

/// Transaction generator for testing
struct BatchGenerator {
    rng: rand::rngs::ThreadRng,
    clock: f64,
}

impl BatchGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            clock: 0.0,
        }
    }

    /// Generate a random legitimate transaction
    fn generate_legitimate(&mut self) -> TransactionRecord {
        self.clock += self.rng.gen_range(0.0..20.0);
        let mut components = [0.0; PCA_COMPONENTS];
        for c in components.iter_mut() {
            *c = self.rng.gen_range(-2.0..2.0);
        }
        let amount = self.rng.gen_range(1.0..250.0);
        TransactionRecord::new(self.clock.round(), components, amount).with_ground_truth(0)
    }

    /// Generate a fraud-like transaction: components pushed far from the bulk
    fn generate_suspicious(&mut self) -> TransactionRecord {
        self.clock += self.rng.gen_range(0.0..20.0);
        let mut components = [0.0; PCA_COMPONENTS];
        for c in components.iter_mut() {
            *c = self.rng.gen_range(-8.0..8.0);
        }
        let amount = self.rng.gen_range(0.0..2500.0);
        TransactionRecord::new(self.clock.round(), components, amount).with_ground_truth(1)
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("generate_batch=info".parse()?),
        )
        .init();

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let output = args.get(1).map(|s| s.as_str()).unwrap_or("batch.csv");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let fraud_rate: f64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0.01);
    let with_class: bool = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(false);
    let drop_column = args.get(5).map(|s| s.as_str());

    info!(
        output = %output,
        count = count,
        fraud_rate = fraud_rate,
        with_class = with_class,
        drop_column = ?drop_column,
        "Configuration loaded"
    );

    let fraud_rate = fraud_rate.clamp(0.0, 1.0);
    let schema = FeatureSchema::default();
    let columns: Vec<(usize, &str)> = schema
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| (i, c.as_str()))
        .filter(|(_, c)| Some(*c) != drop_column)
        .collect();

    let mut writer =
        csv::Writer::from_path(output).with_context(|| format!("Failed to create {}", output))?;

    let mut header: Vec<&str> = columns.iter().map(|(_, c)| *c).collect();
    if with_class {
        header.push(schema.label_column());
    }
    writer.write_record(&header)?;

    let mut generator = BatchGenerator::new();
    let mut rng = rand::thread_rng();
    let mut suspicious_count = 0;

    for i in 0..count {
        let record = if rng.gen_bool(fraud_rate) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            generator.generate_legitimate()
        };

        let features = record.features();
        let mut row: Vec<String> = columns
            .iter()
            .map(|(idx, _)| format!("{:.6}", features[*idx]))
            .collect();
        if with_class {
            row.push(record.ground_truth.unwrap_or(0).to_string());
        }
        writer.write_record(&row)?;

        if (i + 1) % 1000 == 0 {
            info!("Generated {}/{} transactions", i + 1, count);
        }
    }

    writer.flush()?;

    info!(
        "Completed! Wrote {} transactions ({} suspicious) to {}",
        count, suspicious_count, output
    );

    Ok(())
}
