//! Configuration management for the fraud scoring pipeline
//!
//! Values come from `config/config.toml`, then `FRAUD_SCORING__*`
//! environment variables (e.g. `FRAUD_SCORING__MODELS__MODEL_PATH`).

use crate::pipeline::export::RESULTS_FILE_NAME;
use crate::schema::DEFAULT_LABEL_COLUMN;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub models: ModelsConfig,
    pub dataset: DatasetConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

/// Scoring model configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Path to the ONNX classifier
    pub model_path: String,
    /// Name reported in logs and run reports
    pub model_name: String,
    /// Number of threads for ONNX inference (default: 1)
    pub onnx_threads: usize,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            model_path: "models/xgboost.onnx".to_string(),
            model_name: "xgboost".to_string(),
            onnx_threads: 1,
        }
    }
}

/// Reference dataset configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Labelled CSV describing the schema and feeding the overview
    pub reference_path: String,
    /// Ground-truth column name
    pub label_column: String,
    /// Rows shown in the dataset sample (clamped to 5..=50)
    pub sample_rows: usize,
    /// Bins for the amount and time histograms
    pub histogram_bins: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            reference_path: "data/creditcard.csv".to_string(),
            label_column: DEFAULT_LABEL_COLUMN.to_string(),
            sample_rows: 10,
            histogram_bins: 50,
        }
    }
}

/// Results export configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory the results file is written to
    pub output_dir: String,
    /// Results file name
    pub file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: "output".to_string(),
            file_name: RESULTS_FILE_NAME.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path
    ///
    /// A missing file is not an error; defaults and environment apply.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("FRAUD_SCORING")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
