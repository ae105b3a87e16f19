//! Configuration management for the scoring service and the trainer

use crate::models::{ModelParams, ModelSelector};
use anyhow::{Context, Result};
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    pub logging: LoggingConfig,
    /// Only read by the trainer binary
    #[serde(default)]
    pub training: TrainingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming transactions to score
    pub score_subject: String,
    /// Subject for outgoing fraud alerts
    pub alert_subject: String,
}

/// Scoring model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the trained model artifact (JSON)
    pub artifact_path: String,
    /// Overrides the threshold stored in the artifact when set
    #[serde(default)]
    pub decision_threshold: Option<f64>,
}

/// Service tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Number of concurrent scoring tasks
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Seconds between metrics summaries
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

/// Offline training configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    /// PaySim CSV input
    #[serde(default = "default_data_path")]
    pub data_path: String,
    /// Where the trained artifact is written
    #[serde(default = "default_output_path")]
    pub output_path: String,
    /// Classifier to train: logreg, rf, or xgb
    #[serde(default = "default_classifier")]
    pub classifier: ModelSelector,
    /// Fraction of each class held out for evaluation
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    /// Cyclical hour encoding; unset picks the per-classifier default
    #[serde(default)]
    pub cyclical_encoding: Option<bool>,
    /// Quantile defining the large-transaction flag
    #[serde(default = "default_large_tx_quantile")]
    pub large_tx_quantile: f64,
    /// Decision threshold baked into the artifact
    #[serde(default = "default_decision_threshold")]
    pub decision_threshold: f64,
    /// Seed for the split and the ensemble classifiers
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Classifier hyperparameters
    #[serde(default)]
    pub params: ModelParams,
}

fn default_workers() -> usize {
    4
}

fn default_metrics_interval() -> u64 {
    30
}

fn default_data_path() -> String {
    "data/paysim.csv".to_string()
}

fn default_output_path() -> String {
    "models/fraud_model.json".to_string()
}

fn default_classifier() -> ModelSelector {
    ModelSelector::Xgb
}

fn default_test_size() -> f64 {
    0.15
}

fn default_large_tx_quantile() -> f64 {
    0.95
}

fn default_decision_threshold() -> f64 {
    0.2226
}

fn default_seed() -> u64 {
    42
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Load configuration from an in-memory TOML string
    pub fn load_from_str(toml: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            metrics_interval_secs: default_metrics_interval(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            output_path: default_output_path(),
            classifier: default_classifier(),
            test_size: default_test_size(),
            cyclical_encoding: None,
            large_tx_quantile: default_large_tx_quantile(),
            decision_threshold: default_decision_threshold(),
            seed: default_seed(),
            params: ModelParams::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                score_subject: "transactions.paysim".to_string(),
                alert_subject: "fraud.alerts".to_string(),
            },
            model: ModelConfig {
                artifact_path: default_output_path(),
                decision_threshold: None,
            },
            service: ServiceConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
            training: TrainingConfig::default(),
        }
    }
}
