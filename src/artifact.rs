//! Model artifact persistence.
//!
//! A trained pipeline and its metadata travel together as one JSON document,
//! written at the end of training and loaded exactly once at service
//! startup. BTreeMap-backed learned state keeps the serialized form
//! byte-stable for a given pipeline.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::pipeline::FittedPipeline;

/// Metrics measured at the production decision threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionConfig {
    pub threshold: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Descriptive metadata stored alongside the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub version: String,
    pub model_type: String,
    /// Date the artifact was produced, YYYY-MM-DD
    pub training_date: String,
    /// Test-set PR-AUC at training time
    pub pr_auc: f64,
    pub production_config: ProductionConfig,
}

/// Persisted bundle: metadata plus the fitted pipeline, one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub metadata: ArtifactMetadata,
    pub pipeline: FittedPipeline,
}

impl ModelArtifact {
    pub fn new(pipeline: FittedPipeline, pr_auc: f64, production_config: ProductionConfig) -> Self {
        let metadata = ArtifactMetadata {
            version: pipeline.version().to_string(),
            model_type: pipeline.model_type().to_string(),
            training_date: Utc::now().format("%Y-%m-%d").to_string(),
            pr_auc,
            production_config,
        };
        Self { metadata, pipeline }
    }

    /// Write the artifact as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        info!(
            path = %path.display(),
            model = %self.metadata.model_type,
            version = %self.metadata.version,
            "Artifact saved"
        );
        Ok(())
    }

    /// Load an artifact produced by `save`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let artifact: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        info!(
            path = %path.display(),
            model = %artifact.metadata.model_type,
            version = %artifact.metadata.version,
            threshold = artifact.pipeline.threshold(),
            "Artifact loaded"
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SentinelError;
    use crate::models::ModelSelector;
    use crate::pipeline::{FraudPipeline, PipelineSpec};
    use crate::types::{TransactionRecord, TxType};

    fn trained_pipeline() -> FittedPipeline {
        let mut records = Vec::new();
        let mut labels = Vec::new();
        for i in 0..10u32 {
            records.push(
                TransactionRecord::new(1 + i, TxType::Transfer, 50_000.0, &format!("Ca{i}"), "C1")
                    .with_balances(50_000.0, 0.0),
            );
            labels.push(1);
            records.push(
                TransactionRecord::new(12 + i, TxType::CashOut, 100.0, &format!("Cb{i}"), "C2")
                    .with_balances(5_000.0, 2_000.0),
            );
            labels.push(0);
        }
        let mut spec = PipelineSpec::new(ModelSelector::Xgb);
        spec.params.xgb.n_rounds = 5;
        let mut pipeline = FraudPipeline::build(spec);
        pipeline.fit(&records, &labels).unwrap();
        pipeline.into_fitted().unwrap()
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("{name}_{}.json", std::process::id()))
    }

    fn production_config() -> ProductionConfig {
        ProductionConfig {
            threshold: 0.2226,
            precision: 0.97,
            recall: 0.78,
            f1: 0.86,
        }
    }

    #[test]
    fn test_save_load_roundtrip() {
        let artifact = ModelArtifact::new(trained_pipeline(), 0.85, production_config());
        let path = temp_path("artifact_roundtrip");
        artifact.save(&path).unwrap();

        let loaded = ModelArtifact::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.metadata.model_type, "XGBoost");
        assert_eq!(loaded.metadata.version, "1.0.0");
        assert_eq!(loaded.metadata.pr_auc, 0.85);
        assert_eq!(loaded.metadata.production_config.threshold, 0.2226);

        let record = TransactionRecord::new(30, TxType::Transfer, 60_000.0, "C9", "C8")
            .with_balances(60_000.0, 0.0);
        assert_eq!(
            artifact.pipeline.predict_proba(&record).unwrap(),
            loaded.pipeline.predict_proba(&record).unwrap()
        );
    }

    #[test]
    fn test_serialization_is_stable() {
        let artifact = ModelArtifact::new(trained_pipeline(), 0.85, production_config());
        assert_eq!(
            serde_json::to_string(&artifact).unwrap(),
            serde_json::to_string(&artifact).unwrap()
        );
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = ModelArtifact::load(temp_path("artifact_missing"));
        assert!(matches!(result, Err(SentinelError::Io(_))));
    }
}
