//! Error types for the fraud scoring pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentinelError {
    #[error("pipeline is not fitted; call fit() before transform/predict")]
    NotFitted,

    #[error("pipeline is already fitted; construct a new pipeline to retrain")]
    AlreadyFitted,

    #[error("schema mismatch: missing columns {missing:?}, unexpected columns {unexpected:?}")]
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("unsupported model '{0}': expected one of logreg, rf, xgb")]
    UnsupportedModel(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("label count {labels} does not match record count {records}")]
    LabelMismatch { records: usize, labels: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SentinelError {
    /// Schema mismatch with only missing columns.
    pub fn missing_columns(missing: Vec<String>) -> Self {
        SentinelError::SchemaMismatch {
            missing,
            unexpected: Vec::new(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SentinelError>;
