//! Fraud Sentinel Library
//!
//! Trains and serves a fraud scoring pipeline for PaySim-style mobile money
//! transactions: stateful feature engineering, a column router with
//! imputation, and gradient-trained classifiers behind one fit/score surface.

pub mod artifact;
pub mod config;
pub mod consumer;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod preprocess;
pub mod producer;
pub mod stats;
pub mod types;

pub use artifact::ModelArtifact;
pub use config::AppConfig;
pub use consumer::TransactionConsumer;
pub use error::{Result, SentinelError};
pub use models::ModelSelector;
pub use pipeline::{FittedPipeline, FraudPipeline, PipelineSpec};
pub use producer::ScorePublisher;
pub use types::{FraudAlert, FraudScore, TransactionRecord, TxType};
