//! Fraud Sentinel - Offline Trainer
//!
//! Loads the PaySim CSV, fits the scoring pipeline on a stratified split,
//! evaluates train and test sets, and writes the model artifact the scoring
//! service loads at startup.
//!
//! Usage: train [config_path] [data_path] [classifier]

use anyhow::{Context, Result};
use fraud_sentinel::{
    artifact::{ModelArtifact, ProductionConfig},
    config::AppConfig,
    data, evaluation,
    pipeline::{FraudPipeline, PipelineSpec},
};
use tracing::info;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("train=info".parse()?)
                .add_directive("fraud_sentinel=info".parse()?),
        )
        .init();

    info!("Starting Fraud Sentinel trainer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("config/config.toml");

    let config = AppConfig::load_from_path(config_path)
        .with_context(|| format!("Failed to load config from {config_path}"))?;
    let mut training = config.training;

    if let Some(data_path) = args.get(2) {
        training.data_path = data_path.clone();
    }
    if let Some(name) = args.get(3) {
        training.classifier = name.parse()?;
    }

    info!(
        data_path = %training.data_path,
        classifier = %training.classifier,
        test_size = training.test_size,
        seed = training.seed,
        "Training configuration"
    );

    // Load, filter, split
    let raw = data::load_paysim_csv(&training.data_path)?;
    let dataset = data::filter_and_clean(raw)?;
    let (train_set, test_set) =
        data::train_test_split(&dataset, training.test_size, training.seed)?;
    info!(
        train_records = train_set.len(),
        train_frauds = train_set.fraud_count(),
        test_records = test_set.len(),
        test_frauds = test_set.fraud_count(),
        "Split complete"
    );

    // Assemble and fit the pipeline
    let mut spec = PipelineSpec::new(training.classifier);
    spec.cyclical_encoding = training.cyclical_encoding;
    spec.large_tx_quantile = training.large_tx_quantile;
    spec.decision_threshold = training.decision_threshold;
    spec.params = training.params;

    let mut pipeline = FraudPipeline::build(spec);
    info!(model = %training.classifier, "Fitting pipeline");
    pipeline.fit(&train_set.records, &train_set.labels)?;

    // Evaluate both splits at the production threshold
    let fitted = pipeline.fitted()?;
    let threshold = fitted.threshold();
    let train_scores = fitted.predict_proba_batch(&train_set.records)?;
    let test_scores = fitted.predict_proba_batch(&test_set.records)?;

    let train_report = evaluation::evaluate(&train_set.labels, &train_scores, threshold);
    let test_report = evaluation::evaluate(&test_set.labels, &test_scores, threshold);

    info!(
        pr_auc = format!("{:.4}", train_report.pr_auc),
        roc_auc = format!("{:.4}", train_report.roc_auc),
        "Train metrics"
    );
    info!(
        pr_auc = format!("{:.4}", test_report.pr_auc),
        roc_auc = format!("{:.4}", test_report.roc_auc),
        precision = format!("{:.4}", test_report.precision),
        recall = format!("{:.4}", test_report.recall),
        f1 = format!("{:.4}", test_report.f1),
        "Test metrics at production threshold"
    );

    evaluation::overfit_check(train_report.pr_auc, test_report.pr_auc);

    // Persist the artifact
    let production_config = ProductionConfig {
        threshold,
        precision: test_report.precision,
        recall: test_report.recall,
        f1: test_report.f1,
    };
    let artifact = ModelArtifact::new(
        pipeline.into_fitted()?,
        test_report.pr_auc,
        production_config,
    );
    artifact.save(&training.output_path)?;

    info!(path = %training.output_path, "Training complete");

    Ok(())
}
