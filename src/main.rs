//! Fraud Sentinel - Scoring Service Entry Point
//!
//! Consumes PaySim-style transactions from NATS, scores them with the
//! trained pipeline, answers request-reply calls, and publishes fraud
//! alerts. Supports parallel scoring for high throughput.

use anyhow::Result;
use fraud_sentinel::{
    artifact::ModelArtifact,
    config::AppConfig,
    consumer::TransactionConsumer,
    metrics::{MetricsReporter, ScoringMetrics},
    producer::ScorePublisher,
    types::FraudAlert,
};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fraud_sentinel=info".parse()?),
        )
        .init();

    info!("Starting Fraud Sentinel scoring service");

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");

    // Load the trained pipeline once, before subscribing
    let artifact = ModelArtifact::load(&config.model.artifact_path)?;
    let threshold = config
        .model
        .decision_threshold
        .unwrap_or(artifact.metadata.production_config.threshold);
    info!(
        model = %artifact.metadata.model_type,
        version = %artifact.metadata.version,
        threshold,
        "Model artifact ready"
    );
    let pipeline = Arc::new(artifact.pipeline);

    // Initialize metrics
    let metrics = Arc::new(ScoringMetrics::new());

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    // Initialize consumer and publisher
    let consumer = TransactionConsumer::new(client.clone(), &config.nats.score_subject);
    let publisher = Arc::new(ScorePublisher::new(client.clone(), &config.nats.alert_subject));

    // Parallel scoring configuration
    let num_workers = config.service.workers;
    info!("Starting scoring loop with {} parallel workers", num_workers);
    info!("Listening on subject: {}", config.nats.score_subject);
    info!("Publishing alerts to: {}", config.nats.alert_subject);

    // Semaphore to limit concurrent scoring tasks
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let scored_count = Arc::new(AtomicU64::new(0));

    // Start metrics reporter
    let metrics_clone = metrics.clone();
    let interval_secs = config.service.metrics_interval_secs;
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, interval_secs);
        reporter.start().await;
    });

    // Score transactions in parallel
    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        // Acquire permit (limits concurrent tasks)
        let permit = semaphore.clone().acquire_owned().await.unwrap();

        // Clone shared resources for the spawned task
        let pipeline = pipeline.clone();
        let publisher = publisher.clone();
        let metrics = metrics.clone();
        let scored_count = scored_count.clone();

        // Spawn task to score this transaction
        tokio::spawn(async move {
            let start_time = Instant::now();

            match TransactionConsumer::decode(&message.payload) {
                Ok(record) => match pipeline.score_with_threshold(&record, threshold) {
                    Ok(score) => {
                        let latency = start_time.elapsed();
                        metrics.record_score(latency, score.fraud_probability);

                        // Answer request-reply callers
                        if let Some(reply) = message.reply {
                            if let Err(e) = publisher.reply_score(reply, &score).await {
                                error!(error = %e, "Failed to answer scoring request");
                            }
                        }

                        if score.is_fraud {
                            let alert = FraudAlert::new(&score, &record);
                            metrics.record_alert();

                            if let Err(e) = publisher.publish_alert(&alert).await {
                                error!(
                                    alert_id = %alert.alert_id,
                                    error = %e,
                                    "Failed to publish fraud alert"
                                );
                            } else {
                                info!(
                                    alert_id = %alert.alert_id,
                                    fraud_probability = score.fraud_probability,
                                    dest_id = %record.dest_id,
                                    latency_us = latency.as_micros(),
                                    "Fraud alert published"
                                );
                            }
                        } else {
                            debug!(
                                fraud_probability = score.fraud_probability,
                                latency_us = latency.as_micros(),
                                "Transaction scored (below threshold)"
                            );
                        }

                        let count = scored_count.fetch_add(1, Ordering::Relaxed) + 1;

                        // Log progress every 100 transactions
                        if count % 100 == 0 {
                            let throughput = metrics.get_throughput();
                            let latency_stats = metrics.get_latency_stats();
                            info!(
                                scored = count,
                                throughput = format!("{:.1} tx/s", throughput),
                                avg_latency_us = latency_stats.mean_us,
                                "Scoring milestone"
                            );
                        }
                    }
                    Err(e) => {
                        error!(
                            origin_id = %record.origin_id,
                            error = %e,
                            "Scoring failed"
                        );
                    }
                },
                Err(e) => {
                    warn!(error = %e, "Failed to deserialize transaction");
                }
            }

            // Release permit when done
            drop(permit);
        });
    }

    // Print final summary
    info!("Scoring service shutting down...");
    metrics.print_summary();

    Ok(())
}
