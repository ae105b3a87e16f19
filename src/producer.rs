//! NATS publisher for score replies and fraud alerts

use crate::types::{FraudAlert, FraudScore};
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Publisher for the two outbound surfaces of the scorer: request-reply
/// score responses and broadcast fraud alerts.
#[derive(Clone)]
pub struct ScorePublisher {
    client: Client,
    alert_subject: String,
}

impl ScorePublisher {
    /// Create a new publisher
    pub fn new(client: Client, alert_subject: &str) -> Self {
        Self {
            client,
            alert_subject: alert_subject.to_string(),
        }
    }

    /// Publish a fraud alert on the broadcast subject
    pub async fn publish_alert(&self, alert: &FraudAlert) -> Result<()> {
        let payload = serde_json::to_vec(alert)?;

        self.client
            .publish(self.alert_subject.clone(), payload.into())
            .await?;

        debug!(
            alert_id = %alert.alert_id,
            fraud_probability = alert.fraud_probability,
            "Published fraud alert"
        );

        Ok(())
    }

    /// Answer a request-reply scoring call
    pub async fn reply_score(&self, reply: Subject, score: &FraudScore) -> Result<()> {
        let payload = serde_json::to_vec(score)?;
        self.client.publish(reply, payload.into()).await?;
        Ok(())
    }

    /// Get the alert subject name
    pub fn alert_subject(&self) -> &str {
        &self.alert_subject
    }
}
