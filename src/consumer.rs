//! NATS consumer for transactions awaiting a fraud score

use anyhow::Result;
use async_nats::{Client, Subscriber};
use tracing::info;

use crate::types::TransactionRecord;

/// Consumer for transactions published to the scoring subject
pub struct TransactionConsumer {
    client: Client,
    subject: String,
}

impl TransactionConsumer {
    /// Create a new transaction consumer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Subscribe to the scoring subject
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = self.client.subscribe(self.subject.clone()).await?;
        info!(subject = %self.subject, "Subscribed to scoring subject");
        Ok(subscriber)
    }

    /// Decode one message payload into a transaction
    pub fn decode(payload: &[u8]) -> serde_json::Result<TransactionRecord> {
        serde_json::from_slice(payload)
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}
