//! Scoring responses and fraud alert data structures

use crate::types::TransactionRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scoring response for a single transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudScore {
    /// Model probability that the transaction is fraudulent (0.0 - 1.0)
    pub fraud_probability: f64,

    /// Whether the probability met the decision threshold
    pub is_fraud: bool,

    /// Threshold applied to make the decision
    pub threshold_used: f64,

    /// Version of the artifact that produced the score
    pub model_version: String,
}

impl FraudScore {
    /// Build a score, deriving the decision from the threshold. A probability
    /// exactly at the threshold counts as fraud.
    pub fn new(fraud_probability: f64, threshold: f64, model_version: &str) -> Self {
        Self {
            fraud_probability,
            is_fraud: fraud_probability >= threshold,
            threshold_used: threshold,
            model_version: model_version.to_string(),
        }
    }
}

/// Fraud alert published when a scored transaction crosses the threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudAlert {
    /// Unique alert identifier
    pub alert_id: String,

    /// Model probability that triggered the alert
    pub fraud_probability: f64,

    /// Threshold in effect when the alert fired
    pub threshold_used: f64,

    /// Version of the artifact that produced the score
    pub model_version: String,

    /// Simulation hour of the flagged transaction
    pub step: u32,

    /// Transaction type, e.g. "TRANSFER"
    pub tx_type: String,

    /// Transferred amount
    pub amount: f64,

    /// Originating account identifier
    pub origin_id: String,

    /// Destination account identifier
    pub dest_id: String,

    /// Alert generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl FraudAlert {
    /// Create an alert from a score and the record that produced it.
    pub fn new(score: &FraudScore, record: &TransactionRecord) -> Self {
        Self {
            alert_id: uuid::Uuid::new_v4().to_string(),
            fraud_probability: score.fraud_probability,
            threshold_used: score.threshold_used,
            model_version: score.model_version.clone(),
            step: record.step,
            tx_type: record.tx_type.as_str().to_string(),
            amount: record.amount,
            origin_id: record.origin_id.clone(),
            dest_id: record.dest_id.clone(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TxType;

    #[test]
    fn test_score_at_threshold_is_fraud() {
        let score = FraudScore::new(0.2226, 0.2226, "1.0.0");
        assert!(score.is_fraud);
    }

    #[test]
    fn test_score_above_threshold_is_fraud() {
        let score = FraudScore::new(0.5, 0.2226, "1.0.0");
        assert!(score.is_fraud);
        assert_eq!(score.threshold_used, 0.2226);
    }

    #[test]
    fn test_score_below_threshold_is_clean() {
        let score = FraudScore::new(0.10, 0.2226, "1.0.0");
        assert!(!score.is_fraud);
    }

    #[test]
    fn test_alert_carries_record_summary() {
        let record = TransactionRecord::new(42, TxType::Transfer, 9_000.0, "C007", "C900");
        let score = FraudScore::new(0.91, 0.2226, "1.0.0");
        let alert = FraudAlert::new(&score, &record);

        assert_eq!(alert.step, 42);
        assert_eq!(alert.tx_type, "TRANSFER");
        assert_eq!(alert.amount, 9_000.0);
        assert_eq!(alert.origin_id, "C007");
        assert!(!alert.alert_id.is_empty());
    }

    #[test]
    fn test_alert_serialization() {
        let record = TransactionRecord::new(1, TxType::CashOut, 100.0, "C1", "C2");
        let score = FraudScore::new(0.8, 0.5, "1.0.0");
        let alert = FraudAlert::new(&score, &record);

        let json = serde_json::to_string(&alert).unwrap();
        let back: FraudAlert = serde_json::from_str(&json).unwrap();

        assert_eq!(alert.alert_id, back.alert_id);
        assert_eq!(alert.fraud_probability, back.fraud_probability);
        assert_eq!(alert.tx_type, back.tx_type);
    }
}
