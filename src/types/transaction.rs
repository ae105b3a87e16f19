//! Transaction data structures for PaySim fraud scoring

use crate::error::{Result, SentinelError};
use serde::{Deserialize, Serialize};

/// PaySim transaction type. Closed set: anything else is rejected at the
/// serde boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxType {
    Transfer,
    CashOut,
    CashIn,
    Payment,
    Debit,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Transfer => "TRANSFER",
            TxType::CashOut => "CASH_OUT",
            TxType::CashIn => "CASH_IN",
            TxType::Payment => "PAYMENT",
            TxType::Debit => "DEBIT",
        }
    }
}

/// Represents a single transaction submitted for fraud scoring.
///
/// This is the pre-transaction snapshot: only state known before the money
/// moves. Post-transaction balances never appear here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Simulation hour, starting at 1
    pub step: u32,

    /// Transaction type
    #[serde(rename = "type")]
    pub tx_type: TxType,

    /// Transferred amount
    pub amount: f64,

    /// Originating account identifier
    #[serde(alias = "nameOrig")]
    pub origin_id: String,

    /// Origin account balance before the transaction
    #[serde(alias = "oldbalanceOrg")]
    pub origin_balance_before: f64,

    /// Destination account identifier (merchants start with "M")
    #[serde(alias = "nameDest")]
    pub dest_id: String,

    /// Destination account balance before the transaction
    #[serde(alias = "oldbalanceDest")]
    pub dest_balance_before: f64,
}

impl TransactionRecord {
    /// Create a record with the fields that vary most in tests; balances
    /// default to zero.
    pub fn new(step: u32, tx_type: TxType, amount: f64, origin_id: &str, dest_id: &str) -> Self {
        Self {
            step,
            tx_type,
            amount,
            origin_id: origin_id.to_string(),
            origin_balance_before: 0.0,
            dest_id: dest_id.to_string(),
            dest_balance_before: 0.0,
        }
    }

    pub fn with_balances(mut self, origin_balance: f64, dest_balance: f64) -> Self {
        self.origin_balance_before = origin_balance;
        self.dest_balance_before = dest_balance;
        self
    }

    /// Check the numeric invariants: amount and balances finite and
    /// non-negative, step at least 1. The type invariant is enforced by
    /// the `TxType` enum itself.
    pub fn validate(&self) -> Result<()> {
        if self.step < 1 {
            return Err(SentinelError::InvalidRecord(format!(
                "step must be >= 1, got {}",
                self.step
            )));
        }
        for (name, value) in [
            ("amount", self.amount),
            ("origin_balance_before", self.origin_balance_before),
            ("dest_balance_before", self.dest_balance_before),
        ] {
            if !value.is_finite() {
                return Err(SentinelError::InvalidRecord(format!(
                    "{name} is not finite"
                )));
            }
            if value < 0.0 {
                return Err(SentinelError::InvalidRecord(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serialization_roundtrip() {
        let tx = TransactionRecord::new(25, TxType::Transfer, 10_000.0, "C001", "C100")
            .with_balances(10_000.0, 0.0);

        let json = serde_json::to_string(&tx).unwrap();
        let back: TransactionRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(back.step, 25);
        assert_eq!(back.tx_type, TxType::Transfer);
        assert_eq!(back.origin_id, "C001");
        assert_eq!(back.dest_balance_before, 0.0);
    }

    #[test]
    fn test_accepts_raw_paysim_field_names() {
        let json = r#"{
            "step": 1,
            "type": "CASH_OUT",
            "amount": 500.0,
            "nameOrig": "C002",
            "oldbalanceOrg": 500.0,
            "nameDest": "M200",
            "oldbalanceDest": 1000.0
        }"#;
        let tx: TransactionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(tx.tx_type, TxType::CashOut);
        assert_eq!(tx.origin_id, "C002");
        assert_eq!(tx.dest_id, "M200");
        assert_eq!(tx.origin_balance_before, 500.0);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let json = r#"{
            "step": 1,
            "type": "WIRE",
            "amount": 500.0,
            "nameOrig": "C002",
            "oldbalanceOrg": 500.0,
            "nameDest": "M200",
            "oldbalanceDest": 1000.0
        }"#;
        assert!(serde_json::from_str::<TransactionRecord>(json).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_amount() {
        let tx = TransactionRecord::new(1, TxType::Payment, -5.0, "C1", "M1");
        assert!(matches!(
            tx.validate(),
            Err(crate::error::SentinelError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_step() {
        let tx = TransactionRecord::new(0, TxType::Payment, 5.0, "C1", "M1");
        assert!(tx.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_zero_amount() {
        let tx = TransactionRecord::new(1, TxType::Payment, 0.0, "C1", "M1");
        assert!(tx.validate().is_ok());
    }
}
