//! Type definitions for the fraud scoring pipeline

pub mod score;
pub mod transaction;

pub use score::{FraudAlert, FraudScore};
pub use transaction::{TransactionRecord, TxType};
