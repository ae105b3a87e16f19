//! Feature engineering for PaySim transactions

pub mod engineering;
pub mod table;

pub use engineering::{FeatureSettings, LearnedStatistics, PaySimFeatures};
pub use table::FeatureTable;
