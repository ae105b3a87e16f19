//! PaySim feature engineering.
//!
//! `fit` learns dataset-wide aggregates from the training corpus and returns
//! them as an explicit [`LearnedStatistics`] value; `transform` applies the
//! frozen statistics plus stateless derived features to any batch. All
//! features use only pre-transaction state, so nothing computed here leaks
//! outcome information into the classifier.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SentinelError};
use crate::features::table::FeatureTable;
use crate::stats;
use crate::types::{TransactionRecord, TxType};

/// Configuration for the feature transformer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSettings {
    /// Emit hour_sin / hour_cos alongside hour_of_day. Linear models need
    /// the cyclical pair; tree models split on the raw hour directly.
    pub cyclical_encoding: bool,

    /// Quantile of training amounts used as the large-transaction threshold.
    pub large_tx_quantile: f64,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            cyclical_encoding: false,
            large_tx_quantile: 0.95,
        }
    }
}

/// Aggregate statistics learned from the training corpus.
///
/// Frozen once `fit` returns: no API mutates the maps afterwards. Lookups
/// for ids unseen at fit time resolve to fallback values, never errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnedStatistics {
    /// Quantile of training amounts above which a transaction counts as large
    pub large_amount_threshold: f64,

    /// Transactions observed per destination id
    pub dest_transaction_count: BTreeMap<String, u32>,

    /// Distinct origin ids observed per destination id
    pub dest_unique_origin_count: BTreeMap<String, u32>,

    /// True where the origin id appeared more than once in training
    pub origin_is_repeat: BTreeMap<String, bool>,
}

impl LearnedStatistics {
    fn orig_is_repeat(&self, origin_id: &str) -> f64 {
        match self.origin_is_repeat.get(origin_id) {
            Some(true) => 1.0,
            _ => 0.0,
        }
    }

    fn dest_tx_count(&self, dest_id: &str) -> f64 {
        f64::from(self.dest_transaction_count.get(dest_id).copied().unwrap_or(1))
    }

    fn dest_unique_origin(&self, dest_id: &str) -> f64 {
        f64::from(self.dest_unique_origin_count.get(dest_id).copied().unwrap_or(1))
    }
}

/// Stateful feature transformer for PaySim transactions.
///
/// Fit state lives in an explicit [`LearnedStatistics`] value passed back
/// into `transform`, not on the transformer itself. That keeps the fitted
/// state immutable and safe to share across concurrent scoring calls.
pub struct PaySimFeatures {
    settings: FeatureSettings,
}

impl PaySimFeatures {
    pub fn new(settings: FeatureSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &FeatureSettings {
        &self.settings
    }

    /// Learn corpus-wide statistics from the training records.
    ///
    /// Aggregation is count/set based, so any permutation of the same rows
    /// yields identical statistics. Input rows are not mutated.
    pub fn fit(&self, records: &[TransactionRecord]) -> Result<LearnedStatistics> {
        if records.is_empty() {
            return Err(SentinelError::EmptyTrainingSet);
        }
        for record in records {
            record.validate()?;
        }

        let amounts: Vec<f64> = records.iter().map(|r| r.amount).collect();
        let large_amount_threshold = stats::quantile(&amounts, self.settings.large_tx_quantile)
            .ok_or(SentinelError::EmptyTrainingSet)?;

        let mut origin_counts: BTreeMap<&str, u32> = BTreeMap::new();
        let mut dest_counts: BTreeMap<&str, u32> = BTreeMap::new();
        let mut dest_origins: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for record in records {
            *origin_counts.entry(&record.origin_id).or_insert(0) += 1;
            *dest_counts.entry(&record.dest_id).or_insert(0) += 1;
            dest_origins
                .entry(&record.dest_id)
                .or_default()
                .insert(&record.origin_id);
        }

        Ok(LearnedStatistics {
            large_amount_threshold,
            dest_transaction_count: dest_counts
                .into_iter()
                .map(|(id, n)| (id.to_string(), n))
                .collect(),
            dest_unique_origin_count: dest_origins
                .into_iter()
                .map(|(id, origins)| (id.to_string(), origins.len() as u32))
                .collect(),
            origin_is_repeat: origin_counts
                .into_iter()
                .map(|(id, n)| (id.to_string(), n > 1))
                .collect(),
        })
    }

    /// Apply the frozen statistics plus stateless derivations to a batch.
    ///
    /// Each output row depends only on its own record and the statistics;
    /// rows in the same batch never interact. Unseen origin/destination ids
    /// resolve to fallbacks (repeat = 0, counts = 1).
    pub fn transform(
        &self,
        records: &[TransactionRecord],
        statistics: &LearnedStatistics,
    ) -> Result<FeatureTable> {
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            record.validate()?;
            rows.push(self.derive_row(record, statistics));
        }
        Ok(FeatureTable::new(self.output_columns(), rows))
    }

    fn derive_row(&self, record: &TransactionRecord, statistics: &LearnedStatistics) -> Vec<f64> {
        let hour_of_day = f64::from(record.step % 24);
        let amount = record.amount;

        let mut row = Vec::with_capacity(self.output_width());
        row.push(flag(record.tx_type == TxType::Transfer));
        row.push(flag(record.tx_type == TxType::CashOut));
        row.push(flag(record.dest_id.starts_with('M')));
        row.push((1.0 + amount).ln());
        row.push(flag(amount > statistics.large_amount_threshold));
        row.push(flag(amount % 1000.0 == 0.0));
        row.push(hour_of_day);
        row.push(flag(hour_of_day <= 6.0));
        if self.settings.cyclical_encoding {
            let angle = 2.0 * std::f64::consts::PI * hour_of_day / 24.0;
            row.push(angle.sin());
            row.push(angle.cos());
        }
        row.push(statistics.orig_is_repeat(&record.origin_id));
        row.push(statistics.dest_tx_count(&record.dest_id));
        row.push(statistics.dest_unique_origin(&record.dest_id));
        row.push(flag(record.dest_balance_before == 0.0));
        row.push(amount / (record.dest_balance_before + 1.0));
        row.push((1.0 + record.dest_balance_before).ln());
        row.push((1.0 + record.origin_balance_before).ln());
        // The production configuration keeps the raw balances as passthrough
        // numeric features.
        row.push(record.origin_balance_before);
        row.push(record.dest_balance_before);
        row
    }

    /// Names of the transform output columns, in emission order.
    ///
    /// Raw identifiers, `type`, `step` and `amount` never appear here: they
    /// are consumed during derivation and excluded from the output.
    pub fn output_columns(&self) -> Vec<String> {
        let mut columns: Vec<&str> = vec![
            "is_transfer",
            "is_cash_out",
            "is_merchant_dest",
            "amount_log",
            "is_large_tx",
            "is_round_amount",
            "hour_of_day",
            "is_night",
        ];
        if self.settings.cyclical_encoding {
            columns.push("hour_sin");
            columns.push("hour_cos");
        }
        columns.extend([
            "orig_is_repeat",
            "dest_tx_count",
            "dest_unique_origin",
            "dest_was_empty",
            "amount_to_dest_ratio",
            "log_dest_balance",
            "log_orig_balance",
            "origin_balance_before",
            "dest_balance_before",
        ]);
        columns.into_iter().map(String::from).collect()
    }

    fn output_width(&self) -> usize {
        if self.settings.cyclical_encoding {
            19
        } else {
            17
        }
    }
}

impl Default for PaySimFeatures {
    fn default() -> Self {
        Self::new(FeatureSettings::default())
    }
}

fn flag(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal corpus with the same structure as the PaySim dataset:
    /// C001 appears twice (repeat origin), M200 is a merchant destination.
    fn sample_records() -> Vec<TransactionRecord> {
        vec![
            TransactionRecord::new(1, TxType::Transfer, 10_000.0, "C001", "C100")
                .with_balances(10_000.0, 0.0),
            TransactionRecord::new(25, TxType::CashOut, 500.0, "C002", "M200")
                .with_balances(500.0, 1_000.0),
            TransactionRecord::new(50, TxType::Transfer, 999_000.0, "C001", "C300")
                .with_balances(999_000.0, 500.0),
        ]
    }

    fn fitted() -> (PaySimFeatures, LearnedStatistics) {
        let fe = PaySimFeatures::default();
        let stats = fe.fit(&sample_records()).unwrap();
        (fe, stats)
    }

    #[test]
    fn test_fit_learns_expected_statistics() {
        let (_, stats) = fitted();

        // 0.95-quantile of [500, 10000, 999000] by linear interpolation
        assert!((stats.large_amount_threshold - 900_100.0).abs() < 1e-6);

        assert_eq!(stats.origin_is_repeat.get("C001"), Some(&true));
        assert_eq!(stats.origin_is_repeat.get("C002"), Some(&false));

        assert_eq!(stats.dest_transaction_count.get("C100"), Some(&1));
        assert_eq!(stats.dest_unique_origin_count.get("M200"), Some(&1));
    }

    #[test]
    fn test_fit_rejects_empty_corpus() {
        let fe = PaySimFeatures::default();
        assert!(matches!(
            fe.fit(&[]),
            Err(SentinelError::EmptyTrainingSet)
        ));
    }

    #[test]
    fn test_fit_is_order_independent() {
        let fe = PaySimFeatures::default();
        let forward = fe.fit(&sample_records()).unwrap();

        let mut reversed = sample_records();
        reversed.reverse();
        let backward = fe.fit(&reversed).unwrap();

        assert_eq!(
            serde_json::to_string(&forward).unwrap(),
            serde_json::to_string(&backward).unwrap()
        );
    }

    #[test]
    fn test_transform_excludes_raw_columns() {
        let (fe, stats) = fitted();
        let table = fe.transform(&sample_records(), &stats).unwrap();

        for raw in ["origin_id", "dest_id", "type", "step", "amount"] {
            assert!(
                table.column_index(raw).is_none(),
                "column {raw} should have been excluded"
            );
        }
        assert_eq!(table.n_columns(), 17);
        assert_eq!(table.n_rows(), 3);
    }

    #[test]
    fn test_binary_flags() {
        let (fe, stats) = fitted();
        let table = fe.transform(&sample_records(), &stats).unwrap();

        // Row 0: TRANSFER to C100 with empty destination
        assert_eq!(table.value(0, "is_transfer"), Some(1.0));
        assert_eq!(table.value(0, "is_cash_out"), Some(0.0));
        assert_eq!(table.value(0, "is_merchant_dest"), Some(0.0));
        assert_eq!(table.value(0, "dest_was_empty"), Some(1.0));
        assert_eq!(table.value(0, "orig_is_repeat"), Some(1.0));

        // Row 1: CASH_OUT to merchant M200, funded destination, one-shot origin
        assert_eq!(table.value(1, "is_cash_out"), Some(1.0));
        assert_eq!(table.value(1, "is_merchant_dest"), Some(1.0));
        assert_eq!(table.value(1, "dest_was_empty"), Some(0.0));
        assert_eq!(table.value(1, "orig_is_repeat"), Some(0.0));
    }

    #[test]
    fn test_night_flag_boundaries() {
        let (fe, stats) = fitted();
        let records = vec![
            TransactionRecord::new(25, TxType::Transfer, 1.0, "C1", "C2"),
            TransactionRecord::new(50, TxType::Transfer, 1.0, "C1", "C2"),
            TransactionRecord::new(36, TxType::Transfer, 1.0, "C1", "C2"),
        ];
        let table = fe.transform(&records, &stats).unwrap();

        assert_eq!(table.value(0, "hour_of_day"), Some(1.0));
        assert_eq!(table.value(0, "is_night"), Some(1.0));
        assert_eq!(table.value(1, "hour_of_day"), Some(2.0));
        assert_eq!(table.value(1, "is_night"), Some(1.0));
        assert_eq!(table.value(2, "hour_of_day"), Some(12.0));
        assert_eq!(table.value(2, "is_night"), Some(0.0));
    }

    #[test]
    fn test_large_and_round_amount_flags() {
        let (fe, stats) = fitted();
        let table = fe.transform(&sample_records(), &stats).unwrap();

        // threshold is 900100: only the 999000 row exceeds it
        assert_eq!(table.value(0, "is_large_tx"), Some(0.0));
        assert_eq!(table.value(2, "is_large_tx"), Some(1.0));

        assert_eq!(table.value(0, "is_round_amount"), Some(1.0));
        assert_eq!(table.value(1, "is_round_amount"), Some(0.0));
    }

    #[test]
    fn test_zero_amount_counts_as_round() {
        let (fe, stats) = fitted();
        let records = vec![TransactionRecord::new(1, TxType::Payment, 0.0, "C1", "C2")];
        let table = fe.transform(&records, &stats).unwrap();
        assert_eq!(table.value(0, "is_round_amount"), Some(1.0));
    }

    #[test]
    fn test_unseen_ids_fall_back() {
        let (fe, stats) = fitted();
        let records = vec![TransactionRecord::new(1, TxType::Transfer, 50.0, "C999", "C888")];
        let table = fe.transform(&records, &stats).unwrap();

        assert_eq!(table.value(0, "orig_is_repeat"), Some(0.0));
        assert_eq!(table.value(0, "dest_tx_count"), Some(1.0));
        assert_eq!(table.value(0, "dest_unique_origin"), Some(1.0));
    }

    #[test]
    fn test_transform_is_idempotent() {
        let (fe, stats) = fitted();
        let first = fe.transform(&sample_records(), &stats).unwrap();
        let second = fe.transform(&sample_records(), &stats).unwrap();
        assert_eq!(first.rows, second.rows);
    }

    #[test]
    fn test_cyclical_encoding_columns() {
        let fe = PaySimFeatures::new(FeatureSettings {
            cyclical_encoding: true,
            ..FeatureSettings::default()
        });
        let stats = fe.fit(&sample_records()).unwrap();
        let table = fe.transform(&sample_records(), &stats).unwrap();

        assert_eq!(table.n_columns(), 19);

        // Row 1: step 25 → hour 1
        let angle = 2.0 * std::f64::consts::PI / 24.0;
        let sin = table.value(1, "hour_sin").unwrap();
        let cos = table.value(1, "hour_cos").unwrap();
        assert!((sin - angle.sin()).abs() < 1e-12);
        assert!((cos - angle.cos()).abs() < 1e-12);
    }

    #[test]
    fn test_ratio_and_log_features() {
        let (fe, stats) = fitted();
        let table = fe.transform(&sample_records(), &stats).unwrap();

        // Row 1: amount 500 to a destination holding 1000
        let ratio = table.value(1, "amount_to_dest_ratio").unwrap();
        assert!((ratio - 500.0 / 1001.0).abs() < 1e-12);

        let log_dest = table.value(1, "log_dest_balance").unwrap();
        assert!((log_dest - 1001.0_f64.ln()).abs() < 1e-12);

        assert_eq!(table.value(1, "origin_balance_before"), Some(500.0));
        assert_eq!(table.value(1, "dest_balance_before"), Some(1_000.0));
    }
}
