//! Offline data loading and cleaning for the PaySim corpus

use std::path::Path;

use rand::prelude::*;
use rand_pcg::Pcg64;
use serde::Deserialize;
use tracing::info;

use crate::error::{Result, SentinelError};
use crate::types::{TransactionRecord, TxType};

/// One row of the raw PaySim CSV, including the label and the
/// post-transaction columns that never reach a [`TransactionRecord`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawPaySimRow {
    pub step: u32,
    #[serde(rename = "type")]
    pub tx_type: TxType,
    pub amount: f64,
    #[serde(rename = "nameOrig")]
    pub name_orig: String,
    #[serde(rename = "oldbalanceOrg")]
    pub oldbalance_org: f64,
    #[serde(rename = "newbalanceOrig")]
    pub newbalance_orig: f64,
    #[serde(rename = "nameDest")]
    pub name_dest: String,
    #[serde(rename = "oldbalanceDest")]
    pub oldbalance_dest: f64,
    #[serde(rename = "newbalanceDest")]
    pub newbalance_dest: f64,
    #[serde(rename = "isFraud")]
    pub is_fraud: u8,
    #[serde(rename = "isFlaggedFraud")]
    pub is_flagged_fraud: u8,
}

impl RawPaySimRow {
    /// Convert to the scoring-time record shape. The post-transaction
    /// balances and the flagged-fraud column are dropped here by
    /// construction; they do not exist on the target type.
    pub fn into_record(self) -> TransactionRecord {
        TransactionRecord {
            step: self.step,
            tx_type: self.tx_type,
            amount: self.amount,
            origin_id: self.name_orig,
            origin_balance_before: self.oldbalance_org,
            dest_id: self.name_dest,
            dest_balance_before: self.oldbalance_dest,
        }
    }
}

/// Parallel records and labels used by the offline pipeline.
#[derive(Debug, Clone, Default)]
pub struct LabeledDataset {
    pub records: Vec<TransactionRecord>,
    pub labels: Vec<u8>,
}

impl LabeledDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn fraud_count(&self) -> usize {
        self.labels.iter().filter(|&&label| label == 1).count()
    }
}

/// Read the raw PaySim CSV.
pub fn load_paysim_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RawPaySimRow>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    info!(path = %path.display(), rows = rows.len(), "Raw PaySim corpus loaded");
    Ok(rows)
}

/// Apply the corpus business rules: keep only steps up to the last one with
/// legitimate traffic, and keep only TRANSFER and CASH_OUT, the two types
/// that ever carry fraud.
pub fn filter_and_clean(rows: Vec<RawPaySimRow>) -> Result<LabeledDataset> {
    let max_legit_step = rows
        .iter()
        .filter(|row| row.is_fraud == 0)
        .map(|row| row.step)
        .max()
        .unwrap_or(0);

    let mut dataset = LabeledDataset::default();
    for row in rows {
        if row.step > max_legit_step {
            continue;
        }
        if !matches!(row.tx_type, TxType::Transfer | TxType::CashOut) {
            continue;
        }
        let label = row.is_fraud;
        let record = row.into_record();
        record.validate()?;
        dataset.records.push(record);
        dataset.labels.push(label);
    }
    info!(
        kept = dataset.len(),
        frauds = dataset.fraud_count(),
        "Corpus filtered"
    );
    Ok(dataset)
}

/// Stratified split: each class is shuffled and cut separately so the fraud
/// rate is preserved on both sides. Deterministic for a given seed.
pub fn train_test_split(
    dataset: &LabeledDataset,
    test_size: f64,
    seed: u64,
) -> Result<(LabeledDataset, LabeledDataset)> {
    if dataset.is_empty() {
        return Err(SentinelError::EmptyTrainingSet);
    }
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(anyhow::anyhow!("test_size must be in (0, 1), got {test_size}").into());
    }

    let mut rng = Pcg64::seed_from_u64(seed);
    let mut train = LabeledDataset::default();
    let mut test = LabeledDataset::default();

    for class in [0u8, 1] {
        let mut indices: Vec<usize> = (0..dataset.len())
            .filter(|&i| dataset.labels[i] == class)
            .collect();
        indices.shuffle(&mut rng);

        let n_test = ((indices.len() as f64) * test_size).round() as usize;
        let n_test = n_test.min(indices.len());
        for (pos, &i) in indices.iter().enumerate() {
            let side = if pos < n_test { &mut test } else { &mut train };
            side.records.push(dataset.records[i].clone());
            side.labels.push(dataset.labels[i]);
        }
    }
    info!(
        train = train.len(),
        test = test.len(),
        test_frauds = test.fraud_count(),
        "Stratified split"
    );
    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn raw(step: u32, tx_type: TxType, amount: f64, is_fraud: u8) -> RawPaySimRow {
        RawPaySimRow {
            step,
            tx_type,
            amount,
            name_orig: format!("C{step}"),
            oldbalance_org: amount,
            newbalance_orig: 0.0,
            name_dest: "C1".to_string(),
            oldbalance_dest: 0.0,
            newbalance_dest: amount,
            is_fraud,
            is_flagged_fraud: 0,
        }
    }

    #[test]
    fn test_filter_keeps_only_fraud_carrying_types() {
        let rows = vec![
            raw(1, TxType::Transfer, 100.0, 0),
            raw(2, TxType::CashOut, 100.0, 0),
            raw(3, TxType::CashIn, 100.0, 0),
            raw(4, TxType::Payment, 100.0, 0),
            raw(5, TxType::Debit, 100.0, 0),
        ];
        let dataset = filter_and_clean(rows).unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(dataset
            .records
            .iter()
            .all(|r| matches!(r.tx_type, TxType::Transfer | TxType::CashOut)));
    }

    #[test]
    fn test_filter_cuts_steps_past_last_legit() {
        let rows = vec![
            raw(1, TxType::Transfer, 100.0, 0),
            raw(10, TxType::CashOut, 100.0, 0),
            raw(9, TxType::Transfer, 500.0, 1),
            raw(12, TxType::Transfer, 500.0, 1),
        ];
        let dataset = filter_and_clean(rows).unwrap();
        assert_eq!(dataset.len(), 3);
        assert!(dataset.records.iter().all(|r| r.step <= 10));
        assert_eq!(dataset.fraud_count(), 1);
    }

    #[test]
    fn test_into_record_keeps_pre_transaction_state_only() {
        let row = raw(1, TxType::Transfer, 250.0, 1);
        let record = row.into_record();
        assert_eq!(record.origin_balance_before, 250.0);
        assert_eq!(record.dest_balance_before, 0.0);
        assert_eq!(record.amount, 250.0);
    }

    #[test]
    fn test_load_csv_with_paysim_headers() {
        let csv_body = "\
step,type,amount,nameOrig,oldbalanceOrg,newbalanceOrig,nameDest,oldbalanceDest,newbalanceDest,isFraud,isFlaggedFraud
1,PAYMENT,9839.64,C1231006815,170136.0,160296.36,M1979787155,0.0,0.0,0,0
1,TRANSFER,181.0,C1305486145,181.0,0.0,C553264065,0.0,0.0,1,0
";
        let path =
            std::env::temp_dir().join(format!("paysim_sample_{}.csv", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(csv_body.as_bytes()).unwrap();

        let rows = load_paysim_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tx_type, TxType::Payment);
        assert_eq!(rows[0].name_dest, "M1979787155");
        assert_eq!(rows[1].is_fraud, 1);
        assert_eq!(rows[1].oldbalance_org, 181.0);
    }

    #[test]
    fn test_split_is_stratified() {
        let mut dataset = LabeledDataset::default();
        for i in 0..90u32 {
            dataset
                .records
                .push(raw(1 + i, TxType::CashOut, 100.0, 0).into_record());
            dataset.labels.push(0);
        }
        for i in 0..10u32 {
            dataset
                .records
                .push(raw(100 + i, TxType::Transfer, 900.0, 1).into_record());
            dataset.labels.push(1);
        }

        let (train, test) = train_test_split(&dataset, 0.2, 42).unwrap();
        assert_eq!(test.len(), 20);
        assert_eq!(test.fraud_count(), 2);
        assert_eq!(train.len(), 80);
        assert_eq!(train.fraud_count(), 8);
    }

    #[test]
    fn test_split_is_deterministic_for_seed() {
        let mut dataset = LabeledDataset::default();
        for i in 0..30u32 {
            dataset
                .records
                .push(raw(1 + i, TxType::Transfer, 100.0, u8::from(i % 5 == 0)).into_record());
            dataset.labels.push(u8::from(i % 5 == 0));
        }

        let (train_a, test_a) = train_test_split(&dataset, 0.25, 7).unwrap();
        let (train_b, test_b) = train_test_split(&dataset, 0.25, 7).unwrap();

        let ids = |d: &LabeledDataset| -> Vec<String> {
            d.records.iter().map(|r| r.origin_id.clone()).collect()
        };
        assert_eq!(ids(&train_a), ids(&train_b));
        assert_eq!(ids(&test_a), ids(&test_b));
    }

    #[test]
    fn test_split_rejects_bad_test_size() {
        let mut dataset = LabeledDataset::default();
        dataset
            .records
            .push(raw(1, TxType::Transfer, 100.0, 0).into_record());
        dataset.labels.push(0);

        assert!(train_test_split(&dataset, 0.0, 42).is_err());
        assert!(train_test_split(&dataset, 1.0, 42).is_err());
    }
}
