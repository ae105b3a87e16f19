//! Column routing and imputation between feature engineering and the
//! classifier.
//!
//! Features are declared in two disjoint named groups: binary flags get
//! most-frequent imputation, continuous columns get median imputation and,
//! for linear models, standardization. Anything outside the declared groups
//! is dropped.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SentinelError};
use crate::features::FeatureTable;
use crate::stats;

/// 0/1 flag features, imputed with the most frequent value.
const BINARY_FEATURES: &[&str] = &[
    "is_transfer",
    "is_cash_out",
    "is_merchant_dest",
    "is_large_tx",
    "is_round_amount",
    "is_night",
    "orig_is_repeat",
    "dest_was_empty",
];

/// Continuous features, imputed with the median.
const NUMERIC_FEATURES: &[&str] = &[
    "amount_log",
    "hour_of_day",
    "dest_tx_count",
    "dest_unique_origin",
    "amount_to_dest_ratio",
    "log_dest_balance",
    "log_orig_balance",
    "origin_balance_before",
    "dest_balance_before",
];

/// Joined to the numeric group when cyclical encoding is enabled.
const CYCLICAL_FEATURES: &[&str] = &["hour_sin", "hour_cos"];

/// Declares the feature groups and learns their imputation (and optional
/// scaling) parameters from a training feature table.
pub struct Preprocessor {
    binary_columns: Vec<String>,
    numeric_columns: Vec<String>,
    standardize: bool,
}

impl Preprocessor {
    /// Build the router for the transformer's output schema. `standardize`
    /// adds zero-mean unit-variance scaling of numeric columns and is meant
    /// for the linear-model configuration only.
    pub fn new(cyclical_encoding: bool, standardize: bool) -> Self {
        let binary_columns = BINARY_FEATURES.iter().map(|s| s.to_string()).collect();
        let mut numeric_columns: Vec<String> =
            NUMERIC_FEATURES.iter().map(|s| s.to_string()).collect();
        if cyclical_encoding {
            numeric_columns.extend(CYCLICAL_FEATURES.iter().map(|s| s.to_string()));
        }
        Self {
            binary_columns,
            numeric_columns,
            standardize,
        }
    }

    /// Learn per-column fill values (and scaler parameters when configured)
    /// from the training table. Declared columns absent from the table fail
    /// with a schema mismatch.
    pub fn fit(&self, table: &FeatureTable) -> Result<FittedPreprocessor> {
        let missing: Vec<String> = self
            .binary_columns
            .iter()
            .chain(self.numeric_columns.iter())
            .filter(|name| table.column_index(name).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(SentinelError::missing_columns(missing));
        }

        let binary_fill = self
            .binary_columns
            .iter()
            .map(|name| most_frequent(&table.column_values(name).unwrap_or_default()))
            .collect();

        let mut numeric_fill = Vec::with_capacity(self.numeric_columns.len());
        let mut means = Vec::with_capacity(self.numeric_columns.len());
        let mut stds = Vec::with_capacity(self.numeric_columns.len());
        for name in &self.numeric_columns {
            let values = table.column_values(name).unwrap_or_default();
            numeric_fill.push(stats::quantile(&values, 0.5).unwrap_or(0.0));
            if self.standardize {
                let (mean, std) = stats::mean_std(&values);
                means.push(mean);
                // Zero-variance columns are centered only.
                stds.push(if std > 0.0 { std } else { 1.0 });
            }
        }

        Ok(FittedPreprocessor {
            fit_columns: table.columns.clone(),
            binary_columns: self.binary_columns.clone(),
            numeric_columns: self.numeric_columns.clone(),
            binary_fill,
            numeric_fill,
            scaler: if self.standardize {
                Some(ScalerParams { means, stds })
            } else {
                None
            },
        })
    }
}

/// Standardization parameters, one entry per numeric column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerParams {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

/// Frozen imputation and scaling state. Transform emits the binary block
/// followed by the numeric block; undeclared columns are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    fit_columns: Vec<String>,
    binary_columns: Vec<String>,
    numeric_columns: Vec<String>,
    binary_fill: Vec<f64>,
    numeric_fill: Vec<f64>,
    scaler: Option<ScalerParams>,
}

impl FittedPreprocessor {
    /// Number of columns in the output matrix.
    pub fn output_width(&self) -> usize {
        self.binary_columns.len() + self.numeric_columns.len()
    }

    /// Route the table into the fixed binary-then-numeric layout, filling
    /// missing values with the learned statistics.
    ///
    /// The table's column set must equal the fit-time set, matched by name
    /// and insensitive to order.
    pub fn transform(&self, table: &FeatureTable) -> Result<Vec<Vec<f64>>> {
        self.check_schema(table)?;

        let binary_idx: Vec<usize> = self
            .binary_columns
            .iter()
            .filter_map(|name| table.column_index(name))
            .collect();
        let numeric_idx: Vec<usize> = self
            .numeric_columns
            .iter()
            .filter_map(|name| table.column_index(name))
            .collect();

        let mut matrix = Vec::with_capacity(table.n_rows());
        for row in &table.rows {
            let mut out = Vec::with_capacity(self.output_width());
            for (slot, &idx) in binary_idx.iter().enumerate() {
                let value = row[idx];
                out.push(if value.is_nan() {
                    self.binary_fill[slot]
                } else {
                    value
                });
            }
            for (slot, &idx) in numeric_idx.iter().enumerate() {
                let raw = row[idx];
                let mut value = if raw.is_nan() {
                    self.numeric_fill[slot]
                } else {
                    raw
                };
                if let Some(scaler) = &self.scaler {
                    value = (value - scaler.means[slot]) / scaler.stds[slot];
                }
                out.push(value);
            }
            matrix.push(out);
        }
        Ok(matrix)
    }

    fn check_schema(&self, table: &FeatureTable) -> Result<()> {
        let missing: Vec<String> = self
            .fit_columns
            .iter()
            .filter(|name| table.column_index(name).is_none())
            .cloned()
            .collect();
        let unexpected: Vec<String> = table
            .columns
            .iter()
            .filter(|name| !self.fit_columns.contains(name))
            .cloned()
            .collect();
        if missing.is_empty() && unexpected.is_empty() {
            Ok(())
        } else {
            Err(SentinelError::SchemaMismatch {
                missing,
                unexpected,
            })
        }
    }
}

/// Most frequent finite value; ties resolve to the smaller value. Returns
/// 0.0 when the column holds no finite values.
fn most_frequent(values: &[f64]) -> f64 {
    let mut counts: Vec<(f64, usize)> = Vec::new();
    for &v in values.iter().filter(|v| v.is_finite()) {
        match counts.iter_mut().find(|(seen, _)| *seen == v) {
            Some((_, n)) => *n += 1,
            None => counts.push((v, 1)),
        }
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.total_cmp(&a.0)))
        .map(|(v, _)| v)
        .unwrap_or(0.0)
}
