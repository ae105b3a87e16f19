//! Named-column feature table passed between pipeline stages

use serde::{Deserialize, Serialize};

/// Row-major table with named columns. Produced by the feature transformer,
/// consumed by the preprocessor. Rows are rectangular: every row holds one
/// value per column, in column order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        Self { columns, rows }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Position of a named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of a named column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }

    /// Single cell addressed by row index and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| r[idx])
    }
}
