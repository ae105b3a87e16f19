//! Classifier implementations and selection

pub mod forest;
pub mod gbt;
pub mod logreg;
pub mod tree;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SentinelError};

pub use forest::{ForestParams, RandomForest};
pub use gbt::{GbtParams, GradientBoosting};
pub use logreg::{LogisticRegression, LogregParams};
pub use tree::TreeNode;

/// Closed set of supported classifier families. Selection happens once at
/// pipeline construction; anything outside the set is rejected there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSelector {
    Logreg,
    Rf,
    Xgb,
}

impl ModelSelector {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSelector::Logreg => "logreg",
            ModelSelector::Rf => "rf",
            ModelSelector::Xgb => "xgb",
        }
    }
}

impl FromStr for ModelSelector {
    type Err = SentinelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "logreg" => Ok(ModelSelector::Logreg),
            "rf" => Ok(ModelSelector::Rf),
            "xgb" => Ok(ModelSelector::Xgb),
            other => Err(SentinelError::UnsupportedModel(other.to_string())),
        }
    }
}

impl fmt::Display for ModelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hyperparameter bundles for all families. The pipeline picks the section
/// matching its selector, so unused sections are simply ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    pub logreg: LogregParams,
    pub rf: ForestParams,
    pub xgb: GbtParams,
}

/// A fitted classifier of one of the three supported families.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Classifier {
    Logreg(LogisticRegression),
    Rf(RandomForest),
    Xgb(GradientBoosting),
}

impl Classifier {
    /// Train the family picked by `selector` on a preprocessed design matrix.
    pub fn fit(
        selector: ModelSelector,
        params: &ModelParams,
        x: &[Vec<f64>],
        y: &[u8],
    ) -> Result<Self> {
        if x.is_empty() {
            return Err(SentinelError::EmptyTrainingSet);
        }
        if x.len() != y.len() {
            return Err(SentinelError::LabelMismatch {
                records: x.len(),
                labels: y.len(),
            });
        }
        Ok(match selector {
            ModelSelector::Logreg => {
                Classifier::Logreg(LogisticRegression::fit(x, y, &params.logreg))
            }
            ModelSelector::Rf => Classifier::Rf(RandomForest::fit(x, y, &params.rf)),
            ModelSelector::Xgb => Classifier::Xgb(GradientBoosting::fit(x, y, &params.xgb)),
        })
    }

    /// Positive-class probability for one preprocessed row.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        match self {
            Classifier::Logreg(model) => model.predict_proba(row),
            Classifier::Rf(model) => model.predict_proba(row),
            Classifier::Xgb(model) => model.predict_proba(row),
        }
    }

    /// Human-readable family name, recorded in artifact metadata.
    pub fn model_type(&self) -> &'static str {
        match self {
            Classifier::Logreg(_) => "LogisticRegression",
            Classifier::Rf(_) => "RandomForest",
            Classifier::Xgb(_) => "XGBoost",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_parses_known_names() {
        assert_eq!("logreg".parse::<ModelSelector>().unwrap(), ModelSelector::Logreg);
        assert_eq!("rf".parse::<ModelSelector>().unwrap(), ModelSelector::Rf);
        assert_eq!("xgb".parse::<ModelSelector>().unwrap(), ModelSelector::Xgb);
    }

    #[test]
    fn test_selector_rejects_unknown_name() {
        match "catboost".parse::<ModelSelector>() {
            Err(SentinelError::UnsupportedModel(name)) => assert_eq!(name, "catboost"),
            other => panic!("expected unsupported model, got {other:?}"),
        }
    }

    #[test]
    fn test_fit_rejects_shape_mismatch() {
        let x = vec![vec![0.0], vec![1.0]];
        let y = vec![0];
        match Classifier::fit(ModelSelector::Xgb, &ModelParams::default(), &x, &y) {
            Err(SentinelError::LabelMismatch { records, labels }) => {
                assert_eq!((records, labels), (2, 1));
            }
            other => panic!("expected label mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_fit_rejects_empty_matrix() {
        let result = Classifier::fit(ModelSelector::Rf, &ModelParams::default(), &[], &[]);
        assert!(matches!(result, Err(SentinelError::EmptyTrainingSet)));
    }

    #[test]
    fn test_dispatch_by_family() {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![f64::from(i)]).collect();
        let y: Vec<u8> = (0..20).map(|i| u8::from(i >= 10)).collect();
        let mut params = ModelParams::default();
        params.rf.n_trees = 5;
        params.xgb.n_rounds = 5;

        for selector in [ModelSelector::Logreg, ModelSelector::Rf, ModelSelector::Xgb] {
            let model = Classifier::fit(selector, &params, &x, &y).unwrap();
            let p = model.predict_proba(&[15.0]);
            assert!((0.0..=1.0).contains(&p), "{selector} out of range");
        }
    }

    #[test]
    fn test_model_type_names() {
        let x = vec![vec![0.0], vec![1.0]];
        let y = vec![0, 1];
        let mut params = ModelParams::default();
        params.rf.n_trees = 1;
        params.xgb.n_rounds = 1;

        let logreg = Classifier::fit(ModelSelector::Logreg, &params, &x, &y).unwrap();
        let rf = Classifier::fit(ModelSelector::Rf, &params, &x, &y).unwrap();
        let xgb = Classifier::fit(ModelSelector::Xgb, &params, &x, &y).unwrap();

        assert_eq!(logreg.model_type(), "LogisticRegression");
        assert_eq!(rf.model_type(), "RandomForest");
        assert_eq!(xgb.model_type(), "XGBoost");
    }
}
