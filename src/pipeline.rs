//! Pipeline assembly: feature transformer → column router → classifier.
//!
//! A `FraudPipeline` starts unfit, trains exactly once, and hands out an
//! immutable [`FittedPipeline`]. The same frozen statistics and fitted
//! preprocessor serve training-time transformation and every subsequent
//! scoring call; nothing is re-derived at serve time.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SentinelError};
use crate::features::{FeatureSettings, FeatureTable, LearnedStatistics, PaySimFeatures};
use crate::models::{Classifier, ModelParams, ModelSelector};
use crate::preprocess::{FittedPreprocessor, Preprocessor};
use crate::types::{FraudScore, TransactionRecord};

/// Everything needed to assemble an unfitted pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub selector: ModelSelector,

    /// None follows the selector: cyclical encoding on for logreg, off for
    /// the tree families.
    pub cyclical_encoding: Option<bool>,

    pub large_tx_quantile: f64,
    pub decision_threshold: f64,
    pub version: String,
    pub params: ModelParams,
}

impl PipelineSpec {
    pub fn new(selector: ModelSelector) -> Self {
        Self {
            selector,
            cyclical_encoding: None,
            large_tx_quantile: 0.95,
            decision_threshold: 0.2226,
            version: "1.0.0".to_string(),
            params: ModelParams::default(),
        }
    }

    fn effective_cyclical(&self) -> bool {
        self.cyclical_encoding
            .unwrap_or(self.selector == ModelSelector::Logreg)
    }
}

enum State {
    Unfit,
    Fitted(FittedPipeline),
}

/// Composed fit/score unit over transformer, router and classifier.
pub struct FraudPipeline {
    spec: PipelineSpec,
    state: State,
}

impl FraudPipeline {
    pub fn build(spec: PipelineSpec) -> Self {
        Self {
            spec,
            state: State::Unfit,
        }
    }

    /// Assemble from a selector name with defaults for everything else.
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(Self::build(PipelineSpec::new(name.parse()?)))
    }

    pub fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self.state, State::Fitted(_))
    }

    /// Train the whole pipeline on a labeled corpus.
    ///
    /// Runs features.fit, transforms the corpus with the statistics that fit
    /// just produced, fits and applies the preprocessor, then trains the
    /// classifier. A fitted pipeline cannot be refit; construct a new one to
    /// retrain. A failed fit leaves the pipeline unfit, so the call can be
    /// retried with corrected input.
    pub fn fit(
        &mut self,
        records: &[TransactionRecord],
        labels: &[u8],
    ) -> Result<&FittedPipeline> {
        if self.is_fitted() {
            return Err(SentinelError::AlreadyFitted);
        }
        if records.len() != labels.len() {
            return Err(SentinelError::LabelMismatch {
                records: records.len(),
                labels: labels.len(),
            });
        }

        let features = PaySimFeatures::new(FeatureSettings {
            cyclical_encoding: self.spec.effective_cyclical(),
            large_tx_quantile: self.spec.large_tx_quantile,
        });
        let statistics = features.fit(records)?;
        let table = features.transform(records, &statistics)?;

        let standardize = self.spec.selector == ModelSelector::Logreg;
        let preprocessor =
            Preprocessor::new(features.settings().cyclical_encoding, standardize).fit(&table)?;
        let matrix = preprocessor.transform(&table)?;

        let classifier = Classifier::fit(self.spec.selector, &self.spec.params, &matrix, labels)?;

        self.state = State::Fitted(FittedPipeline {
            settings: features.settings().clone(),
            statistics,
            preprocessor,
            classifier,
            threshold: self.spec.decision_threshold,
            version: self.spec.version.clone(),
        });
        self.fitted()
    }

    /// Borrow the fitted state; fails on a never-fit pipeline.
    pub fn fitted(&self) -> Result<&FittedPipeline> {
        match &self.state {
            State::Fitted(fitted) => Ok(fitted),
            State::Unfit => Err(SentinelError::NotFitted),
        }
    }

    /// Consume the pipeline, taking ownership of the fitted state.
    pub fn into_fitted(self) -> Result<FittedPipeline> {
        match self.state {
            State::Fitted(fitted) => Ok(fitted),
            State::Unfit => Err(SentinelError::NotFitted),
        }
    }

    pub fn transform(&self, records: &[TransactionRecord]) -> Result<FeatureTable> {
        self.fitted()?.transform(records)
    }

    pub fn predict_proba(&self, record: &TransactionRecord) -> Result<f64> {
        self.fitted()?.predict_proba(record)
    }

    pub fn score(&self, record: &TransactionRecord) -> Result<FraudScore> {
        self.fitted()?.score(record)
    }
}

/// Immutable trained pipeline: the unit persisted to the artifact and shared
/// read-only across scoring tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPipeline {
    settings: FeatureSettings,
    statistics: LearnedStatistics,
    preprocessor: FittedPreprocessor,
    classifier: Classifier,
    threshold: f64,
    version: String,
}

impl FittedPipeline {
    /// Engineer features for a batch using the frozen statistics.
    pub fn transform(&self, records: &[TransactionRecord]) -> Result<FeatureTable> {
        PaySimFeatures::new(self.settings.clone()).transform(records, &self.statistics)
    }

    pub fn predict_proba(&self, record: &TransactionRecord) -> Result<f64> {
        let probs = self.predict_proba_batch(std::slice::from_ref(record))?;
        Ok(probs[0])
    }

    pub fn predict_proba_batch(&self, records: &[TransactionRecord]) -> Result<Vec<f64>> {
        let table = self.transform(records)?;
        let matrix = self.preprocessor.transform(&table)?;
        Ok(matrix
            .iter()
            .map(|row| self.classifier.predict_proba(row))
            .collect())
    }

    /// Score with the pipeline's own decision threshold.
    pub fn score(&self, record: &TransactionRecord) -> Result<FraudScore> {
        self.score_with_threshold(record, self.threshold)
    }

    /// Score with an explicit threshold, e.g. a service-level override.
    pub fn score_with_threshold(
        &self,
        record: &TransactionRecord,
        threshold: f64,
    ) -> Result<FraudScore> {
        let probability = self.predict_proba(record)?;
        Ok(FraudScore::new(probability, threshold, &self.version))
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn statistics(&self) -> &LearnedStatistics {
        &self.statistics
    }

    pub fn model_type(&self) -> &'static str {
        self.classifier.model_type()
    }
}
