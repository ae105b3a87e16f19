//! Offline evaluation metrics for probability models.
//!
//! PR-AUC is the primary quality metric: the corpus is heavily imbalanced,
//! so ROC-AUC alone paints too rosy a picture.

use serde::Serialize;
use tracing::warn;

use crate::stats;

/// Train-minus-test PR-AUC gap above which the overfit warning fires.
pub const OVERFIT_GAP_ALERT: f64 = 0.10;

/// Precision/recall pairs per candidate threshold, recall decreasing, with
/// the conventional final (precision=1, recall=0) point appended.
#[derive(Debug, Clone)]
pub struct PrCurve {
    pub precisions: Vec<f64>,
    pub recalls: Vec<f64>,
    /// One per curve point except the appended final point.
    pub thresholds: Vec<f64>,
}

/// Counts at a fixed decision threshold.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

/// Full offline report for one model on one labeled set.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub pr_auc: f64,
    pub roc_auc: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub threshold: f64,
    pub confusion: ConfusionMatrix,
}

/// Precision/recall over all distinct score thresholds.
///
/// Scores are walked in descending order; one point is recorded per
/// distinct value, and the walk stops once full recall is reached (lower
/// thresholds only repeat recall=1 with worse precision).
pub fn precision_recall_curve(labels: &[u8], scores: &[f64]) -> PrCurve {
    let total_pos = labels.iter().filter(|&&y| y == 1).count();

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut points: Vec<(f64, usize, usize)> = Vec::new();
    let mut tp = 0usize;
    let mut fp = 0usize;
    for (walked, &i) in order.iter().enumerate() {
        if labels[i] == 1 {
            tp += 1;
        } else {
            fp += 1;
        }
        let boundary = match order.get(walked + 1) {
            Some(&next) => scores[next] != scores[i],
            None => true,
        };
        if boundary {
            points.push((scores[i], tp, fp));
            if tp == total_pos {
                break;
            }
        }
    }

    let mut precisions = Vec::with_capacity(points.len() + 1);
    let mut recalls = Vec::with_capacity(points.len() + 1);
    let mut thresholds = Vec::with_capacity(points.len());
    for &(threshold, tp, fp) in points.iter().rev() {
        precisions.push(ratio(tp, tp + fp));
        recalls.push(ratio(tp, total_pos));
        thresholds.push(threshold);
    }
    precisions.push(1.0);
    recalls.push(0.0);
    PrCurve {
        precisions,
        recalls,
        thresholds,
    }
}

/// Area under the precision-recall curve, trapezoidal over recall.
pub fn pr_auc(curve: &PrCurve) -> f64 {
    stats::trapezoid_area(&curve.recalls, &curve.precisions)
}

/// ROC-AUC via the rank statistic with tie-averaged ranks. Undefined when a
/// class is absent; reported as 0.5 in that case.
pub fn roc_auc(labels: &[u8], scores: &[f64]) -> f64 {
    let pos = labels.iter().filter(|&&y| y == 1).count();
    let neg = labels.len() - pos;
    if pos == 0 || neg == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; scores.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && scores[order[end + 1]] == scores[order[start]] {
            end += 1;
        }
        let avg_rank = (start + end) as f64 / 2.0 + 1.0;
        for &i in &order[start..=end] {
            ranks[i] = avg_rank;
        }
        start = end + 1;
    }

    let pos_rank_sum: f64 = labels
        .iter()
        .zip(&ranks)
        .filter(|(y, _)| **y == 1)
        .map(|(_, r)| *r)
        .sum();
    let pos_f = pos as f64;
    (pos_rank_sum - pos_f * (pos_f + 1.0) / 2.0) / (pos_f * neg as f64)
}

/// Evaluate scores against labels at a fixed decision threshold.
pub fn evaluate(labels: &[u8], scores: &[f64], threshold: f64) -> EvaluationReport {
    let mut confusion = ConfusionMatrix::default();
    for (&label, &score) in labels.iter().zip(scores) {
        match (label == 1, score >= threshold) {
            (true, true) => confusion.true_positive += 1,
            (true, false) => confusion.false_negative += 1,
            (false, true) => confusion.false_positive += 1,
            (false, false) => confusion.true_negative += 1,
        }
    }
    let precision = ratio(
        confusion.true_positive,
        confusion.true_positive + confusion.false_positive,
    );
    let recall = ratio(
        confusion.true_positive,
        confusion.true_positive + confusion.false_negative,
    );
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    EvaluationReport {
        pr_auc: pr_auc(&precision_recall_curve(labels, scores)),
        roc_auc: roc_auc(labels, scores),
        precision,
        recall,
        f1,
        threshold,
        confusion,
    }
}

/// Warn when train PR-AUC exceeds test PR-AUC by more than the alert gap.
/// Returns whether the warning fired.
pub fn overfit_check(train_pr_auc: f64, test_pr_auc: f64) -> bool {
    let gap = train_pr_auc - test_pr_auc;
    if gap > OVERFIT_GAP_ALERT {
        warn!(
            train_pr_auc,
            test_pr_auc, gap, "train/test PR-AUC gap exceeds alert level"
        );
        true
    } else {
        false
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_separation_scores_one() {
        let labels = [0, 0, 1, 1];
        let scores = [0.1, 0.2, 0.8, 0.9];

        let curve = precision_recall_curve(&labels, &scores);
        assert!((pr_auc(&curve) - 1.0).abs() < 1e-12);
        assert!((roc_auc(&labels, &scores) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_curve_shape() {
        let labels = [0, 0, 1, 1];
        let scores = [0.1, 0.2, 0.8, 0.9];
        let curve = precision_recall_curve(&labels, &scores);

        // Points at thresholds 0.8 and 0.9 plus the appended final point;
        // thresholds below 0.8 are redundant once recall hits 1.
        assert_eq!(curve.thresholds, vec![0.8, 0.9]);
        assert_eq!(curve.recalls, vec![1.0, 0.5, 0.0]);
        assert_eq!(curve.precisions, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_inverted_scores() {
        let labels = [1, 0];
        let scores = [0.1, 0.9];

        assert_eq!(roc_auc(&labels, &scores), 0.0);
        let curve = precision_recall_curve(&labels, &scores);
        assert!((pr_auc(&curve) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_tied_scores_give_half_roc() {
        let labels = [0, 1, 0, 1];
        let scores = [0.5, 0.5, 0.5, 0.5];
        assert_eq!(roc_auc(&labels, &scores), 0.5);
    }

    #[test]
    fn test_single_class_roc_reports_neutral() {
        assert_eq!(roc_auc(&[1, 1], &[0.2, 0.9]), 0.5);
        assert_eq!(roc_auc(&[0, 0], &[0.2, 0.9]), 0.5);
    }

    #[test]
    fn test_evaluate_confusion_and_f1() {
        let labels = [1, 1, 0, 0];
        let scores = [0.9, 0.1, 0.8, 0.2];
        let report = evaluate(&labels, &scores, 0.5);

        assert_eq!(report.confusion.true_positive, 1);
        assert_eq!(report.confusion.false_negative, 1);
        assert_eq!(report.confusion.false_positive, 1);
        assert_eq!(report.confusion.true_negative, 1);
        assert_eq!(report.precision, 0.5);
        assert_eq!(report.recall, 0.5);
        assert_eq!(report.f1, 0.5);
        assert_eq!(report.threshold, 0.5);
    }

    #[test]
    fn test_threshold_boundary_counts_as_positive() {
        let report = evaluate(&[1], &[0.5], 0.5);
        assert_eq!(report.confusion.true_positive, 1);
    }

    #[test]
    fn test_zero_division_guards() {
        // Nothing predicted positive
        let report = evaluate(&[1, 0], &[0.1, 0.2], 0.9);
        assert_eq!(report.precision, 0.0);
        assert_eq!(report.recall, 0.0);
        assert_eq!(report.f1, 0.0);
    }

    #[test]
    fn test_overfit_check_fires_on_large_gap() {
        assert!(overfit_check(0.95, 0.80));
        assert!(!overfit_check(0.85, 0.80));
        assert!(!overfit_check(0.70, 0.80));
    }
}
