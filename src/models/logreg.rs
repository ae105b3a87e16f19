//! L2-regularized logistic regression trained by batch gradient descent.
//!
//! Deterministic by construction: weights start at zero and no randomness
//! enters training. Expects standardized inputs; the pipeline assembler
//! enables scaling whenever this model is selected.

use serde::{Deserialize, Serialize};

use crate::stats::sigmoid;

/// Hyperparameters for logistic regression.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogregParams {
    pub learning_rate: f64,
    pub max_iter: usize,
    /// L2 penalty strength on the weights; the bias is unpenalized.
    pub l2: f64,
    /// Stop early once no gradient component exceeds this.
    pub tolerance: f64,
}

impl Default for LogregParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_iter: 1000,
            l2: 1.0,
            tolerance: 1e-6,
        }
    }
}

/// Fitted weight vector plus intercept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Vec<f64>,
    bias: f64,
}

impl LogisticRegression {
    /// Full-batch gradient descent on mean log-loss plus `l2/(2n)·‖w‖²`.
    pub fn fit(x: &[Vec<f64>], y: &[u8], params: &LogregParams) -> Self {
        let n = x.len();
        let p = x.first().map_or(0, Vec::len);
        let mut weights = vec![0.0; p];
        let mut bias = 0.0;
        if n == 0 {
            return Self { weights, bias };
        }
        let scale = 1.0 / n as f64;

        for _ in 0..params.max_iter {
            let mut grad_w = vec![0.0; p];
            let mut grad_b = 0.0;
            for (row, &label) in x.iter().zip(y) {
                let err = sigmoid(dot(&weights, row) + bias) - f64::from(label);
                for (g, &v) in grad_w.iter_mut().zip(row) {
                    *g += err * v;
                }
                grad_b += err;
            }
            grad_b *= scale;
            let mut largest = grad_b.abs();
            for (g, &w) in grad_w.iter_mut().zip(weights.iter()) {
                *g = *g * scale + params.l2 * scale * w;
                largest = largest.max(g.abs());
            }

            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= params.learning_rate * g;
            }
            bias -= params.learning_rate * grad_b;

            if largest < params.tolerance {
                break;
            }
        }
        Self { weights, bias }
    }

    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        sigmoid(dot(&self.weights, row) + self.bias)
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
