//! Gradient-boosted trees on the logistic objective, `xgb` selector.
//!
//! Trees are regression trees over per-row gradients and hessians with the
//! second-order split gain
//! `0.5·[G_L²/(H_L+λ) + G_R²/(H_R+λ) − G²/(H+λ)] − γ`
//! and leaf weight `−G/(H+λ)`. Shrinkage is folded into the stored leaf
//! values, so prediction is just the sigmoid of the summed leaf outputs.
//! Split search is exact greedy over midpoints of adjacent distinct values.

use rand::prelude::*;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::models::tree::TreeNode;
use crate::stats::sigmoid;

/// Hyperparameters for gradient boosting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GbtParams {
    pub n_rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Minimum hessian sum on each side of a split.
    pub min_child_weight: f64,
    /// L2 regularization on leaf weights.
    pub lambda: f64,
    /// Minimum gain required to keep a split.
    pub gamma: f64,
    /// Fraction of rows drawn (without replacement) per round.
    pub subsample: f64,
    pub seed: u64,
}

impl Default for GbtParams {
    fn default() -> Self {
        Self {
            n_rounds: 100,
            learning_rate: 0.3,
            max_depth: 6,
            min_child_weight: 1.0,
            lambda: 1.0,
            gamma: 0.0,
            subsample: 1.0,
            seed: 42,
        }
    }
}

/// Fitted boosted ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    /// Log-odds starting point; 0.0 corresponds to a 0.5 prior.
    base_margin: f64,
    trees: Vec<TreeNode>,
}

impl GradientBoosting {
    pub fn fit(x: &[Vec<f64>], y: &[u8], params: &GbtParams) -> Self {
        let n = x.len();
        if n == 0 {
            return Self {
                base_margin: 0.0,
                trees: Vec::new(),
            };
        }
        let base_margin = 0.0;
        let mut margins = vec![base_margin; n];
        let mut trees = Vec::with_capacity(params.n_rounds);

        for round in 0..params.n_rounds {
            let (grad, hess): (Vec<f64>, Vec<f64>) = margins
                .iter()
                .zip(y)
                .map(|(&m, &label)| {
                    let p = sigmoid(m);
                    (p - f64::from(label), p * (1.0 - p))
                })
                .unzip();

            let rows = sample_rows(n, params, round);
            let builder = BoostBuilder {
                x,
                grad: &grad,
                hess: &hess,
                params,
            };
            let tree = builder.grow(&rows, 0);
            for (margin, row) in margins.iter_mut().zip(x) {
                *margin += tree.evaluate(row);
            }
            trees.push(tree);
        }
        Self { base_margin, trees }
    }

    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let margin: f64 =
            self.base_margin + self.trees.iter().map(|tree| tree.evaluate(row)).sum::<f64>();
        sigmoid(margin)
    }

    pub fn n_rounds(&self) -> usize {
        self.trees.len()
    }
}

/// Row subset for one boosting round. Sampling is keyed off `seed + round`
/// so a refit reproduces the exact draw sequence.
fn sample_rows(n: usize, params: &GbtParams, round: usize) -> Vec<usize> {
    if params.subsample >= 1.0 {
        return (0..n).collect();
    }
    let k = ((n as f64 * params.subsample).floor() as usize).clamp(1, n);
    let mut rng = Pcg64::seed_from_u64(params.seed.wrapping_add(round as u64));
    let mut rows = rand::seq::index::sample(&mut rng, n, k).into_vec();
    rows.sort_unstable();
    rows
}

struct BoostBuilder<'a> {
    x: &'a [Vec<f64>],
    grad: &'a [f64],
    hess: &'a [f64],
    params: &'a GbtParams,
}

impl BoostBuilder<'_> {
    fn grow(&self, indices: &[usize], depth: usize) -> TreeNode {
        let g: f64 = indices.iter().map(|&i| self.grad[i]).sum();
        let h: f64 = indices.iter().map(|&i| self.hess[i]).sum();
        let leaf = TreeNode::leaf(self.leaf_value(g, h));

        if depth >= self.params.max_depth || indices.len() < 2 {
            return leaf;
        }
        match self.best_split(indices, g, h) {
            Some((feature, threshold)) => {
                let (left, right): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .copied()
                    .partition(|&i| self.x[i][feature] <= threshold);
                TreeNode::Split {
                    feature,
                    threshold,
                    left: Box::new(self.grow(&left, depth + 1)),
                    right: Box::new(self.grow(&right, depth + 1)),
                }
            }
            None => leaf,
        }
    }

    fn leaf_value(&self, g: f64, h: f64) -> f64 {
        -self.params.learning_rate * g / (h + self.params.lambda)
    }

    fn best_split(&self, indices: &[usize], total_g: f64, total_h: f64) -> Option<(usize, f64)> {
        let p = self.x.first().map_or(0, Vec::len);
        let lambda = self.params.lambda;
        let parent_score = total_g * total_g / (total_h + lambda);
        let mut best: Option<(f64, usize, f64)> = None;

        for feature in 0..p {
            let mut ordered: Vec<(f64, f64, f64)> = indices
                .iter()
                .map(|&i| (self.x[i][feature], self.grad[i], self.hess[i]))
                .collect();
            ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_g = 0.0;
            let mut left_h = 0.0;
            for cut in 1..ordered.len() {
                left_g += ordered[cut - 1].1;
                left_h += ordered[cut - 1].2;
                if ordered[cut - 1].0 == ordered[cut].0 {
                    continue;
                }
                let right_g = total_g - left_g;
                let right_h = total_h - left_h;
                if left_h < self.params.min_child_weight
                    || right_h < self.params.min_child_weight
                {
                    continue;
                }
                let gain = 0.5
                    * (left_g * left_g / (left_h + lambda)
                        + right_g * right_g / (right_h + lambda)
                        - parent_score)
                    - self.params.gamma;
                if gain > 0.0 && best.map_or(true, |(current, _, _)| gain > current) {
                    let threshold = (ordered[cut - 1].0 + ordered[cut].0) / 2.0;
                    best = Some((gain, feature, threshold));
                }
            }
        }
        best.map(|(_, feature, threshold)| (feature, threshold))
    }
}
