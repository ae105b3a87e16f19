//! Random forest of bagged gini-split classification trees.
//!
//! Each tree is grown on a bootstrap sample with per-split feature
//! subsampling. Training is fully deterministic for a given seed: tree i
//! derives its generator from `seed + i`, so the forest does not depend on
//! build order.

use rand::prelude::*;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::models::tree::TreeNode;

/// Hyperparameters for the random forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; defaults to ⌊√p⌋ when unset.
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 16,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

/// Fitted forest. Prediction averages the leaf fractions over all trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<TreeNode>,
}

impl RandomForest {
    pub fn fit(x: &[Vec<f64>], y: &[u8], params: &ForestParams) -> Self {
        let n = x.len();
        let p = x.first().map_or(0, Vec::len);
        if n == 0 || p == 0 {
            return Self { trees: Vec::new() };
        }
        let feature_subsample = params
            .max_features
            .unwrap_or_else(|| (p as f64).sqrt().floor() as usize)
            .clamp(1, p);

        let builder = TreeBuilder {
            x,
            y,
            params,
            n_features: p,
            feature_subsample,
        };
        let trees = (0..params.n_trees)
            .map(|tree_idx| {
                let mut rng = Pcg64::seed_from_u64(params.seed.wrapping_add(tree_idx as u64));
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                builder.grow(&sample, 0, &mut rng)
            })
            .collect();
        Self { trees }
    }

    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|tree| tree.evaluate(row)).sum();
        sum / self.trees.len() as f64
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [u8],
    params: &'a ForestParams,
    n_features: usize,
    feature_subsample: usize,
}

impl TreeBuilder<'_> {
    fn grow(&self, indices: &[usize], depth: usize, rng: &mut Pcg64) -> TreeNode {
        let positives = indices.iter().filter(|&&i| self.y[i] == 1).count();
        let leaf = TreeNode::leaf(positives as f64 / indices.len() as f64);

        if depth >= self.params.max_depth
            || indices.len() < self.params.min_samples_split
            || positives == 0
            || positives == indices.len()
        {
            return leaf;
        }

        let mut features =
            rand::seq::index::sample(rng, self.n_features, self.feature_subsample).into_vec();
        features.sort_unstable();

        match self.best_split(indices, &features) {
            Some((feature, threshold)) => {
                let (left, right): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .copied()
                    .partition(|&i| self.x[i][feature] <= threshold);
                TreeNode::Split {
                    feature,
                    threshold,
                    left: Box::new(self.grow(&left, depth + 1, rng)),
                    right: Box::new(self.grow(&right, depth + 1, rng)),
                }
            }
            None => leaf,
        }
    }

    /// Exhaustive search over midpoints of adjacent distinct values for the
    /// sampled features, minimizing weighted gini impurity. Ties keep the
    /// first candidate, so the result is deterministic.
    fn best_split(&self, indices: &[usize], features: &[usize]) -> Option<(usize, f64)> {
        let n = indices.len();
        let total_pos = indices.iter().filter(|&&i| self.y[i] == 1).count() as f64;
        let mut best: Option<(f64, usize, f64)> = None;

        for &feature in features {
            let mut ordered: Vec<(f64, u8)> = indices
                .iter()
                .map(|&i| (self.x[i][feature], self.y[i]))
                .collect();
            ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_n = 0usize;
            let mut left_pos = 0.0;
            for cut in 1..n {
                left_n += 1;
                left_pos += f64::from(ordered[cut - 1].1);
                if ordered[cut - 1].0 == ordered[cut].0 {
                    continue;
                }
                let right_n = n - left_n;
                if left_n < self.params.min_samples_leaf
                    || right_n < self.params.min_samples_leaf
                {
                    continue;
                }
                let score = weighted_gini(left_n, left_pos, right_n, total_pos - left_pos);
                if best.map_or(true, |(current, _, _)| score < current) {
                    let threshold = (ordered[cut - 1].0 + ordered[cut].0) / 2.0;
                    best = Some((score, feature, threshold));
                }
            }
        }
        best.map(|(_, feature, threshold)| (feature, threshold))
    }
}

fn weighted_gini(left_n: usize, left_pos: f64, right_n: usize, right_pos: f64) -> f64 {
    let n = (left_n + right_n) as f64;
    (left_n as f64 * gini(left_n, left_pos) + right_n as f64 * gini(right_n, right_pos)) / n
}

fn gini(n: usize, pos: f64) -> f64 {
    let p = pos / n as f64;
    2.0 * p * (1.0 - p)
}
