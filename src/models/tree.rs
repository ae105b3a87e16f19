//! Decision tree node shared by the forest and boosting models

use serde::{Deserialize, Serialize};

/// Recursive tree node.
///
/// Leaves store the model-specific value: a positive-class fraction for
/// forest trees, an additive log-odds contribution for boosted trees.
/// Rows route left when the feature value is less than or equal to the
/// threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn leaf(value: f64) -> Self {
        TreeNode::Leaf { value }
    }

    /// Walk the tree for one feature row and return the leaf value.
    pub fn evaluate(&self, row: &[f64]) -> f64 {
        match self {
            TreeNode::Leaf { value } => *value,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    left.evaluate(row)
                } else {
                    right.evaluate(row)
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> TreeNode {
        TreeNode::Split {
            feature: 0,
            threshold: 5.0,
            left: Box::new(TreeNode::leaf(0.1)),
            right: Box::new(TreeNode::leaf(0.9)),
        }
    }

    #[test]
    fn test_evaluate_routes_left_on_equal() {
        let tree = stump();
        assert_eq!(tree.evaluate(&[4.0]), 0.1);
        assert_eq!(tree.evaluate(&[5.0]), 0.1);
        assert_eq!(tree.evaluate(&[5.1]), 0.9);
    }

    #[test]
    fn test_depth_and_leaf_count() {
        assert_eq!(TreeNode::leaf(0.5).depth(), 0);
        assert_eq!(TreeNode::leaf(0.5).leaf_count(), 1);

        let tree = TreeNode::Split {
            feature: 1,
            threshold: 0.0,
            left: Box::new(stump()),
            right: Box::new(TreeNode::leaf(0.3)),
        };
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.leaf_count(), 3);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let tree = stump();
        let json = serde_json::to_string(&tree).unwrap();
        let back: TreeNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back.evaluate(&[3.0]), 0.1);
        assert_eq!(back.evaluate(&[7.0]), 0.9);
    }
}
