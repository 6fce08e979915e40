//! Regression tree with array-based node storage.
//!
//! Nodes live in one flat vector and reference children by index, so a
//! fitted tree serializes as plain parallel data and traversal is a
//! tight loop without pointer chasing. Splits are chosen by
//! sum-of-squared-error reduction (CART); leaves predict the mean target
//! of their training rows.

use serde::{Deserialize, Serialize};

/// Sentinel feature index marking a leaf node
const LEAF: i32 = -2;

/// A node in the regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Feature index to split on (`-2` for leaf nodes)
    pub feature: i32,
    /// Split threshold (features <= threshold go left)
    pub threshold: f64,
    /// Index of left child (`-1` for leaf)
    pub left_child: i32,
    /// Index of right child (`-1` for leaf)
    pub right_child: i32,
    /// Mean target of the training rows that reached this node
    pub value: f64,
}

impl TreeNode {
    pub const fn is_leaf(&self) -> bool {
        self.feature < 0
    }

    fn leaf(value: f64) -> Self {
        Self {
            feature: LEAF,
            threshold: 0.0,
            left_child: -1,
            right_child: -1,
            value,
        }
    }
}

/// Stopping and shape parameters for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

/// A fitted regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
    n_features: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    improvement: f64,
}

impl RegressionTree {
    /// Fit a tree on the rows selected by `indices`.
    ///
    /// Per-feature squared-error reductions of every accepted split are
    /// accumulated into `importances` (length = feature count).
    pub fn fit(
        samples: &[Vec<f64>],
        targets: &[f64],
        indices: &[usize],
        config: &TreeConfig,
        importances: &mut [f64],
    ) -> Self {
        let n_features = samples.first().map(Vec::len).unwrap_or(0);
        let mut nodes = Vec::new();
        let mut indices = indices.to_vec();
        build_node(
            &mut nodes,
            samples,
            targets,
            &mut indices,
            0,
            config,
            importances,
        );
        Self { nodes, n_features }
    }

    /// Predict a single sample by root-to-leaf traversal.
    #[allow(clippy::cast_sign_loss)]
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                return node.value;
            }
            let feat_val = features.get(node.feature as usize).copied().unwrap_or(0.0);
            idx = if feat_val <= node.threshold {
                node.left_child as usize
            } else {
                node.right_child as usize
            };
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Tree depth (longest root-to-leaf path)
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        self.node_depth(0)
    }

    #[allow(clippy::cast_sign_loss)]
    fn node_depth(&self, idx: usize) -> usize {
        let node = &self.nodes[idx];
        if node.is_leaf() {
            return 0;
        }
        let left = self.node_depth(node.left_child as usize);
        let right = self.node_depth(node.right_child as usize);
        1 + left.max(right)
    }
}

/// Recursively grow the tree, returning the index of the created node.
fn build_node(
    nodes: &mut Vec<TreeNode>,
    samples: &[Vec<f64>],
    targets: &[f64],
    indices: &mut [usize],
    depth: usize,
    config: &TreeConfig,
    importances: &mut [f64],
) -> i32 {
    let n = indices.len();
    let (sum, sum_sq) = indices.iter().fold((0.0, 0.0), |(s, s2), &i| {
        (s + targets[i], s2 + targets[i] * targets[i])
    });
    let mean = if n > 0 { sum / n as f64 } else { 0.0 };
    let node_sse = sum_sq - sum * sum / n.max(1) as f64;

    let node_idx = nodes.len() as i32;
    nodes.push(TreeNode::leaf(mean));

    if depth >= config.max_depth || n < config.min_samples_split || node_sse <= f64::EPSILON {
        return node_idx;
    }

    let best = match find_best_split(samples, targets, indices, node_sse, config) {
        Some(b) => b,
        None => return node_idx,
    };

    importances[best.feature] += best.improvement;

    // Partition in place: rows with value <= threshold move to the front
    let mut split_at = 0;
    for i in 0..n {
        if samples[indices[i]][best.feature] <= best.threshold {
            indices.swap(i, split_at);
            split_at += 1;
        }
    }

    let (left_indices, right_indices) = indices.split_at_mut(split_at);
    let left_child = build_node(nodes, samples, targets, left_indices, depth + 1, config, importances);
    let right_child = build_node(nodes, samples, targets, right_indices, depth + 1, config, importances);

    nodes[node_idx as usize] = TreeNode {
        feature: best.feature as i32,
        threshold: best.threshold,
        left_child,
        right_child,
        value: mean,
    };
    node_idx
}

/// Scan every feature for the split with the largest SSE reduction.
///
/// Features are visited in canonical order and strict improvement is
/// required to replace the incumbent, so ties resolve deterministically.
fn find_best_split(
    samples: &[Vec<f64>],
    targets: &[f64],
    indices: &[usize],
    node_sse: f64,
    config: &TreeConfig,
) -> Option<BestSplit> {
    let n = indices.len();
    let n_features = samples.first().map(Vec::len)?;
    let mut best: Option<BestSplit> = None;

    let mut order: Vec<usize> = Vec::with_capacity(n);
    for feature in 0..n_features {
        order.clear();
        order.extend_from_slice(indices);
        order.sort_by(|&a, &b| {
            samples[a][feature]
                .partial_cmp(&samples[b][feature])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut left_sum = 0.0;
        let mut left_sum_sq = 0.0;
        let total: f64 = order.iter().map(|&i| targets[i]).sum();
        let total_sq: f64 = order.iter().map(|&i| targets[i] * targets[i]).sum();

        for pos in 0..n - 1 {
            let y = targets[order[pos]];
            left_sum += y;
            left_sum_sq += y * y;

            let here = samples[order[pos]][feature];
            let next = samples[order[pos + 1]][feature];
            if here == next {
                continue;
            }

            let n_left = pos + 1;
            let n_right = n - n_left;
            if n_left < config.min_samples_leaf || n_right < config.min_samples_leaf {
                continue;
            }

            let right_sum = total - left_sum;
            let right_sum_sq = total_sq - left_sum_sq;
            let left_sse = left_sum_sq - left_sum * left_sum / n_left as f64;
            let right_sse = right_sum_sq - right_sum * right_sum / n_right as f64;
            let improvement = node_sse - left_sse - right_sse;

            if improvement > best.as_ref().map(|b| b.improvement).unwrap_or(0.0) {
                best = Some(BestSplit {
                    feature,
                    threshold: (here + next) / 2.0,
                    improvement,
                });
            }
        }
    }
    best
}
