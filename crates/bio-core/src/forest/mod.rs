//! Random forest regression engine.
//!
//! Ensemble of [`RegressionTree`]s fitted on bootstrap resamples of the
//! training rows. Prediction is the mean across trees; the spread of the
//! per-tree predictions doubles as an agreement signal for confidence
//! scoring. Feature importances are accumulated squared-error reductions
//! normalized to sum to one.
//!
//! Training is fully deterministic: the bootstrap indices for every tree
//! come from one `StdRng` seeded with the configured seed, so identical
//! data and seed reproduce the forest bit for bit.

mod tree;

pub use tree::{RegressionTree, TreeConfig, TreeNode};

use crate::error::CoreError;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Training configuration for one forest
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            seed: 42,
        }
    }
}

/// A fitted random forest regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    importances: Vec<f64>,
    n_features: usize,
}

impl RandomForest {
    /// Fit a forest on the full sample set.
    ///
    /// # Errors
    ///
    /// Returns `Err` if there are no samples, targets and samples differ
    /// in length, or rows have inconsistent feature counts.
    pub fn fit(samples: &[Vec<f64>], targets: &[f64], config: &ForestConfig) -> Result<Self, CoreError> {
        if samples.is_empty() {
            return Err(CoreError::Internal("cannot fit forest on empty sample set".to_string()));
        }
        if samples.len() != targets.len() {
            return Err(CoreError::Internal(format!(
                "sample/target length mismatch: {} vs {}",
                samples.len(),
                targets.len()
            )));
        }
        let n_features = samples[0].len();
        if samples.iter().any(|s| s.len() != n_features) {
            return Err(CoreError::Internal(
                "inconsistent feature counts across samples".to_string(),
            ));
        }
        if config.n_trees == 0 {
            return Err(CoreError::Internal("forest needs at least one tree".to_string()));
        }

        let tree_config = TreeConfig {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
        };

        let mut rng = StdRng::seed_from_u64(config.seed);
        let n = samples.len();
        let mut trees = Vec::with_capacity(config.n_trees);
        let mut importances = vec![0.0; n_features];

        for _ in 0..config.n_trees {
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(RegressionTree::fit(
                samples,
                targets,
                &bootstrap,
                &tree_config,
                &mut importances,
            ));
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }

        Ok(Self {
            trees,
            importances,
            n_features,
        })
    }

    /// Mean prediction across all trees.
    pub fn predict(&self, features: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict(features)).sum();
        sum / self.trees.len() as f64
    }

    /// Individual tree predictions for a single sample.
    pub fn tree_predictions(&self, features: &[f64]) -> Vec<f64> {
        self.trees.iter().map(|t| t.predict(features)).collect()
    }

    /// Standard deviation of the per-tree predictions.
    ///
    /// Low dispersion means the ensemble agrees on this input.
    pub fn dispersion(&self, features: &[f64]) -> f64 {
        let predictions = self.tree_predictions(features);
        let mean: f64 = predictions.iter().sum::<f64>() / predictions.len() as f64;
        let var: f64 = predictions.iter().map(|p| (p - mean).powi(2)).sum::<f64>()
            / predictions.len() as f64;
        var.sqrt()
    }

    /// Per-feature importance scores, non-negative and summing to one
    /// (all zero when no split was ever accepted).
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Average tree depth across the forest.
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_depth(&self) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: usize = self.trees.iter().map(RegressionTree::depth).sum();
        total as f64 / self.trees.len() as f64
    }

    /// Total number of nodes across all trees.
    pub fn total_nodes(&self) -> usize {
        self.trees.iter().map(RegressionTree::n_nodes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ForestConfig {
        ForestConfig {
            n_trees: 20,
            max_depth: 6,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }

    fn linear_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        // Two informative features, one pure noise column held constant
        let mut samples = Vec::new();
        let mut targets = Vec::new();
        for i in 0..40 {
            let a = i as f64 / 40.0;
            let b = ((i * 7) % 40) as f64 / 40.0;
            samples.push(vec![a, b, 0.5]);
            targets.push(0.7 * a + 0.3 * b);
        }
        (samples, targets)
    }

    #[test]
    fn predicts_within_target_range() {
        let (samples, targets) = linear_data();
        let forest = RandomForest::fit(&samples, &targets, &config()).unwrap();

        let pred = forest.predict(&[0.5, 0.5, 0.5]);
        assert!((0.0..=1.0).contains(&pred), "prediction was {}", pred);
    }

    #[test]
    fn deterministic_given_seed() {
        let (samples, targets) = linear_data();
        let a = RandomForest::fit(&samples, &targets, &config()).unwrap();
        let b = RandomForest::fit(&samples, &targets, &config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seed_changes_forest() {
        let (samples, targets) = linear_data();
        let a = RandomForest::fit(&samples, &targets, &config()).unwrap();
        let other = ForestConfig {
            seed: 7,
            ..config()
        };
        let b = RandomForest::fit(&samples, &targets, &other).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn importances_sum_to_one() {
        let (samples, targets) = linear_data();
        let forest = RandomForest::fit(&samples, &targets, &config()).unwrap();

        let sum: f64 = forest.feature_importances().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "importances summed to {}", sum);
        assert!(forest.feature_importances().iter().all(|&i| i >= 0.0));
    }

    #[test]
    fn constant_feature_gets_zero_importance() {
        let (samples, targets) = linear_data();
        let forest = RandomForest::fit(&samples, &targets, &config()).unwrap();

        // Column 2 never varies, so no split can use it
        assert_eq!(forest.feature_importances()[2], 0.0);
        assert!(forest.feature_importances()[0] > forest.feature_importances()[2]);
    }

    #[test]
    fn dispersion_is_zero_for_constant_targets() {
        let samples: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let targets = vec![0.5; 10];
        let forest = RandomForest::fit(&samples, &targets, &config()).unwrap();

        assert!(forest.dispersion(&[4.0]) < 1e-12);
    }

    #[test]
    fn empty_sample_set_is_rejected() {
        let result = RandomForest::fit(&[], &[], &config());
        assert!(result.is_err());
    }

    #[test]
    fn serde_round_trip() {
        let (samples, targets) = linear_data();
        let forest = RandomForest::fit(&samples, &targets, &config()).unwrap();

        let json = serde_json::to_string(&forest).unwrap();
        let restored: RandomForest = serde_json::from_str(&json).unwrap();
        assert_eq!(forest, restored);
        assert_eq!(forest.predict(&[0.3, 0.3, 0.5]), restored.predict(&[0.3, 0.3, 0.5]));
    }

    #[test]
    fn forest_metadata() {
        let (samples, targets) = linear_data();
        let forest = RandomForest::fit(&samples, &targets, &config()).unwrap();
        assert_eq!(forest.n_trees(), 20);
        assert_eq!(forest.n_features(), 3);
        assert!(forest.total_nodes() >= 20);
        assert!(forest.avg_depth() >= 1.0);
    }
}
