//! Offline training pipeline.
//!
//! Fits one random forest per target on a deterministic 80/20 split of
//! the dataset, evaluates R-squared and mean-squared-error on the
//! held-out rows, and persists each forest plus one metadata document.
//! Identical dataset and seed reproduce identical artifacts and metrics.

use crate::dataset::Dataset;
use crate::error::CoreError;
use crate::forest::{ForestConfig, RandomForest};
use crate::models::{Feature, Target};
use crate::store::{artifact_file_name, compute_checksum, TrainedModel};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Metadata document file name
pub const METADATA_FILE: &str = "metadata.json";

/// Number of ranked features recorded per model
pub const TOP_FEATURES: usize = 5;

/// Hyperparameters and split settings for a full training run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub seed: u64,
    pub test_fraction: f64,
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_fraction: 0.2,
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
        }
    }
}

impl TrainingConfig {
    fn forest_config(&self) -> ForestConfig {
        ForestConfig {
            n_trees: self.n_trees,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            seed: self.seed,
        }
    }
}

/// One (feature, importance) pair as recorded in metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceEntry {
    pub name: String,
    pub importance: f64,
}

/// Per-model section of the metadata document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub description: String,
    pub r2_score: f64,
    pub mse: f64,
    pub top_features: Vec<ImportanceEntry>,
    pub artifact: String,
    pub checksum: String,
}

/// Training metadata, written once per run and read at server start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub trained_at: String,
    pub dataset_size: usize,
    pub features: Vec<String>,
    pub training: TrainingConfig,
    pub models: BTreeMap<String, ModelReport>,
}

/// Train all three models and persist them under `out_dir`.
///
/// Returns the metadata that was written. Fails on dataset problems, on
/// forest fitting errors, and on any I/O failure while persisting.
pub fn train(dataset: &Dataset, config: &TrainingConfig, out_dir: &Path) -> Result<ModelMetadata, CoreError> {
    fs::create_dir_all(out_dir)?;

    let n = dataset.len();
    let (train_indices, test_indices) = split_indices(n, config.test_fraction, config.seed);
    info!(
        dataset_size = n,
        train_rows = train_indices.len(),
        test_rows = test_indices.len(),
        seed = config.seed,
        "Dataset split"
    );

    let matrix = dataset.feature_matrix();
    let train_samples: Vec<Vec<f64>> = train_indices.iter().map(|&i| matrix[i].clone()).collect();
    let test_samples: Vec<Vec<f64>> = test_indices.iter().map(|&i| matrix[i].clone()).collect();

    let mut models = BTreeMap::new();
    for target in Target::ALL {
        let column = dataset.target_column(target);
        let train_targets: Vec<f64> = train_indices.iter().map(|&i| column[i]).collect();
        let test_targets: Vec<f64> = test_indices.iter().map(|&i| column[i]).collect();

        let forest = RandomForest::fit(&train_samples, &train_targets, &config.forest_config())?;

        let predictions: Vec<f64> = test_samples.iter().map(|s| forest.predict(s)).collect();
        let mse = mean_squared_error(&test_targets, &predictions);
        let r2 = r2_score(&test_targets, &predictions);
        let top_features = rank_importances(forest.feature_importances(), TOP_FEATURES);

        info!(
            target = target.wire_name(),
            r2_score = r2,
            mse = mse,
            n_trees = forest.n_trees(),
            top_feature = %top_features.first().map(|f| f.name.as_str()).unwrap_or("-"),
            "Model trained"
        );

        let artifact = artifact_file_name(target);
        let bytes = serde_json::to_vec(&TrainedModel { target, forest })?;
        write_atomically(&out_dir.join(&artifact), &bytes)?;

        models.insert(
            target.wire_name().to_string(),
            ModelReport {
                description: target.description().to_string(),
                r2_score: r2,
                mse,
                top_features,
                checksum: compute_checksum(&bytes),
                artifact,
            },
        );
    }

    let metadata = ModelMetadata {
        trained_at: chrono::Utc::now().to_rfc3339(),
        dataset_size: n,
        features: Feature::ALL.iter().map(|f| f.wire_name().to_string()).collect(),
        training: *config,
        models,
    };
    write_atomically(
        &out_dir.join(METADATA_FILE),
        &serde_json::to_vec_pretty(&metadata)?,
    )?;

    Ok(metadata)
}

/// Deterministic shuffled split. The test side gets at least one row and
/// never the whole dataset.
fn split_indices(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_len = ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1);
    let test = indices[..test_len].to_vec();
    let train = indices[test_len..].to_vec();
    (train, test)
}

fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64
}

/// Coefficient of determination; zero when the test targets are constant.
fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    let mean: f64 = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return 0.0;
    }
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    1.0 - ss_res / ss_tot
}

/// Sort importances descending and keep the leading entries.
fn rank_importances(importances: &[f64], limit: usize) -> Vec<ImportanceEntry> {
    let mut ranked: Vec<(Feature, f64)> = Feature::ALL
        .iter()
        .map(|&f| (f, importances[f.index()]))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked
        .into_iter()
        .take(limit)
        .map(|(f, importance)| ImportanceEntry {
            name: f.wire_name().to_string(),
            importance,
        })
        .collect()
}

/// Write via temp file and rename so a crashed run never leaves a
/// half-written artifact behind.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), CoreError> {
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;
    Ok(())
}
