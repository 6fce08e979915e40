//! Offline training command

use anyhow::{Context, Result};
use bio_core::dataset::Dataset;
use bio_core::trainer::{train, TrainingConfig};
use bio_core::Target;
use std::path::Path;
use tabled::Tabled;
use tracing_subscriber::EnvFilter;

use crate::output::{print_success, print_table, OutputFormat};

/// Row for the per-model metrics table
#[derive(Tabled, serde::Serialize)]
struct MetricsRow {
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "R²")]
    r2_score: String,
    #[tabled(rename = "MSE")]
    mse: String,
    #[tabled(rename = "Top Feature")]
    top_feature: String,
    #[tabled(rename = "Artifact")]
    artifact: String,
}

/// Train all three models and print the evaluation metrics
pub fn run_train(
    dataset_path: &Path,
    out_dir: &Path,
    trees: usize,
    depth: usize,
    seed: u64,
    format: OutputFormat,
) -> Result<()> {
    // Surface the trainer's progress events on stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let dataset = Dataset::from_csv_path(dataset_path)
        .with_context(|| format!("failed to load dataset {}", dataset_path.display()))?;

    let config = TrainingConfig {
        seed,
        n_trees: trees,
        max_depth: depth,
        ..TrainingConfig::default()
    };
    let metadata = train(&dataset, &config, out_dir).context("training failed")?;

    let rows: Vec<MetricsRow> = Target::ALL
        .iter()
        .map(|target| {
            let report = &metadata.models[target.wire_name()];
            MetricsRow {
                target: target.wire_name().to_string(),
                r2_score: format!("{:.4}", report.r2_score),
                mse: format!("{:.6}", report.mse),
                top_feature: report
                    .top_features
                    .first()
                    .map(|f| f.name.clone())
                    .unwrap_or_default(),
                artifact: report.artifact.clone(),
            }
        })
        .collect();

    print_table(&rows, format);
    print_success(&format!(
        "Trained {} models on {} samples into {}",
        Target::ALL.len(),
        metadata.dataset_size,
        out_dir.display()
    ));

    Ok(())
}
