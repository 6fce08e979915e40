//! Training dataset loading and CSV upload previews

use crate::error::CoreError;
use crate::models::{Feature, FeatureVector, Target, TargetValues, TrainingRecord, NUM_FEATURES};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Number of rows returned in an upload preview
pub const PREVIEW_ROWS: usize = 5;

/// The labeled biological measurement set used for training.
///
/// Loaded once; the first record is the canonical sample returned by the
/// sample-data endpoint.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<TrainingRecord>,
}

impl Dataset {
    /// Load the dataset from a CSV file.
    ///
    /// Fails if any of the 11 feature columns or 3 target columns is
    /// absent, any value fails to parse, or fewer than two rows remain.
    pub fn from_csv_path(path: &Path) -> Result<Self, CoreError> {
        let file = std::fs::File::open(path).map_err(|e| {
            CoreError::Dataset(format!("cannot open dataset {}: {}", path.display(), e))
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CoreError> {
        let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| CoreError::Dataset(format!("cannot read header row: {}", e)))?
            .clone();
        let column_index: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name, i))
            .collect();

        let mut missing: Vec<&str> = Feature::ALL
            .iter()
            .map(|f| f.wire_name())
            .filter(|name| !column_index.contains_key(name))
            .collect();
        missing.extend(
            Target::ALL
                .iter()
                .map(|t| t.wire_name())
                .filter(|name| !column_index.contains_key(name)),
        );
        if !missing.is_empty() {
            return Err(CoreError::Dataset(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        let mut records = Vec::new();
        for (row_number, row) in csv_reader.records().enumerate() {
            let row = row?;
            let parse = |name: &str| -> Result<f64, CoreError> {
                let idx = column_index[name];
                row.get(idx)
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .ok_or_else(|| {
                        CoreError::Dataset(format!(
                            "row {}: column {} is not a number",
                            row_number + 1,
                            name
                        ))
                    })
            };

            let mut features = [0.0_f64; NUM_FEATURES];
            for feature in Feature::ALL {
                features[feature.index()] = parse(feature.wire_name())?;
            }
            let mut vector = FeatureVector::zeroed();
            for feature in Feature::ALL {
                vector.set(feature, features[feature.index()]);
            }

            let mut targets = TargetValues::zeroed();
            for target in Target::ALL {
                targets.set(target, parse(target.wire_name())?);
            }

            records.push(TrainingRecord {
                features: vector,
                targets,
            });
        }

        if records.len() < 2 {
            return Err(CoreError::Dataset(format!(
                "dataset has {} rows; at least two are required to split",
                records.len()
            )));
        }

        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TrainingRecord] {
        &self.records
    }

    /// Canonical demo record (the first dataset row)
    pub fn sample(&self) -> &TrainingRecord {
        &self.records[0]
    }

    /// Feature rows in canonical column order
    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        self.records
            .iter()
            .map(|r| r.features.as_array().to_vec())
            .collect()
    }

    /// One target column
    pub fn target_column(&self, target: Target) -> Vec<f64> {
        self.records.iter().map(|r| r.targets.get(target)).collect()
    }
}

/// Bounded preview of an uploaded CSV
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadPreview {
    pub rows: usize,
    pub columns: Vec<String>,
    pub preview_data: Vec<HashMap<String, serde_json::Value>>,
    pub has_required_features: bool,
}

/// Parse uploaded CSV text into a column list, row count, and a preview
/// of the first [`PREVIEW_ROWS`] rows. Numeric cells become JSON numbers,
/// everything else stays a string.
pub fn preview_csv(text: &str) -> Result<UploadPreview, CoreError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| CoreError::Validation(format!("cannot read CSV header: {}", e)))?
        .clone();
    let columns: Vec<String> = headers.iter().map(str::to_string).collect();

    let has_required_features = Feature::ALL
        .iter()
        .all(|f| columns.iter().any(|c| c == f.wire_name()));

    let mut rows = 0usize;
    let mut preview_data = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| CoreError::Validation(format!("malformed CSV row: {}", e)))?;
        if preview_data.len() < PREVIEW_ROWS {
            let mut entry = HashMap::new();
            for (name, value) in columns.iter().zip(row.iter()) {
                let parsed = match value.trim().parse::<f64>() {
                    Ok(n) => serde_json::Value::from(n),
                    Err(_) => serde_json::Value::from(value.to_string()),
                };
                entry.insert(name.clone(), parsed);
            }
            preview_data.push(entry);
        }
        rows += 1;
    }

    Ok(UploadPreview {
        rows,
        columns,
        preview_data,
        has_required_features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET_CSV: &str = include_str!("../../../data/biological_samples.csv");

    #[test]
    fn loads_bundled_dataset() {
        let dataset = Dataset::from_reader(DATASET_CSV.as_bytes()).unwrap();
        assert!(dataset.len() >= 2);

        let sample = dataset.sample();
        assert_eq!(sample.features.gene_brca1, 0.5);
        assert_eq!(sample.features.cell_count, 5000.0);
        assert_eq!(sample.features.oxygen_level, 95.0);
        for target in Target::ALL {
            let value = sample.targets.get(target);
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn rejects_missing_columns() {
        let csv = "gene_BRCA1,health_index\n0.5,0.7\n0.6,0.8\n";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("missing required columns"));
        assert!(err.to_string().contains("gene_TP53"));
    }

    #[test]
    fn rejects_single_row() {
        let mut lines = DATASET_CSV.lines();
        let header = lines.next().unwrap();
        let first = lines.next().unwrap();
        let csv = format!("{}\n{}\n", header, first);
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("at least two"));
    }

    #[test]
    fn rejects_non_numeric_cell() {
        let mut lines = DATASET_CSV.lines();
        let header = lines.next().unwrap().to_string();
        let first = lines.next().unwrap().replace("7.20", "acidic");
        let second = lines.next().unwrap();
        let csv = format!("{}\n{}\n{}\n", header, first, second);
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("not a number"));
    }

    #[test]
    fn feature_matrix_shape() {
        let dataset = Dataset::from_reader(DATASET_CSV.as_bytes()).unwrap();
        let matrix = dataset.feature_matrix();
        assert_eq!(matrix.len(), dataset.len());
        assert!(matrix.iter().all(|row| row.len() == NUM_FEATURES));
        assert_eq!(dataset.target_column(Target::HealthIndex).len(), dataset.len());
    }

    #[test]
    fn preview_reports_columns_and_rows() {
        let preview = preview_csv(DATASET_CSV).unwrap();
        assert!(preview.has_required_features);
        assert_eq!(preview.columns.len(), NUM_FEATURES + 3);
        assert_eq!(preview.preview_data.len(), PREVIEW_ROWS);
        assert!(preview.rows > PREVIEW_ROWS);
        assert!(preview.preview_data[0]["gene_BRCA1"].is_number());
    }

    #[test]
    fn preview_flags_missing_features() {
        let csv = "a,b\n1,2\n";
        let preview = preview_csv(csv).unwrap();
        assert!(!preview.has_required_features);
        assert_eq!(preview.rows, 1);
        assert_eq!(preview.columns, vec!["a", "b"]);
    }

    #[test]
    fn preview_keeps_non_numeric_cells_as_strings() {
        let csv = "name,value\nalpha,1.5\n";
        let preview = preview_csv(csv).unwrap();
        assert_eq!(preview.preview_data[0]["name"], serde_json::json!("alpha"));
        assert_eq!(preview.preview_data[0]["value"], serde_json::json!(1.5));
    }
}
