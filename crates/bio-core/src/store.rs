//! Immutable model store.
//!
//! Loads the three persisted forests plus their metadata at process
//! start and exposes read-only lookup by target. Every artifact is
//! checksum-validated against the metadata before it is accepted; any
//! absent, corrupt, or mismatched file fails the whole load — there is
//! no partial-service mode. After a successful load the store is never
//! written again, so it is shared across request handlers behind an
//! `Arc` without locking.

use crate::error::CoreError;
use crate::forest::RandomForest;
use crate::models::{Target, NUM_FEATURES};
use crate::trainer::{ModelMetadata, METADATA_FILE};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// On-disk form of one fitted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub target: Target,
    pub forest: RandomForest,
}

/// File name of the serialized forest for one target
pub fn artifact_file_name(target: Target) -> String {
    format!("{}_model.json", target.wire_name())
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// All three fitted models plus training metadata, immutable after load.
#[derive(Debug, Clone)]
pub struct ModelStore {
    models: HashMap<Target, TrainedModel>,
    metadata: ModelMetadata,
}

impl ModelStore {
    /// Load all artifacts from `dir`, refusing to serve on any failure.
    pub fn load(dir: &Path) -> Result<Self, CoreError> {
        let metadata_path = dir.join(METADATA_FILE);
        let metadata_bytes = std::fs::read(&metadata_path).map_err(|e| {
            CoreError::Artifact(format!(
                "cannot read {}: {} (run the trainer first)",
                metadata_path.display(),
                e
            ))
        })?;
        let metadata: ModelMetadata = serde_json::from_slice(&metadata_bytes)
            .map_err(|e| CoreError::Artifact(format!("corrupt {}: {}", METADATA_FILE, e)))?;

        let mut models = HashMap::new();
        for target in Target::ALL {
            let report = metadata.models.get(target.wire_name()).ok_or_else(|| {
                CoreError::Artifact(format!(
                    "metadata has no entry for target {}",
                    target.wire_name()
                ))
            })?;

            let artifact_path = dir.join(&report.artifact);
            let bytes = std::fs::read(&artifact_path).map_err(|e| {
                CoreError::Artifact(format!("cannot read {}: {}", artifact_path.display(), e))
            })?;

            let checksum = compute_checksum(&bytes);
            if checksum != report.checksum {
                return Err(CoreError::Artifact(format!(
                    "checksum mismatch for {}: expected {}, got {}",
                    report.artifact, report.checksum, checksum
                )));
            }

            let model: TrainedModel = serde_json::from_slice(&bytes).map_err(|e| {
                CoreError::Artifact(format!("corrupt artifact {}: {}", report.artifact, e))
            })?;
            if model.target != target {
                return Err(CoreError::Artifact(format!(
                    "artifact {} contains model for {}, expected {}",
                    report.artifact,
                    model.target.wire_name(),
                    target.wire_name()
                )));
            }
            if model.forest.n_features() != NUM_FEATURES {
                return Err(CoreError::Artifact(format!(
                    "artifact {} expects {} features, this service has {}",
                    report.artifact,
                    model.forest.n_features(),
                    NUM_FEATURES
                )));
            }

            info!(
                target = target.wire_name(),
                checksum = %checksum,
                n_trees = model.forest.n_trees(),
                "Model artifact loaded"
            );
            models.insert(target, model);
        }

        Ok(Self { models, metadata })
    }

    /// Look up the fitted model for one target
    pub fn model(&self, target: Target) -> &TrainedModel {
        &self.models[&target]
    }

    pub fn forest(&self, target: Target) -> &RandomForest {
        &self.models[&target].forest
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}
