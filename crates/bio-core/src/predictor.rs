//! Analysis engine
//!
//! Runs one validated feature vector through all three forests and
//! attaches a confidence score per target derived from how tightly the
//! trees of each forest agree on the input.

use crate::error::CoreError;
use crate::models::{FeatureVector, PredictionResult, Target, TargetValues};
use crate::store::ModelStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Maximum inference latency before warning (5ms target)
const MAX_INFERENCE_MS: u128 = 5;

/// Monotone decreasing map from ensemble dispersion to a (0, 1] score.
///
/// Zero spread across trees gives confidence 1.0; the score is not a
/// calibrated probability, only an agreement signal.
pub fn confidence_from_dispersion(dispersion: f64) -> f64 {
    1.0 / (1.0 + dispersion)
}

/// Stateless prediction front end over the immutable model store.
#[derive(Clone)]
pub struct AnalysisEngine {
    store: Arc<ModelStore>,
}

impl AnalysisEngine {
    pub fn new(store: Arc<ModelStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Predict all three targets for one sample.
    ///
    /// Validation runs before any forest is consulted; a rejected vector
    /// never touches a model. Predictions are the raw forest means — an
    /// out-of-distribution input may land outside [0, 1] and is not
    /// corrected.
    pub fn analyze(&self, features: &FeatureVector) -> Result<PredictionResult, CoreError> {
        features.validate()?;

        let start = Instant::now();
        let array = features.as_array();
        let mut predictions = TargetValues::zeroed();
        let mut confidence = TargetValues::zeroed();

        for target in Target::ALL {
            let forest = self.store.forest(target);
            let tree_predictions = forest.tree_predictions(&array);
            let n = tree_predictions.len() as f64;
            let mean = tree_predictions.iter().sum::<f64>() / n;
            let variance = tree_predictions.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;

            predictions.set(target, mean);
            confidence.set(target, confidence_from_dispersion(variance.sqrt()));
        }

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(
                elapsed_ms = elapsed.as_millis(),
                "Inference exceeded {}ms target", MAX_INFERENCE_MS
            );
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(PredictionResult {
            predictions,
            confidence,
            input_features: features.clone(),
        })
    }
}
