//! Parameter-sweep simulation.
//!
//! Sweeps one feature across a symmetric range around its base value
//! and re-runs the full analysis at every step. Each step is an
//! independent, stateless prediction; the trajectory is ordered by
//! ascending swept value for charting.

use crate::error::CoreError;
use crate::models::{Feature, FeatureVector, SimulationPoint, SimulationTrajectory};
use crate::predictor::AnalysisEngine;
use tracing::debug;

/// A trajectory needs at least two points to show variation
pub const MIN_STEPS: usize = 2;

/// Run a sweep of `feature` from base*(1-f) to base*(1+f) in `steps`
/// evenly spaced values, holding every other feature at its base value.
pub fn simulate(
    engine: &AnalysisEngine,
    base: &FeatureVector,
    feature: Feature,
    steps: usize,
    variation_range: f64,
) -> Result<SimulationTrajectory, CoreError> {
    if steps < MIN_STEPS {
        return Err(CoreError::Validation(format!(
            "steps must be at least {}, got {}",
            MIN_STEPS, steps
        )));
    }
    if !variation_range.is_finite() || variation_range <= 0.0 || variation_range > 1.0 {
        return Err(CoreError::Validation(format!(
            "variation_range must be in (0, 1], got {}",
            variation_range
        )));
    }
    base.validate()?;

    let base_value = base.get(feature);
    let mut points = Vec::with_capacity(steps);

    for step in 0..steps {
        let factor =
            1.0 - variation_range + 2.0 * variation_range * step as f64 / (steps - 1) as f64;
        let swept_value = base_value * factor;

        let mut modified = base.clone();
        modified.set(feature, swept_value);
        let result = engine.analyze(&modified)?;

        points.push(SimulationPoint {
            step,
            swept_value,
            predictions: result.predictions,
        });
    }

    debug!(
        feature = feature.wire_name(),
        steps,
        variation_range,
        "Simulation completed"
    );

    Ok(SimulationTrajectory {
        varied_feature: feature.wire_name().to_string(),
        base_value,
        variation_range,
        steps,
        points,
    })
}
