//! Core data models for the analysis service

use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// Number of input features expected by every model
pub const NUM_FEATURES: usize = 11;

/// The fixed set of biological measurements describing one sample.
///
/// The enum is the canonical feature identity; the wire names are the
/// only stringly-typed surface and are validated at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    GeneBrca1,
    GeneTp53,
    GeneEgfr,
    GeneMyc,
    GeneKras,
    CellCount,
    CellViability,
    PhLevel,
    Temperature,
    OxygenLevel,
    GlucoseLevel,
}

impl Feature {
    /// All features in canonical training order
    pub const ALL: [Feature; NUM_FEATURES] = [
        Feature::GeneBrca1,
        Feature::GeneTp53,
        Feature::GeneEgfr,
        Feature::GeneMyc,
        Feature::GeneKras,
        Feature::CellCount,
        Feature::CellViability,
        Feature::PhLevel,
        Feature::Temperature,
        Feature::OxygenLevel,
        Feature::GlucoseLevel,
    ];

    /// Column name used in CSV headers and JSON payloads
    pub fn wire_name(&self) -> &'static str {
        match self {
            Feature::GeneBrca1 => "gene_BRCA1",
            Feature::GeneTp53 => "gene_TP53",
            Feature::GeneEgfr => "gene_EGFR",
            Feature::GeneMyc => "gene_MYC",
            Feature::GeneKras => "gene_KRAS",
            Feature::CellCount => "cell_count",
            Feature::CellViability => "cell_viability",
            Feature::PhLevel => "ph_level",
            Feature::Temperature => "temperature",
            Feature::OxygenLevel => "oxygen_level",
            Feature::GlucoseLevel => "glucose_level",
        }
    }

    /// Human-readable name for explanations ("gene_BRCA1" -> "Gene Brca1")
    pub fn readable_name(&self) -> String {
        self.wire_name()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }

    /// Position in the canonical training order
    pub fn index(&self) -> usize {
        Feature::ALL.iter().position(|f| f == self).unwrap_or(0)
    }

    /// Resolve a wire name to a feature, if known
    pub fn from_wire(name: &str) -> Option<Feature> {
        Feature::ALL.iter().copied().find(|f| f.wire_name() == name)
    }
}

/// The 11 named measurements of one biological sample.
///
/// Deserialization requires every key to be present and numeric; unknown
/// keys (e.g. target columns in an uploaded row) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    #[serde(rename = "gene_BRCA1")]
    pub gene_brca1: f64,
    #[serde(rename = "gene_TP53")]
    pub gene_tp53: f64,
    #[serde(rename = "gene_EGFR")]
    pub gene_egfr: f64,
    #[serde(rename = "gene_MYC")]
    pub gene_myc: f64,
    #[serde(rename = "gene_KRAS")]
    pub gene_kras: f64,
    pub cell_count: f64,
    pub cell_viability: f64,
    pub ph_level: f64,
    pub temperature: f64,
    pub oxygen_level: f64,
    pub glucose_level: f64,
}

impl FeatureVector {
    /// Values in canonical training order
    pub fn as_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.gene_brca1,
            self.gene_tp53,
            self.gene_egfr,
            self.gene_myc,
            self.gene_kras,
            self.cell_count,
            self.cell_viability,
            self.ph_level,
            self.temperature,
            self.oxygen_level,
            self.glucose_level,
        ]
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.as_array()[feature.index()]
    }

    pub fn set(&mut self, feature: Feature, value: f64) {
        match feature {
            Feature::GeneBrca1 => self.gene_brca1 = value,
            Feature::GeneTp53 => self.gene_tp53 = value,
            Feature::GeneEgfr => self.gene_egfr = value,
            Feature::GeneMyc => self.gene_myc = value,
            Feature::GeneKras => self.gene_kras = value,
            Feature::CellCount => self.cell_count = value,
            Feature::CellViability => self.cell_viability = value,
            Feature::PhLevel => self.ph_level = value,
            Feature::Temperature => self.temperature = value,
            Feature::OxygenLevel => self.oxygen_level = value,
            Feature::GlucoseLevel => self.glucose_level = value,
        }
    }

    /// Parse a JSON object into a feature vector, collecting every missing
    /// or non-numeric key into one human-readable validation error.
    pub fn from_json_map(value: &serde_json::Value) -> Result<FeatureVector, CoreError> {
        let map = value
            .as_object()
            .ok_or_else(|| CoreError::Validation("Feature data must be a JSON object".to_string()))?;

        let mut missing = Vec::new();
        let mut non_numeric = Vec::new();
        let mut values = [0.0_f64; NUM_FEATURES];

        for feature in Feature::ALL {
            match map.get(feature.wire_name()) {
                None => missing.push(feature.wire_name()),
                Some(v) => match v.as_f64() {
                    Some(n) => values[feature.index()] = n,
                    None => non_numeric.push(feature.wire_name()),
                },
            }
        }

        if !missing.is_empty() {
            return Err(CoreError::Validation(format!(
                "Missing required features: {}",
                missing.join(", ")
            )));
        }
        if !non_numeric.is_empty() {
            return Err(CoreError::Validation(format!(
                "Non-numeric values for features: {}",
                non_numeric.join(", ")
            )));
        }

        let mut vector = FeatureVector::zeroed();
        for feature in Feature::ALL {
            vector.set(feature, values[feature.index()]);
        }
        Ok(vector)
    }

    pub(crate) fn zeroed() -> Self {
        Self {
            gene_brca1: 0.0,
            gene_tp53: 0.0,
            gene_egfr: 0.0,
            gene_myc: 0.0,
            gene_kras: 0.0,
            cell_count: 0.0,
            cell_viability: 0.0,
            ph_level: 0.0,
            temperature: 0.0,
            oxygen_level: 0.0,
            glucose_level: 0.0,
        }
    }

    /// Reject values a biological measurement cannot take.
    pub fn validate(&self) -> Result<(), CoreError> {
        for feature in Feature::ALL {
            let value = self.get(feature);
            if !value.is_finite() {
                return Err(CoreError::Validation(format!(
                    "Feature {} is not a finite number",
                    feature.wire_name()
                )));
            }
            if value < 0.0 {
                return Err(CoreError::Validation(format!(
                    "Feature {} is negative; biological metrics must be non-negative",
                    feature.wire_name()
                )));
            }
        }
        Ok(())
    }
}

/// The three predicted quantities, each modeled independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    HealthIndex,
    MutationRisk,
    AdaptationScore,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::HealthIndex, Target::MutationRisk, Target::AdaptationScore];

    pub fn wire_name(&self) -> &'static str {
        match self {
            Target::HealthIndex => "health_index",
            Target::MutationRisk => "mutation_risk",
            Target::AdaptationScore => "adaptation_score",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Target::HealthIndex => "Health Index (overall biological wellness)",
            Target::MutationRisk => "Mutation Risk (genetic instability probability)",
            Target::AdaptationScore => "Adaptation Score (environmental resilience)",
        }
    }

    pub fn from_wire(name: &str) -> Option<Target> {
        Target::ALL.iter().copied().find(|t| t.wire_name() == name)
    }
}

/// One scalar per target, serialized under the target wire names
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetValues {
    pub health_index: f64,
    pub mutation_risk: f64,
    pub adaptation_score: f64,
}

impl TargetValues {
    pub fn get(&self, target: Target) -> f64 {
        match target {
            Target::HealthIndex => self.health_index,
            Target::MutationRisk => self.mutation_risk,
            Target::AdaptationScore => self.adaptation_score,
        }
    }

    pub fn set(&mut self, target: Target, value: f64) {
        match target {
            Target::HealthIndex => self.health_index = value,
            Target::MutationRisk => self.mutation_risk = value,
            Target::AdaptationScore => self.adaptation_score = value,
        }
    }

    pub fn zeroed() -> Self {
        Self {
            health_index: 0.0,
            mutation_risk: 0.0,
            adaptation_score: 0.0,
        }
    }
}

/// One labeled row of the training dataset
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecord {
    pub features: FeatureVector,
    pub targets: TargetValues,
}

/// Prediction output for one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predictions: TargetValues,
    pub confidence: TargetValues,
    pub input_features: FeatureVector,
}

/// Relative importance classification of a feature for one model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactTier {
    High,
    Moderate,
    Low,
}

/// One ranked feature in an explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFeature {
    pub feature: String,
    pub value: f64,
    pub importance: f64,
    pub impact: ImpactTier,
}

/// Global importance narrative for all three models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub summary: String,
    pub health_index: Vec<RankedFeature>,
    pub mutation_risk: Vec<RankedFeature>,
    pub adaptation_score: Vec<RankedFeature>,
}

impl Explanation {
    pub fn ranked(&self, target: Target) -> &[RankedFeature] {
        match target {
            Target::HealthIndex => &self.health_index,
            Target::MutationRisk => &self.mutation_risk,
            Target::AdaptationScore => &self.adaptation_score,
        }
    }
}

/// One step of a simulation sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationPoint {
    pub step: usize,
    pub swept_value: f64,
    pub predictions: TargetValues,
}

/// Ordered predictions from sweeping one feature around its base value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationTrajectory {
    pub varied_feature: String,
    pub base_value: f64,
    pub variation_range: f64,
    pub steps: usize,
    pub points: Vec<SimulationPoint>,
}
