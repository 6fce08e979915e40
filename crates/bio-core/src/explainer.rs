//! Global importance explanations.
//!
//! Each model carries a static importance vector learned at training
//! time. The explainer ranks it, classifies features into impact tiers
//! by rank position, and templates a one-paragraph narrative around the
//! three predicted values. This is a global explanation of what each
//! model weighs, not a per-prediction attribution.

use crate::models::{
    Explanation, Feature, FeatureVector, ImpactTier, RankedFeature, Target, TargetValues,
};
use crate::store::ModelStore;

/// Number of ranked features reported per model
pub const TOP_K: usize = 5;

/// Tier by rank position: top third of the ranked list is high impact,
/// middle third moderate, remainder low.
pub fn tier_for_rank(rank: usize, count: usize) -> ImpactTier {
    if rank * 3 < count {
        ImpactTier::High
    } else if rank * 3 < 2 * count {
        ImpactTier::Moderate
    } else {
        ImpactTier::Low
    }
}

/// Build the full explanation for one prediction.
pub fn explain(store: &ModelStore, features: &FeatureVector, predictions: &TargetValues) -> Explanation {
    let health_index = ranked_features(store, Target::HealthIndex, features);
    let mutation_risk = ranked_features(store, Target::MutationRisk, features);
    let adaptation_score = ranked_features(store, Target::AdaptationScore, features);

    let summary = summarize(predictions, &health_index, &mutation_risk);

    Explanation {
        summary,
        health_index,
        mutation_risk,
        adaptation_score,
    }
}

/// Rank one model's importance vector descending and keep the top K.
fn ranked_features(store: &ModelStore, target: Target, features: &FeatureVector) -> Vec<RankedFeature> {
    let importances = store.forest(target).feature_importances();
    let mut order: Vec<Feature> = Feature::ALL.to_vec();
    order.sort_by(|a, b| {
        importances[b.index()]
            .partial_cmp(&importances[a.index()])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    order
        .into_iter()
        .take(TOP_K)
        .enumerate()
        .map(|(rank, feature)| RankedFeature {
            feature: feature.readable_name(),
            value: features.get(feature),
            importance: importances[feature.index()],
            impact: tier_for_rank(rank, TOP_K),
        })
        .collect()
}

fn summarize(
    predictions: &TargetValues,
    health_features: &[RankedFeature],
    risk_features: &[RankedFeature],
) -> String {
    let health = predictions.health_index;
    let risk = predictions.mutation_risk;
    let adaptation = predictions.adaptation_score;

    let health_status = if health > 0.85 {
        "excellent"
    } else if health > 0.70 {
        "good"
    } else if health > 0.55 {
        "moderate"
    } else {
        "concerning"
    };
    let risk_status = if risk < 0.15 {
        "low"
    } else if risk < 0.30 {
        "moderate"
    } else if risk < 0.45 {
        "elevated"
    } else {
        "high"
    };
    let adaptation_status = if adaptation > 0.80 {
        "high"
    } else if adaptation > 0.60 {
        "moderate"
    } else {
        "low"
    };

    let mut summary = format!(
        "The biological system shows {} health (index: {:.2}) with {} mutation risk ({:.2}) \
         and {} adaptation capability ({:.2}).",
        health_status, health, risk_status, risk, adaptation_status, adaptation
    );

    if let (Some(top_health), Some(top_risk)) = (health_features.first(), risk_features.first()) {
        summary.push_str(&format!(
            " Primary health driver: {}. Main risk factor: {}.",
            top_health.feature, top_risk.feature
        ));
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{canonical_vector, trained_engine};

    #[test]
    fn tiers_split_rank_list_into_thirds() {
        assert_eq!(tier_for_rank(0, 5), ImpactTier::High);
        assert_eq!(tier_for_rank(1, 5), ImpactTier::High);
        assert_eq!(tier_for_rank(2, 5), ImpactTier::Moderate);
        assert_eq!(tier_for_rank(3, 5), ImpactTier::Moderate);
        assert_eq!(tier_for_rank(4, 5), ImpactTier::Low);

        assert_eq!(tier_for_rank(0, 3), ImpactTier::High);
        assert_eq!(tier_for_rank(1, 3), ImpactTier::Moderate);
        assert_eq!(tier_for_rank(2, 3), ImpactTier::Low);
    }

    #[test]
    fn first_ranked_feature_matches_argmax_importance() {
        let engine = trained_engine();
        let vector = canonical_vector();
        let result = engine.analyze(&vector).unwrap();
        let explanation = explain(engine.store(), &vector, &result.predictions);

        for target in Target::ALL {
            let importances = engine.store().forest(target).feature_importances();
            let argmax = Feature::ALL
                .iter()
                .max_by(|a, b| {
                    importances[a.index()]
                        .partial_cmp(&importances[b.index()])
                        .unwrap()
                })
                .unwrap();
            assert_eq!(
                explanation.ranked(target)[0].feature,
                argmax.readable_name(),
                "wrong leading feature for {}",
                target.wire_name()
            );
        }
    }

    #[test]
    fn every_target_gets_top_k_ranked_features() {
        let engine = trained_engine();
        let vector = canonical_vector();
        let result = engine.analyze(&vector).unwrap();
        let explanation = explain(engine.store(), &vector, &result.predictions);

        for target in Target::ALL {
            let ranked = explanation.ranked(target);
            assert_eq!(ranked.len(), TOP_K);
            let importances: Vec<f64> = ranked.iter().map(|f| f.importance).collect();
            assert!(importances.windows(2).all(|w| w[0] >= w[1]));
            assert_eq!(ranked[0].impact, ImpactTier::High);
        }
    }

    #[test]
    fn summary_mentions_leading_features() {
        let engine = trained_engine();
        let vector = canonical_vector();
        let result = engine.analyze(&vector).unwrap();
        let explanation = explain(engine.store(), &vector, &result.predictions);

        assert!(!explanation.summary.is_empty());
        assert!(explanation.summary.contains("Primary health driver"));
        assert!(explanation.summary.contains(&explanation.health_index[0].feature));
        assert!(explanation.summary.contains(&explanation.mutation_risk[0].feature));
    }

    #[test]
    fn summary_phrasing_tracks_thresholds() {
        let engine = trained_engine();
        let vector = canonical_vector();

        let high = TargetValues {
            health_index: 0.9,
            mutation_risk: 0.1,
            adaptation_score: 0.9,
        };
        let summary = explain(engine.store(), &vector, &high).summary;
        assert!(summary.contains("excellent health"));
        assert!(summary.contains("low mutation risk"));

        let low = TargetValues {
            health_index: 0.3,
            mutation_risk: 0.6,
            adaptation_score: 0.3,
        };
        let summary = explain(engine.store(), &vector, &low).summary;
        assert!(summary.contains("concerning health"));
        assert!(summary.contains("high mutation risk"));
        assert!(summary.contains("low adaptation capability"));
    }
}
