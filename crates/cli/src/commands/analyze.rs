//! Analysis command

use anyhow::{Context, Result};
use bio_core::{FeatureVector, Target};
use serde_json::json;
use std::path::Path;
use tabled::Tabled;

use crate::client::{AnalyzeResponse, ApiClient, SampleDataResponse};
use crate::output::{color_confidence, color_impact, format_score, print_info, print_table, OutputFormat};

/// Row for the predictions table
#[derive(Tabled, serde::Serialize)]
struct PredictionRow {
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Prediction")]
    prediction: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

/// Row for the ranked features table
#[derive(Tabled, serde::Serialize)]
struct FeatureRow {
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Importance")]
    importance: String,
    #[tabled(rename = "Impact")]
    impact: String,
}

/// Load the feature vector to analyze: from a JSON file, or from the
/// server's sample record when no file is given.
pub async fn load_features(client: &ApiClient, input: Option<&Path>) -> Result<FeatureVector> {
    match input {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("{} is not a valid feature vector", path.display()))
        }
        None => {
            let sample: SampleDataResponse = client.get("api/sample-data").await?;
            print_info(&sample.note);
            Ok(sample.data)
        }
    }
}

/// Analyze one sample and print predictions with explanations
pub async fn run_analyze(client: &ApiClient, input: Option<&Path>, format: OutputFormat) -> Result<()> {
    let features = load_features(client, input).await?;

    let response: AnalyzeResponse = client
        .post("api/analyze", &json!({ "data": features }))
        .await?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let rows: Vec<PredictionRow> = Target::ALL
        .iter()
        .map(|&target| PredictionRow {
            target: target.wire_name().to_string(),
            prediction: format_score(response.predictions.get(target)),
            confidence: color_confidence(response.confidence.get(target)),
        })
        .collect();
    print_table(&rows, format);

    println!("\n{}", response.explanation.summary);

    for &target in &Target::ALL {
        println!("\nTop features for {}:", target.wire_name());
        let rows: Vec<FeatureRow> = response
            .explanation
            .ranked(target)
            .iter()
            .map(|f| FeatureRow {
                feature: f.feature.clone(),
                value: format_score(f.value),
                importance: format!("{:.3}", f.importance),
                impact: color_impact(match f.impact {
                    bio_core::ImpactTier::High => "high",
                    bio_core::ImpactTier::Moderate => "moderate",
                    bio_core::ImpactTier::Low => "low",
                }),
            })
            .collect();
        print_table(&rows, format);
    }

    println!("\n{}", response.disclaimer);
    Ok(())
}
