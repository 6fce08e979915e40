//! Sample data and server status commands

use anyhow::Result;
use bio_core::{Feature, HealthResponse, ReadinessResponse, Target};
use serde_json::json;
use tabled::Tabled;

use crate::client::{ApiClient, ExplainResponse, SampleDataResponse};
use crate::output::{print_info, print_success, print_table, OutputFormat};

/// Row for the sample record table
#[derive(Tabled, serde::Serialize)]
struct SampleRow {
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Row for the model status table
#[derive(Tabled, serde::Serialize)]
struct ModelStatusRow {
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "R²")]
    r2_score: String,
    #[tabled(rename = "MSE")]
    mse: String,
    #[tabled(rename = "Description")]
    description: String,
}

/// Fetch and print the canonical sample record
pub async fn run_sample(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let sample: SampleDataResponse = client.get("api/sample-data").await?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&sample)?);
        return Ok(());
    }

    let rows: Vec<SampleRow> = Feature::ALL
        .iter()
        .map(|&feature| SampleRow {
            feature: feature.wire_name().to_string(),
            value: sample.data.get(feature).to_string(),
        })
        .collect();
    print_table(&rows, format);
    print_info(&sample.note);

    Ok(())
}

/// Print server health, readiness, and per-model diagnostics
pub async fn run_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: HealthResponse = client.get("healthz").await?;
    let readiness: ReadinessResponse = client.get("readyz").await?;

    let mut models = Vec::new();
    for target in Target::ALL {
        let explain: ExplainResponse = client
            .post("api/explain", &json!({ "target": target.wire_name() }))
            .await?;
        models.push(ModelStatusRow {
            target: explain.target,
            r2_score: format!("{:.4}", explain.performance.r2_score),
            mse: format!("{:.6}", explain.performance.mse),
            description: explain.description,
        });
    }

    if let OutputFormat::Json = format {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "health": health,
                "readiness": readiness,
                "models": models,
            }))?
        );
        return Ok(());
    }

    print_success(&format!(
        "Server is {:?}, ready: {}",
        health.status, readiness.ready
    ));
    print_table(&models, format);

    Ok(())
}
