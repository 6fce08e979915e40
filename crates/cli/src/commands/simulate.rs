//! Simulation command

use anyhow::Result;
use serde_json::json;
use std::path::Path;
use tabled::Tabled;

use crate::client::{ApiClient, SimulateResponse};
use crate::commands::analyze::load_features;
use crate::output::{format_score, print_info, print_table, OutputFormat};

/// Row for the trajectory table
#[derive(Tabled, serde::Serialize)]
struct TrajectoryRow {
    #[tabled(rename = "Step")]
    step: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Health")]
    health_index: String,
    #[tabled(rename = "Mutation Risk")]
    mutation_risk: String,
    #[tabled(rename = "Adaptation")]
    adaptation_score: String,
}

/// Sweep one feature on the server and print the trajectory
pub async fn run_simulate(
    client: &ApiClient,
    feature: &str,
    steps: usize,
    range: f64,
    input: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let base = load_features(client, input).await?;

    let response: SimulateResponse = client
        .post(
            "api/simulate",
            &json!({
                "base_features": base,
                "vary_feature": feature,
                "steps": steps,
                "variation_range": range,
            }),
        )
        .await?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    print_info(&format!(
        "Swept {} over ±{:.0}% of base value {}",
        response.varied_feature,
        response.variation_range * 100.0,
        format_score(response.base_value)
    ));

    let number = |point: &serde_json::Value, key: &str| {
        point.get(key).and_then(|v| v.as_f64()).unwrap_or(f64::NAN)
    };
    let rows: Vec<TrajectoryRow> = response
        .trajectory
        .iter()
        .map(|point| TrajectoryRow {
            step: number(point, "step").to_string(),
            value: format_score(number(point, &response.varied_feature)),
            health_index: format_score(number(point, "health_index")),
            mutation_risk: format_score(number(point, "mutation_risk")),
            adaptation_score: format_score(number(point, "adaptation_score")),
        })
        .collect();
    print_table(&rows, format);

    Ok(())
}
