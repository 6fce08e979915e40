//! Integration tests for the analysis API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use bio_core::dataset::Dataset;
use bio_core::health::components;
use bio_core::trainer::{train, TrainingConfig};
use bio_core::{AnalysisEngine, HealthRegistry, ModelStore, ServiceMetrics, StructuredLogger};
use bio_server::api::{create_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const DATASET_CSV: &str = include_str!("../../../data/biological_samples.csv");

fn canonical_payload() -> Value {
    json!({
        "gene_BRCA1": 0.5,
        "gene_TP53": 0.5,
        "gene_EGFR": 0.5,
        "gene_MYC": 0.5,
        "gene_KRAS": 0.5,
        "cell_count": 5000,
        "cell_viability": 0.9,
        "ph_level": 7.2,
        "temperature": 37.0,
        "oxygen_level": 95,
        "glucose_level": 5.5
    })
}

async fn setup_test_app() -> (Router, Arc<AppState>) {
    let dir = TempDir::new().unwrap();
    let dataset = Dataset::from_reader(DATASET_CSV.as_bytes()).unwrap();
    let config = TrainingConfig {
        n_trees: 15,
        max_depth: 6,
        ..TrainingConfig::default()
    };
    train(&dataset, &config, dir.path()).unwrap();
    let store = ModelStore::load(dir.path()).unwrap();

    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL_STORE).await;
    health_registry.register(components::DATASET).await;
    health_registry.set_ready(true).await;

    let state = Arc::new(AppState {
        engine: AnalysisEngine::new(Arc::new(store)),
        dataset: Arc::new(dataset),
        health_registry,
        metrics: ServiceMetrics::new(),
        logger: StructuredLogger::new(),
        max_upload_bytes: 16 * 1024 * 1024,
        max_simulation_steps: 200,
    });
    let router = create_router(state.clone());

    (router, state)
}

async fn post_json(app: Router, uri: &str, payload: &Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_analyze_returns_predictions_and_explanation() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = post_json(app, "/api/analyze", &json!({ "data": canonical_payload() })).await;
    assert_eq!(status, StatusCode::OK);

    for target in ["health_index", "mutation_risk", "adaptation_score"] {
        let prediction = body["predictions"][target].as_f64().unwrap();
        assert!(
            (0.0..=1.0).contains(&prediction),
            "{} predicted {}",
            target,
            prediction
        );

        let confidence = body["confidence"][target].as_f64().unwrap();
        assert!(confidence > 0.0 && confidence <= 1.0);

        let ranked = body["explanation"][target].as_array().unwrap();
        assert!(ranked.len() >= 3, "{} has {} ranked features", target, ranked.len());
        assert_eq!(ranked[0]["impact"], "high");
    }

    let summary = body["explanation"]["summary"].as_str().unwrap();
    assert!(!summary.is_empty());

    assert_eq!(body["input_features"]["gene_BRCA1"], json!(0.5));
    assert!(body["disclaimer"].as_str().unwrap().contains("research"));
}

#[tokio::test]
async fn test_analyze_is_deterministic() {
    let (app, _state) = setup_test_app().await;
    let payload = json!({ "data": canonical_payload() });

    let (_, first) = post_json(app.clone(), "/api/analyze", &payload).await;
    let (_, second) = post_json(app, "/api/analyze", &payload).await;
    assert_eq!(first["predictions"], second["predictions"]);
    assert_eq!(first["confidence"], second["confidence"]);
}

#[tokio::test]
async fn test_analyze_rejects_missing_feature() {
    let (app, _state) = setup_test_app().await;

    let mut payload = canonical_payload();
    payload.as_object_mut().unwrap().remove("gene_TP53");
    let (status, body) = post_json(app, "/api/analyze", &json!({ "data": payload })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("Missing required features"));
    assert!(message.contains("gene_TP53"));
}

#[tokio::test]
async fn test_analyze_rejects_non_numeric_feature() {
    let (app, _state) = setup_test_app().await;

    let mut payload = canonical_payload();
    payload["temperature"] = json!("warm");
    let (status, body) = post_json(app, "/api/analyze", &json!({ "data": payload })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("temperature"));
}

#[tokio::test]
async fn test_analyze_rejects_negative_value() {
    let (app, _state) = setup_test_app().await;

    let mut payload = canonical_payload();
    payload["cell_count"] = json!(-10);
    let (status, body) = post_json(app, "/api/analyze", &json!({ "data": payload })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("non-negative"));
}

#[tokio::test]
async fn test_simulate_sweeps_reference_trajectory() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = post_json(
        app,
        "/api/simulate",
        &json!({
            "base_features": canonical_payload(),
            "vary_feature": "gene_BRCA1",
            "steps": 5,
            "variation_range": 0.2
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["varied_feature"], "gene_BRCA1");
    assert_eq!(body["base_value"], json!(0.5));
    assert_eq!(body["steps"], json!(5));

    let trajectory = body["trajectory"].as_array().unwrap();
    assert_eq!(trajectory.len(), 5);

    let expected = [0.4, 0.45, 0.5, 0.55, 0.6];
    for (i, (point, expected)) in trajectory.iter().zip(expected).enumerate() {
        let swept = point["gene_BRCA1"].as_f64().unwrap();
        assert!(
            (swept - expected).abs() < 1e-9,
            "step {} swept {} expected {}",
            i,
            swept,
            expected
        );
        for target in ["health_index", "mutation_risk", "adaptation_score"] {
            assert!(point[target].is_number(), "step {} missing {}", i, target);
        }
    }

    let values: Vec<f64> = trajectory
        .iter()
        .map(|p| p["gene_BRCA1"].as_f64().unwrap())
        .collect();
    assert!(values.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_simulate_rejects_unknown_feature() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = post_json(
        app,
        "/api/simulate",
        &json!({
            "base_features": canonical_payload(),
            "vary_feature": "gene_UNKNOWN",
            "steps": 5,
            "variation_range": 0.2
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Unknown feature"));
}

#[tokio::test]
async fn test_simulate_rejects_single_step() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = post_json(
        app,
        "/api/simulate",
        &json!({
            "base_features": canonical_payload(),
            "vary_feature": "ph_level",
            "steps": 1
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("at least 2"));
}

#[tokio::test]
async fn test_simulate_defaults_steps_and_range() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = post_json(
        app,
        "/api/simulate",
        &json!({
            "base_features": canonical_payload(),
            "vary_feature": "oxygen_level"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trajectory"].as_array().unwrap().len(), 10);
    assert_eq!(body["variation_range"], json!(0.3));
}

#[tokio::test]
async fn test_sample_data_returns_canonical_record() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get_json(app, "/api/sample-data").await;
    assert_eq!(status, StatusCode::OK);

    let data = body["data"].as_object().unwrap();
    assert_eq!(data.len(), 11);
    assert_eq!(data["gene_BRCA1"], json!(0.5));
    assert_eq!(data["cell_count"], json!(5000.0));
    assert!(body["note"].as_str().unwrap().contains("demo data"));
}

#[tokio::test]
async fn test_upload_previews_csv() {
    let (app, _state) = setup_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header("content-type", "text/csv")
                .body(Body::from(DATASET_CSV))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let preview: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(preview["has_required_features"], json!(true));
    assert_eq!(preview["preview_data"].as_array().unwrap().len(), 5);
    assert!(preview["rows"].as_u64().unwrap() > 5);
    assert!(preview["columns"]
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c == "gene_BRCA1"));
}

#[tokio::test]
async fn test_upload_rejects_malformed_csv() {
    let (app, _state) = setup_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header("content-type", "text/csv")
                .body(Body::from("a,b\n1,2,3,4\n"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_explain_reports_model_diagnostics() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = post_json(app, "/api/explain", &json!({ "target": "mutation_risk" })).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["target"], "mutation_risk");
    assert!(body["performance"]["r2_score"].is_number());
    assert!(body["performance"]["mse"].as_f64().unwrap() >= 0.0);
    assert_eq!(body["feature_importances"].as_array().unwrap().len(), 5);
    assert!(body["interpretation"].as_str().unwrap().contains("Mutation Risk"));
}

#[tokio::test]
async fn test_explain_rejects_unknown_target() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = post_json(app, "/api/explain", &json!({ "target": "lifespan" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid target"));
}

#[tokio::test]
async fn test_healthz_returns_ok() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get_json(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["components"]["model_store"].is_object());
}

#[tokio::test]
async fn test_readyz_depends_on_model_store() {
    let (app, state) = setup_test_app().await;

    let (status, body) = get_json(app.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], json!(true));

    state
        .health_registry
        .set_unhealthy(components::MODEL_STORE, "Artifacts unloaded")
        .await;
    let (status, body) = get_json(app, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], json!(false));
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_service_metrics() {
    let (app, state) = setup_test_app().await;

    state.metrics.inc_analyses();
    state.metrics.observe_analysis_latency(0.001);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    assert!(text.contains("biosentience_analyses_total"));
    assert!(text.contains("biosentience_analysis_latency_seconds"));
}
