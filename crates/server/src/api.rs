//! HTTP/JSON API for analysis, simulation, uploads, and health/metrics

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bio_core::dataset::{preview_csv, Dataset};
use bio_core::explainer;
use bio_core::health::ComponentStatus;
use bio_core::simulator;
use bio_core::{
    AnalysisEngine, CoreError, Explanation, Feature, FeatureVector, HealthRegistry,
    ServiceMetrics, StructuredLogger, Target,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Research-use disclaimer attached to every analysis response
const DISCLAIMER: &str = "These are model predictions for research purposes only. Not medical advice.";

/// Default sweep settings when the caller omits them
const DEFAULT_STEPS: usize = 10;
const DEFAULT_VARIATION_RANGE: f64 = 0.3;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: AnalysisEngine,
    pub dataset: Arc<Dataset>,
    pub health_registry: HealthRegistry,
    pub metrics: ServiceMetrics,
    pub logger: StructuredLogger,
    pub max_upload_bytes: usize,
    pub max_simulation_steps: usize,
}

impl AppState {
    /// Convert a core error into an API error, counting and logging
    /// validation rejections along the way.
    fn reject(&self, endpoint: &'static str, error: CoreError) -> ApiError {
        if error.is_validation() {
            self.metrics.inc_validation_errors();
            self.logger.log_validation_rejected(endpoint, &error.to_string());
        }
        ApiError(error)
    }
}

/// Wrapper mapping core errors onto HTTP responses: validation errors
/// become 400 with their message, everything else a generic 500.
pub struct ApiError(CoreError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            error => {
                tracing::error!(error = %error, "Internal error while handling request");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    data: Value,
}

#[derive(Debug, Deserialize)]
struct SimulateRequest {
    base_features: Value,
    vary_feature: String,
    steps: Option<usize>,
    variation_range: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ExplainRequest {
    target: Option<String>,
}

/// Run predictions plus explanation for one sample
async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<Value>, ApiError> {
    let start = Instant::now();
    let features = FeatureVector::from_json_map(&request.data)
        .map_err(|e| state.reject("analyze", e))?;

    let result = state
        .engine
        .analyze(&features)
        .map_err(|e| state.reject("analyze", e))?;
    let explanation: Explanation =
        explainer::explain(state.engine.store(), &features, &result.predictions);

    state.metrics.inc_analyses();
    state.metrics.observe_analysis_latency(start.elapsed().as_secs_f64());

    Ok(Json(json!({
        "predictions": result.predictions,
        "confidence": result.confidence,
        "explanation": explanation,
        "input_features": result.input_features,
        "disclaimer": DISCLAIMER,
    })))
}

/// Sweep one feature and predict along the trajectory
async fn simulate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SimulateRequest>,
) -> Result<Json<Value>, ApiError> {
    let start = Instant::now();

    let feature = Feature::from_wire(&request.vary_feature).ok_or_else(|| {
        state.reject(
            "simulate",
            CoreError::Validation(format!("Unknown feature: {}", request.vary_feature)),
        )
    })?;
    let steps = request.steps.unwrap_or(DEFAULT_STEPS);
    if steps > state.max_simulation_steps {
        return Err(state.reject(
            "simulate",
            CoreError::Validation(format!(
                "steps must not exceed {}, got {}",
                state.max_simulation_steps, steps
            )),
        ));
    }
    let variation_range = request.variation_range.unwrap_or(DEFAULT_VARIATION_RANGE);
    let base = FeatureVector::from_json_map(&request.base_features)
        .map_err(|e| state.reject("simulate", e))?;

    let trajectory = simulator::simulate(&state.engine, &base, feature, steps, variation_range)
        .map_err(|e| state.reject("simulate", e))?;

    state.metrics.inc_simulations();
    state.metrics.observe_simulation_latency(start.elapsed().as_secs_f64());

    // Wire format keys each point's swept value by the feature name
    let points: Vec<Value> = trajectory
        .points
        .iter()
        .map(|point| {
            let mut entry = json!({
                "step": point.step,
                "health_index": point.predictions.health_index,
                "mutation_risk": point.predictions.mutation_risk,
                "adaptation_score": point.predictions.adaptation_score,
            });
            entry[trajectory.varied_feature.as_str()] = json!(point.swept_value);
            entry
        })
        .collect();

    Ok(Json(json!({
        "varied_feature": trajectory.varied_feature,
        "base_value": trajectory.base_value,
        "variation_range": trajectory.variation_range,
        "steps": trajectory.steps,
        "trajectory": points,
    })))
}

/// Preview an uploaded CSV payload
async fn upload(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<Value>, ApiError> {
    if body.len() > state.max_upload_bytes {
        return Err(state.reject(
            "upload",
            CoreError::Validation(format!(
                "upload of {} bytes exceeds the {} byte limit",
                body.len(),
                state.max_upload_bytes
            )),
        ));
    }

    let preview = preview_csv(&body).map_err(|e| state.reject("upload", e))?;
    state.metrics.inc_uploads();
    info!(rows = preview.rows, columns = preview.columns.len(), "Upload previewed");

    Ok(Json(serde_json::to_value(preview).map_err(|e| ApiError(e.into()))?))
}

/// Return the canonical demo record
async fn sample_data(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "data": state.dataset.sample().features,
        "note": "This is demo data from the training dataset",
    }))
}

/// Per-model training diagnostics
async fn explain_model(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExplainRequest>,
) -> Result<Json<Value>, ApiError> {
    let name = request.target.unwrap_or_else(|| Target::HealthIndex.wire_name().to_string());
    let target = Target::from_wire(&name).ok_or_else(|| {
        state.reject(
            "explain",
            CoreError::Validation(format!("Invalid target: {}", name)),
        )
    })?;

    let metadata = state.engine.store().metadata();
    let report = &metadata.models[target.wire_name()];

    Ok(Json(json!({
        "target": target.wire_name(),
        "description": report.description,
        "performance": {
            "r2_score": report.r2_score,
            "mse": report.mse,
        },
        "feature_importances": report.top_features,
        "interpretation": format!(
            "This model predicts {} with {:.1}% accuracy.",
            report.description,
            report.r2_score * 100.0
        ),
    })))
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/api/analyze", post(analyze))
        .route("/api/simulate", post(simulate))
        .route("/api/upload", post(upload))
        .route("/api/sample-data", get(sample_data))
        .route("/api/explain", post(explain_model))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
