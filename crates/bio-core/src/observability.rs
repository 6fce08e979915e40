//! Observability infrastructure for the analysis service
//!
//! Provides:
//! - Prometheus metrics (inference/simulation latency, request counts,
//!   model metadata)
//! - Structured JSON event logging with tracing

use prometheus::{register_gauge_vec, register_histogram, register_int_gauge, GaugeVec, Histogram, IntGauge};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    analysis_latency_seconds: Histogram,
    simulation_latency_seconds: Histogram,
    analyses_total: IntGauge,
    simulations_total: IntGauge,
    uploads_total: IntGauge,
    validation_errors_total: IntGauge,
    model_info: GaugeVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            analysis_latency_seconds: register_histogram!(
                "biosentience_analysis_latency_seconds",
                "Time spent running one full three-model analysis",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register analysis_latency_seconds"),

            simulation_latency_seconds: register_histogram!(
                "biosentience_simulation_latency_seconds",
                "Time spent running one parameter sweep",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register simulation_latency_seconds"),

            analyses_total: register_int_gauge!(
                "biosentience_analyses_total",
                "Total number of analyze requests served"
            )
            .expect("Failed to register analyses_total"),

            simulations_total: register_int_gauge!(
                "biosentience_simulations_total",
                "Total number of simulate requests served"
            )
            .expect("Failed to register simulations_total"),

            uploads_total: register_int_gauge!(
                "biosentience_uploads_total",
                "Total number of CSV uploads previewed"
            )
            .expect("Failed to register uploads_total"),

            validation_errors_total: register_int_gauge!(
                "biosentience_validation_errors_total",
                "Total number of requests rejected by input validation"
            )
            .expect("Failed to register validation_errors_total"),

            model_info: register_gauge_vec!(
                "biosentience_model_info",
                "Information about the loaded models",
                &["target", "trained_at"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_analysis_latency(&self, duration_secs: f64) {
        self.inner().analysis_latency_seconds.observe(duration_secs);
    }

    pub fn observe_simulation_latency(&self, duration_secs: f64) {
        self.inner().simulation_latency_seconds.observe(duration_secs);
    }

    pub fn inc_analyses(&self) {
        self.inner().analyses_total.inc();
    }

    pub fn inc_simulations(&self) {
        self.inner().simulations_total.inc();
    }

    pub fn inc_uploads(&self) {
        self.inner().uploads_total.inc();
    }

    pub fn inc_validation_errors(&self) {
        self.inner().validation_errors_total.inc();
    }

    /// Record one loaded model's identity labels
    pub fn set_model_info(&self, target: &str, trained_at: &str) {
        self.inner()
            .model_info
            .with_label_values(&[target, trained_at])
            .set(1.0);
    }
}

/// Structured logger for service events
#[derive(Clone)]
pub struct StructuredLogger {
    service: &'static str,
}

impl Default for StructuredLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuredLogger {
    pub fn new() -> Self {
        Self {
            service: "biosentience",
        }
    }

    pub fn log_startup(&self, version: &str, trained_at: &str, dataset_rows: usize) {
        info!(
            event = "server_started",
            service = self.service,
            version = %version,
            models_trained_at = %trained_at,
            dataset_rows = dataset_rows,
            "Analysis server started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            service = self.service,
            reason = %reason,
            "Analysis server shutting down"
        );
    }

    pub fn log_validation_rejected(&self, endpoint: &str, reason: &str) {
        warn!(
            event = "validation_rejected",
            service = self.service,
            endpoint = %endpoint,
            reason = %reason,
            "Request rejected by validation"
        );
    }
}
