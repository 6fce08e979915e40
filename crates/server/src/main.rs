//! BioSentience analysis server
//!
//! Loads the trained model artifacts and the bundled dataset at startup
//! and serves the analysis API. Missing or corrupt artifacts abort the
//! process; there is no partial-service mode.

use anyhow::{Context, Result};
use bio_core::dataset::Dataset;
use bio_core::health::components;
use bio_core::{
    AnalysisEngine, HealthRegistry, ModelStore, ServiceMetrics, StructuredLogger, Target,
};
use bio_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting bio-server");

    // Load configuration
    let config = ServerConfig::load()?;
    info!(
        api_port = config.api_port,
        model_dir = %config.model_dir.display(),
        "Server configured"
    );

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL_STORE).await;
    health_registry.register(components::DATASET).await;

    // Load the dataset backing the sample-data endpoint
    let dataset = Dataset::from_csv_path(&config.dataset_path)
        .with_context(|| format!("failed to load dataset {}", config.dataset_path.display()))?;

    // Load the model store; any missing or corrupt artifact is fatal
    let store = ModelStore::load(&config.model_dir)
        .context("model artifacts missing or corrupt; refusing to serve")?;

    // Initialize metrics
    let metrics = ServiceMetrics::new();
    let trained_at = store.metadata().trained_at.clone();
    for target in Target::ALL {
        metrics.set_model_info(target.wire_name(), &trained_at);
    }

    let logger = StructuredLogger::new();
    logger.log_startup(SERVER_VERSION, &trained_at, dataset.len());

    // Create shared application state
    let app_state = Arc::new(api::AppState {
        engine: AnalysisEngine::new(Arc::new(store)),
        dataset: Arc::new(dataset),
        health_registry: health_registry.clone(),
        metrics,
        logger: logger.clone(),
        max_upload_bytes: config.max_upload_bytes,
        max_simulation_steps: config.max_simulation_steps,
    });

    // Mark the server as ready once models and dataset are in memory
    health_registry.set_ready(true).await;

    // Start the API server
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");
    api_handle.abort();

    Ok(())
}
