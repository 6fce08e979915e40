//! Server configuration

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory holding the trained model artifacts
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Path to the bundled training dataset (sample-data source)
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Maximum accepted CSV upload size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Upper bound on simulation step counts
    #[serde(default = "default_max_simulation_steps")]
    pub max_simulation_steps: usize,
}

fn default_api_port() -> u16 {
    8000
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/biological_samples.csv")
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_max_simulation_steps() -> usize {
    200
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            model_dir: default_model_dir(),
            dataset_path: default_dataset_path(),
            max_upload_bytes: default_max_upload_bytes(),
            max_simulation_steps: default_max_simulation_steps(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from BIO_-prefixed environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("BIO"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }
}
