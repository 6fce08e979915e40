//! Core library for the BioSentience analysis service
//!
//! This crate provides the core functionality for:
//! - Random forest training and inference
//! - The immutable model store loaded at server start
//! - Prediction, explanation, and parameter-sweep simulation
//! - Dataset loading and CSV upload previews
//! - Health checks and observability

pub mod dataset;
pub mod error;
pub mod explainer;
pub mod forest;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod simulator;
pub mod store;
pub mod trainer;

pub use error::CoreError;
pub use health::{ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use predictor::AnalysisEngine;
pub use store::ModelStore;
