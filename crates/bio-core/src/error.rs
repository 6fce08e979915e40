//! Error taxonomy for the analysis service
//!
//! Validation errors are caller mistakes and map to 4xx responses;
//! dataset and artifact errors are fatal at startup/training time;
//! everything else surfaces as a generic internal failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid caller input; never fatal to the process
    #[error("{0}")]
    Validation(String),

    /// Training dataset is missing, malformed, or too small
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Model artifact is absent, corrupt, or fails its checksum
    #[error("model artifact error: {0}")]
    Artifact(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Unexpected internal failure; no partial result is returned
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// True for errors the caller can fix by changing the request
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::Validation(_))
    }
}
