//! Error types for Vitalscan
//!
//! Data-quality problems are not errors: the validator reports them as a
//! [`ValidationResult`](crate::types::ValidationResult). Everything here is
//! fatal to the current scan attempt.

use thiserror::Error;

/// Errors that can occur while producing or evaluating a scan
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid capture descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Unsupported scan mode: {0}")]
    UnsupportedMode(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Analysis rejected: {0}")]
    AnalysisRejected(String),

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl From<reqwest::Error> for ScanError {
    fn from(e: reqwest::Error) -> Self {
        ScanError::Transport(e.to_string())
    }
}

impl From<toml::de::Error> for ScanError {
    fn from(e: toml::de::Error) -> Self {
        ScanError::Config(e.to_string())
    }
}
