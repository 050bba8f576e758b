//! Error types for the TCU coach engine

use thiserror::Error;

/// Errors that can occur during computation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Invalid FTP: {0} (must be a positive number of watts)")]
    InvalidFtp(f64),

    #[error("FTP override out of range: {0} (expected 50-600 W)")]
    InvalidFtpOverride(f64),

    #[error("Invalid power percentage: {0}")]
    InvalidPowerPercentage(f64),

    #[error("Unrecognized decision type: {0}")]
    UnrecognizedDecisionType(String),

    #[error("Invalid subjective data: {0}")]
    InvalidSubjectiveData(String),

    #[error("Export error: {0}")]
    ExportError(String),

    #[error("Failed to parse activity payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}
