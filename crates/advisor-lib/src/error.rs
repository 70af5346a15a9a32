//! Error types for the right-sizing engine.

use thiserror::Error;

/// Errors raised by the statistics engine, trend estimator and input plumbing.
///
/// None of these are fatal: callers skip the workload or fall back to a
/// `NO_ACTION` recommendation carrying the error text as its reason.
#[derive(Error, Debug)]
pub enum AdvisorError {
    /// No samples to summarize
    #[error("no samples to summarize")]
    EmptyInput,

    /// Too few samples for trend estimation
    #[error("insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Zero, negative or non-finite resource values
    #[error("invalid resource request: {0}")]
    InvalidRequest(String),

    /// Pricing collaborator could not answer for a region
    #[error("pricing unavailable for region '{region}'")]
    PricingUnavailable { region: String },

    /// Snapshot input is structurally valid JSON but semantically wrong
    #[error("malformed snapshot: {0}")]
    Snapshot(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AdvisorError>;
