//! Domain error types
//!
//! This module defines the error hierarchy for a conversion job. Every stage of
//! the pipeline reports through [`GeoShpError`]; third-party error types never
//! leak past the adapter that produced them.

use thiserror::Error;

/// Main error type
///
/// Variants map one-to-one onto the failure points of a job. Only
/// [`GeoShpError::Cleanup`] is non-fatal: it is logged and never changes the
/// outcome of the job that produced it.
#[derive(Debug, Error)]
pub enum GeoShpError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Paginated source retrieval errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Scratch workspace could not be created (collision or permission)
    #[error("Workspace creation error: {0}")]
    WorkspaceCreation(String),

    /// External conversion program failed to launch or exited non-zero
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Archive append or finalize failure
    #[error("Archive error: {0}")]
    Archive(String),

    /// Object store upload failure
    #[error("Upload error: {0}")]
    Upload(String),

    /// Best-effort cleanup failure
    #[error("Cleanup error: {0}")]
    Cleanup(String),

    /// Invalid caller input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Job exceeded its deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl GeoShpError {
    /// Whether this error terminates the owning job
    pub fn is_fatal(&self) -> bool {
        !matches!(self, GeoShpError::Cleanup(_))
    }
}

/// Errors raised while pulling pages from a feature source
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level failure
    #[error("Failed to connect to feature source: {0}")]
    ConnectionFailed(String),

    /// Source answered with a non-success status
    #[error("Feature source returned {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// Page body could not be parsed as a feature collection
    #[error("Invalid page body: {0}")]
    InvalidResponse(String),

    /// Transformed features could not be written to the sink
    #[error("Failed to write to sink: {0}")]
    Write(String),
}

impl FetchError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::ConnectionFailed(_) => true,
            FetchError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            FetchError::InvalidResponse(_) | FetchError::Write(_) => false,
        }
    }
}

impl From<std::io::Error> for GeoShpError {
    fn from(err: std::io::Error) -> Self {
        GeoShpError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for GeoShpError {
    fn from(err: serde_json::Error) -> Self {
        GeoShpError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for GeoShpError {
    fn from(err: toml::de::Error) -> Self {
        GeoShpError::Configuration(format!("TOML parse error: {err}"))
    }
}
