//! Custom error types and handling
//!
//! Per-pair outcomes (TLE, RTE, WA, render failures) are not errors: they are
//! verdicts recorded by the sweep. `AppError` covers everything that stops an
//! operation from producing a verdict at all.

use crate::config::ConfigError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid instance id: {0}")]
    InvalidInstanceId(String),

    #[error("Malformed instance {id}: {reason}")]
    MalformedInstance { id: String, reason: String },

    #[error("Malformed solver output: {0}")]
    MalformedOutput(String),

    #[error("Malformed geometry response: {0}")]
    MalformedGeometry(String),

    #[error("Compilation error: {0}")]
    CompilationError(String),

    #[error("Generator error: {0}")]
    Generator(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Spawn { .. } => "SPAWN_ERROR",
            Self::InvalidInstanceId(_) => "INVALID_INSTANCE_ID",
            Self::MalformedInstance { .. } => "MALFORMED_INSTANCE",
            Self::MalformedOutput(_) => "MALFORMED_OUTPUT",
            Self::MalformedGeometry(_) => "MALFORMED_GEOMETRY",
            Self::CompilationError(_) => "COMPILATION_ERROR",
            Self::Generator(_) => "GENERATOR_ERROR",
            Self::Render(_) => "RENDER_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
