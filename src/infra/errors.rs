// src/infra/errors.rs — Error types for calai

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User-visible classification of a failed request. Recorded in the
/// session log and printed by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    EmptyRequest,
    InvalidImage,
    EstimationUnavailable,
    NetworkFailure,
    RateLimited,
    ServiceError,
    StorageUnavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::EmptyRequest => "EmptyRequest",
            ErrorKind::InvalidImage => "InvalidImage",
            ErrorKind::EstimationUnavailable => "EstimationUnavailable",
            ErrorKind::NetworkFailure => "NetworkFailure",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::ServiceError => "ServiceError",
            ErrorKind::StorageUnavailable => "StorageUnavailable",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum CalaiError {
    // Request errors (terminal, no remote call)
    #[error("Nothing to do: provide a question, an image, or both")]
    EmptyRequest,

    #[error("Image '{path}' cannot be used: {reason}")]
    InvalidImage { path: String, reason: String },

    // Capability errors
    #[error("Volume estimation is unavailable ({message}). Check that the estimation service is running and retry.")]
    EstimationUnavailable { message: String },

    #[error("Could not reach '{service}': {message}")]
    NetworkFailure { service: String, message: String },

    #[error("Rate limited by '{service}', retry after {retry_after_ms}ms")]
    RateLimited {
        service: String,
        retry_after_ms: u64,
    },

    #[error("Service '{service}' error: {message}")]
    Service { service: String, message: String },

    // Infra
    #[error("Session storage unavailable at {path}: {message}")]
    StorageUnavailable { path: String, message: String },

    #[error("Invalid session id '{0}'")]
    InvalidSessionId(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CalaiError {
    /// The taxonomy kind for errors that can end up in a session turn.
    /// Startup-time errors (config, bad session id) have none.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            CalaiError::EmptyRequest => Some(ErrorKind::EmptyRequest),
            CalaiError::InvalidImage { .. } => Some(ErrorKind::InvalidImage),
            CalaiError::EstimationUnavailable { .. } => Some(ErrorKind::EstimationUnavailable),
            CalaiError::NetworkFailure { .. } => Some(ErrorKind::NetworkFailure),
            CalaiError::RateLimited { .. } => Some(ErrorKind::RateLimited),
            CalaiError::Service { .. } => Some(ErrorKind::ServiceError),
            CalaiError::StorageUnavailable { .. } => Some(ErrorKind::StorageUnavailable),
            CalaiError::InvalidSessionId(_) | CalaiError::Config(_) => None,
        }
    }

    pub fn is_retriable(&self) -> bool {
        matches!(self, CalaiError::RateLimited { .. })
    }
}
