//! services/learner/src/error.rs
//!
//! Defines the primary error type for the learner client.

use crate::config::ConfigError;
use learning_core::ports::PortError;

/// The primary error type for the `learner` client.
#[derive(Debug, thiserror::Error)]
pub enum LearnerError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// No bearer token is stored, or the server rejected it. Fatal for the page.
    #[error("Not logged in")]
    Unauthenticated,

    /// An operation was invoked in a workspace state that does not allow it.
    #[error("Invalid operation: {0}")]
    InvalidState(String),

    /// Input that was rejected before any request was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Represents an error from building the HTTP client.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a standard Input/Output error (e.g., reading the local store).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Represents a failure to encode or decode persisted JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LearnerError {
    /// Maps port failures to the workspace taxonomy: a rejected or missing token
    /// is an authentication failure, everything else stays a port error.
    pub fn from_port(err: PortError) -> Self {
        match err {
            PortError::Unauthorized => LearnerError::Unauthenticated,
            other => LearnerError::Port(other),
        }
    }
}

/// Convenience alias used across the workspace layer.
pub type LearnerResult<T> = Result<T, LearnerError>;
