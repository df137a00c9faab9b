//! Error types for the synchronizer

use thiserror::Error;

/// Synchronizer error
#[derive(Debug, Error)]
pub enum SyncError {
    /// Credential rejected, expired, or could not be acquired (401/403)
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Network/connection failure or a non-2xx response not otherwise classified
    #[error("transport error: {0}")]
    Transport(String),

    /// Unknown resource id (404)
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Remote rejected the action given its current run state (409)
    #[error("action rejected by remote: {0}")]
    Conflict(String),

    /// Watched attribute absent from the returned state.
    /// Indicates a misconfigured watch spec rather than a remote fault.
    #[error("attribute '{attribute}' missing from state of resource {resource}")]
    AttributeMissing { resource: String, attribute: String },

    /// Operation cancelled by the host
    #[error("operation cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        SyncError::Transport(e.to_string())
    }
}

/// Result type for synchronizer operations
pub type Result<T> = std::result::Result<T, SyncError>;
