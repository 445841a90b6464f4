//! Typed error hierarchy for depflow.
//!
//! Three top-level enums cover the three subsystems:
//! - `BackendError`: transport and decoding failures talking to the source control backend
//! - `StoreError`: persistence failures for the local state store
//! - `OrchestratorError`: pipeline lifecycle, mode lock and execute-all failures

use thiserror::Error;

/// Errors from the backend collaborator.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned status {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Not authenticated: log in first")]
    Unauthenticated,
}

/// Errors from the persistent store's storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access stored entry '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize entry '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from pipeline orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Pipeline {id} not found")]
    PipelineNotFound { id: String },

    #[error("Pipeline {id} is locked to individual mode; refresh it to change modes")]
    ModeLocked { id: String },

    #[error("Pipeline {id} is not in execute-all mode")]
    ExecuteAllDisabled { id: String },

    #[error("Pipeline {id} is in execute-all mode; individual phases are unavailable")]
    IndividualModeDisabled { id: String },
}
