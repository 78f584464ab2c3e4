//! Error types.
//!
//! Only [`CascadeError`] ever reaches the caller of a cascade. The other
//! errors describe backend failures that the cascade replaces with
//! substitute values.

use crate::models::AgentId;
use thiserror::Error;

/// Hard failures of a cascade run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CascadeError {
    #[error("Agent {0} is not ready; models are still loading")]
    AgentNotReady(AgentId),
}

/// Failures while fetching a registry or retrieval document.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("Malformed document: {0}")]
    Malformed(String),
}

/// Failures of an external inference or text-generation call.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("No endpoint configured")]
    Unconfigured,
    #[error("No credential configured")]
    MissingCredential,
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Endpoint returned status {0}")]
    Status(u16),
    #[error("Malformed response: {0}")]
    Malformed(String),
}
