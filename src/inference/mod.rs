//! External inference backends.
//!
//! Each backend is an opaque capability that either returns a prediction
//! or fails. The cascade decides what to substitute on failure.

pub mod http;
pub mod placeholder;
pub mod summary;

pub use http::HttpInference;
pub use placeholder::placeholder_result;
pub use summary::{build_prompt, HuggingFaceGenerator, TextGenerator, OFFLINE_SUMMARY};

use crate::error::InferenceError;
use crate::models::AgentDescriptor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Label and confidence returned by an agent endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
}

/// Per-agent inference capability.
#[async_trait]
pub trait AgentInference: Send + Sync {
    /// Runs `agent` on the user's input text.
    async fn predict(
        &self,
        agent: &AgentDescriptor,
        input: &str,
    ) -> Result<Prediction, InferenceError>;
}

/// Backend used when no inference endpoint is configured. Every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unavailable;

#[async_trait]
impl AgentInference for Unavailable {
    async fn predict(
        &self,
        _agent: &AgentDescriptor,
        _input: &str,
    ) -> Result<Prediction, InferenceError> {
        Err(InferenceError::Unconfigured)
    }
}
