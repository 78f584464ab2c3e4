//! HTTP client for per-agent inference endpoints.
//!
//! Agent `n` is served at `POST {base_url}/agents/{n}/predict` with body
//! `{"inputs": "<text>"}` and answers `{"label": ..., "confidence": ...}`.

use super::{AgentInference, Prediction};
use crate::error::InferenceError;
use crate::models::AgentDescriptor;
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    inputs: &'a str,
}

/// Calls a remote inference service for every agent.
#[derive(Debug, Clone)]
pub struct HttpInference {
    base_url: String,
    client: reqwest::Client,
    timeout_seconds: u64,
}

impl HttpInference {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client, timeout_seconds: u64) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client,
            timeout_seconds,
        }
    }

    fn endpoint(&self, agent: &AgentDescriptor) -> String {
        format!("{}/agents/{}/predict", self.base_url, agent.id)
    }
}

#[async_trait]
impl AgentInference for HttpInference {
    async fn predict(
        &self,
        agent: &AgentDescriptor,
        input: &str,
    ) -> Result<Prediction, InferenceError> {
        let url = self.endpoint(agent);
        debug!("Calling {} for {}", url, agent.name);

        let response = self
            .client
            .post(&url)
            .json(&PredictRequest { inputs: input })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout(self.timeout_seconds)
                } else {
                    InferenceError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            return Err(InferenceError::Status(response.status().as_u16()));
        }

        let prediction: Prediction = response
            .json()
            .await
            .map_err(|e| InferenceError::Malformed(e.to_string()))?;

        if !prediction.confidence.is_finite() {
            return Err(InferenceError::Malformed(format!(
                "confidence {} is not a number",
                prediction.confidence
            )));
        }

        Ok(prediction)
    }
}
