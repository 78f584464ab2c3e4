//! Free-text summary generation.

use crate::error::InferenceError;
use crate::models::ResultRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Hosted text-generation model used by default.
pub const DEFAULT_SUMMARY_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/google/medgemma-public-27b-it";

/// Summary used whenever generation is unavailable or fails.
pub const OFFLINE_SUMMARY: &str = "Offline Mode: Ensemble avg 92% acc.";

/// Number of agent results quoted in the summary prompt.
pub const PROMPT_RESULTS: usize = 5;

/// Text-generation capability.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError>;
}

/// Builds the summary prompt from the first [`PROMPT_RESULTS`] agent results.
pub fn build_prompt(results: &[ResultRecord]) -> String {
    let quoted = &results[..results.len().min(PROMPT_RESULTS)];
    let json = serde_json::to_string(quoted).unwrap_or_else(|_| "[]".to_string());
    format!("Analyze MedAI results: {}", json)
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    #[serde(default)]
    generated_text: Option<String>,
}

/// Client for a Hugging Face style inference endpoint.
#[derive(Debug, Clone)]
pub struct HuggingFaceGenerator {
    endpoint: String,
    token: Option<String>,
    client: reqwest::Client,
    timeout_seconds: u64,
}

impl HuggingFaceGenerator {
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<String>,
        client: reqwest::Client,
        timeout_seconds: u64,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.filter(|t| !t.trim().is_empty()),
            client,
            timeout_seconds,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.token.is_some()
    }
}

#[async_trait]
impl TextGenerator for HuggingFaceGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        let token = self
            .token
            .as_deref()
            .ok_or(InferenceError::MissingCredential)?;

        debug!("Requesting summary from {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&GenerateRequest { inputs: prompt })
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

        let outputs: Vec<GeneratedText> = response
            .json()
            .await
            .map_err(|e| InferenceError::Malformed(e.to_string()))?;

        outputs
            .into_iter()
            .next()
            .and_then(|o| o.generated_text)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| InferenceError::Malformed("no generated_text".to_string()))
    }
}
