//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.mediforge.toml` files.

use crate::cli::OutputFormat;
use crate::inference::summary::DEFAULT_SUMMARY_ENDPOINT;
use crate::registry::loader::DEFAULT_FALLBACK_SIZE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".mediforge.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Agent registry settings.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Per-agent inference settings.
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Text-generation summary settings.
    #[serde(default)]
    pub summary: SummaryConfig,

    /// Retrieval settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "mediforge_report.md".to_string()
}

/// Where the agent roster comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// `bundled`, a file path, or an http(s) URL.
    #[serde(default = "default_bundled")]
    pub source: String,

    /// Number of generic agents used when the registry cannot be read.
    #[serde(default = "default_fallback_size")]
    pub fallback_size: usize,

    /// Timeout for fetching the registry and retrieval documents.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_seconds: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            source: default_bundled(),
            fallback_size: default_fallback_size(),
            timeout_seconds: default_fetch_timeout(),
        }
    }
}

fn default_bundled() -> String {
    "bundled".to_string()
}

fn default_fallback_size() -> usize {
    DEFAULT_FALLBACK_SIZE
}

fn default_fetch_timeout() -> u64 {
    10
}

/// Per-agent inference endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Base URL of the inference service. Unset means every agent uses a placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Per-agent request timeout in seconds.
    #[serde(default = "default_inference_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of agent calls in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_seconds: default_inference_timeout(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_inference_timeout() -> u64 {
    10
}

fn default_concurrency() -> usize {
    4
}

/// Text-generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Text-generation endpoint URL.
    #[serde(default = "default_summary_endpoint")]
    pub endpoint: String,

    /// API token. Never written back out.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_summary_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            endpoint: default_summary_endpoint(),
            token: None,
            timeout_seconds: default_summary_timeout(),
        }
    }
}

fn default_summary_endpoint() -> String {
    DEFAULT_SUMMARY_ENDPOINT.to_string()
}

fn default_summary_timeout() -> u64 {
    30
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Load a retrieval index at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// `bundled`, a file path, or an http(s) URL.
    #[serde(default = "default_bundled")]
    pub source: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            source: default_bundled(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Report generation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output document format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if let Some(ref registry) = args.registry {
            self.registry.source = registry.clone();
        }

        if let Some(ref endpoint) = args.inference_url {
            self.inference.endpoint = Some(endpoint.clone());
        }
        if let Some(concurrency) = args.concurrency {
            self.inference.concurrency = concurrency;
        }

        // One timeout flag governs every external call.
        if let Some(timeout) = args.timeout {
            self.registry.timeout_seconds = timeout;
            self.inference.timeout_seconds = timeout;
            self.summary.timeout_seconds = timeout;
        }

        if let Some(ref endpoint) = args.summary_url {
            self.summary.endpoint = endpoint.clone();
        }
        if let Some(ref token) = args.hf_token {
            self.summary.token = Some(token.clone());
        }

        if let Some(ref retrieval) = args.retrieval {
            self.retrieval.source = retrieval.clone();
        }
        if args.no_retrieval {
            self.retrieval.enabled = false;
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
