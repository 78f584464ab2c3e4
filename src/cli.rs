//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// MediForge - mock multi-agent medical AI cascade
///
/// Runs every registered agent over a symptom description, adds a
/// generated summary and a retrieved evidence snippet, and writes a
/// Markdown, JSON or HTML report. Missing backends never break the
/// report; they are replaced by placeholder values.
///
/// Examples:
///   mediforge --input "blurred vision, diabetic"
///   mediforge -i "memory loss" --format json -o report.json
///   mediforge -i "chest pain" --inference-url http://localhost:8080
///   mediforge --registry agents.json --dry-run
///   mediforge --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Symptom description to run the cascade on
    #[arg(
        short,
        long,
        value_name = "TEXT",
        required_unless_present_any = ["init_config", "dry_run"]
    )]
    pub input: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .mediforge.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json, html)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Agent registry: "bundled", a JSON file, or an http(s) URL
    #[arg(long, value_name = "SOURCE")]
    pub registry: Option<String>,

    /// Retrieval records: "bundled", a JSON file, or an http(s) URL
    #[arg(long, value_name = "SOURCE", conflicts_with = "no_retrieval")]
    pub retrieval: Option<String>,

    /// Skip loading retrieval records (always use the default snippet)
    #[arg(long)]
    pub no_retrieval: bool,

    /// Base URL of the per-agent inference service
    ///
    /// Agent N is called at POST {URL}/agents/N/predict. Without it every
    /// agent produces a placeholder result.
    #[arg(long, value_name = "URL", env = "MEDIFORGE_INFERENCE_URL")]
    pub inference_url: Option<String>,

    /// Text-generation endpoint URL for the summary
    #[arg(long, value_name = "URL")]
    pub summary_url: Option<String>,

    /// API token for the text-generation endpoint
    #[arg(long, value_name = "TOKEN", env = "HF_TOKEN", hide_env_values = true)]
    pub hf_token: Option<String>,

    /// Timeout in seconds for every external call
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Number of agent calls in flight
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Load the registry and retrieval records, print the roster and exit
    ///
    /// No inference or text-generation calls are made.
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .mediforge.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
    /// HTML fragment
    Html,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The input text, empty if not given (should be validated first).
    pub fn input_text(&self) -> &str {
        self.input.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if !self.dry_run && self.input_text().trim().is_empty() {
            return Err("Input text must not be empty".to_string());
        }

        for (flag, url) in [
            ("--inference-url", &self.inference_url),
            ("--summary-url", &self.summary_url),
        ] {
            if let Some(url) = url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(format!("{} must start with 'http://' or 'https://'", flag));
                }
            }
        }

        // Validate concurrency
        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        // Validate timeout if provided
        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
