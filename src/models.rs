//! Data models for the agent cascade.
//!
//! This module contains the core data structures shared by the registry
//! loader, the aggregator and the report renderer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Numeric identifier of an agent slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub u32);

impl AgentId {
    /// The agent every cascade depends on.
    pub const PRIMARY: AgentId = AgentId(1);
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for AgentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(AgentId)
    }
}

/// A registered agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Unique id within the registry.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Whether the agent may take part in a cascade.
    pub ready: bool,
    /// Optional human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional status string carried by the registry document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Any other metadata fields present in the registry document.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AgentDescriptor {
    /// Creates a ready descriptor with no extra metadata.
    pub fn ready(id: AgentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ready: true,
            description: None,
            status: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// The agent roster for one session, ordered by ascending id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    agents: BTreeMap<AgentId, AgentDescriptor>,
}

impl Registry {
    /// Builds a registry from descriptors. Later duplicates replace earlier ones.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = AgentDescriptor>) -> Self {
        let agents = descriptors.into_iter().map(|d| (d.id, d)).collect();
        Self { agents }
    }

    pub fn get(&self, id: AgentId) -> Option<&AgentDescriptor> {
        self.agents.get(&id)
    }

    /// Iterates agents in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentDescriptor> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Returns true when the primary agent is present and ready.
    pub fn primary_ready(&self) -> bool {
        self.get(AgentId::PRIMARY).map(|a| a.ready).unwrap_or(false)
    }

    /// Display name for an id, falling back to `Agent{id}`.
    pub fn name_of(&self, id: AgentId) -> String {
        self.get(id)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| format!("Agent{}", id))
    }
}

/// Where an agent's result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    /// Returned by the agent's inference endpoint.
    Endpoint,
    /// Randomized stand-in used when the endpoint failed.
    Placeholder,
}

/// One agent's prediction for a cascade run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub agent_id: AgentId,
    pub label: String,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    pub source: ResultSource,
}

/// Everything one cascade run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Agent results in ascending id order.
    pub agent_results: Vec<ResultRecord>,
    /// Free-text summary from the text-generation endpoint, or the offline sentence.
    pub summary: String,
    /// Retrieved evidence snippets.
    pub retrieval: Vec<String>,
}

impl ResultSet {
    #[allow(dead_code)] // Lookup helper for callers holding a full set
    pub fn result_for(&self, id: AgentId) -> Option<&ResultRecord> {
        self.agent_results.iter().find(|r| r.agent_id == id)
    }
}

/// A retrievable evidence snippet keyed by a query fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalRecord {
    pub query: String,
    pub text: String,
}

/// One agent line in a rendered report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEntry {
    pub id: AgentId,
    pub name: String,
    pub label: String,
    /// Confidence as a percentage with one decimal, e.g. `"85.5%"`.
    pub confidence: String,
    pub source: ResultSource,
}

/// Metadata about a rendered report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Symptom text the cascade ran on.
    pub input: String,
    /// When the cascade completed.
    pub generated_at: DateTime<Utc>,
    /// Whether the registry came from the built-in fallback roster.
    pub used_fallback_registry: bool,
    /// Number of agents that fell back to placeholder results.
    pub placeholder_results: usize,
}

/// Display structure produced by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedReport {
    pub metadata: ReportMetadata,
    pub agents: Vec<AgentEntry>,
    pub summary: String,
    pub retrieval: Vec<String>,
}

/// Formats a `[0, 1]` confidence as a one-decimal percentage.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}
