//! Turns a cascade result set into a display structure.

use crate::models::{
    format_confidence, AgentEntry, Registry, RenderedReport, ReportMetadata, ResultSet,
    ResultSource,
};
use chrono::{DateTime, Utc};

/// Renders `results` for display.
///
/// Pure: the same inputs always produce the same report. Agent names come
/// from `registry`; `generated_at` is supplied by the caller.
pub fn render(
    results: &ResultSet,
    registry: &Registry,
    input: &str,
    used_fallback_registry: bool,
    generated_at: DateTime<Utc>,
) -> RenderedReport {
    let mut agents: Vec<AgentEntry> = results
        .agent_results
        .iter()
        .map(|r| AgentEntry {
            id: r.agent_id,
            name: registry.name_of(r.agent_id),
            label: r.label.clone(),
            confidence: format_confidence(r.confidence),
            source: r.source,
        })
        .collect();
    agents.sort_by_key(|a| a.id);

    let placeholder_results = agents
        .iter()
        .filter(|a| a.source == ResultSource::Placeholder)
        .count();

    RenderedReport {
        metadata: ReportMetadata {
            input: input.to_string(),
            generated_at,
            used_fallback_registry,
            placeholder_results,
        },
        agents,
        summary: results.summary.clone(),
        retrieval: results.retrieval.clone(),
    }
}
