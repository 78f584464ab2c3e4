//! Output document generation.
//!
//! This module turns a rendered report into Markdown, JSON or an HTML
//! fragment.

use crate::models::{AgentEntry, RenderedReport, ReportMetadata, ResultSource};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &RenderedReport) -> String {
    let mut output = String::new();

    output.push_str("# MediForge Diagnosis Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_agents_section(&report.agents));
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_evidence_section(&report.retrieval));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Symptoms:** {}\n", metadata.input));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if metadata.used_fallback_registry {
        section.push_str("- **Registry:** fallback roster (agent registry unavailable)\n");
    }
    if metadata.placeholder_results > 0 {
        section.push_str(&format!(
            "- **Placeholder Results:** {}\n",
            metadata.placeholder_results
        ));
    }
    section.push('\n');

    section
}

/// Generate the agent results table.
fn generate_agents_section(agents: &[AgentEntry]) -> String {
    let mut section = String::new();

    section.push_str("## Agents\n\n");

    if agents.is_empty() {
        section.push_str("No agent results.\n\n");
        return section;
    }

    section.push_str("| Agent | Name | Prediction | Confidence |\n");
    section.push_str("|:---:|:---|:---|:---:|\n");

    for agent in agents {
        let marker = match agent.source {
            ResultSource::Endpoint => "",
            ResultSource::Placeholder => " *",
        };
        section.push_str(&format!(
            "| {} | {} | {}{} | {} |\n",
            agent.id, agent.name, agent.label, marker, agent.confidence
        ));
    }

    if agents.iter().any(|a| a.source == ResultSource::Placeholder) {
        section.push_str("\n\\* placeholder result, agent endpoint unavailable\n");
    }
    section.push('\n');

    section
}

/// Generate the summary section.
fn generate_summary_section(summary: &str) -> String {
    format!("## Summary\n\n{}\n\n", summary)
}

/// Generate the retrieved evidence section.
fn generate_evidence_section(retrieval: &[String]) -> String {
    let mut section = String::new();

    section.push_str("## Evidence\n\n");
    for item in retrieval {
        section.push_str(&format!("- {}\n", item));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Mock cascade output. Not medical advice.*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &RenderedReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Generate an HTML fragment for embedding in a page.
pub fn generate_html_report(report: &RenderedReport) -> String {
    let mut html = String::new();

    html.push_str("<h2>Report</h2>\n<ul>\n");
    for agent in &report.agents {
        html.push_str(&format!(
            "<li>Agent{} ({}): {} ({})</li>\n",
            agent.id,
            escape_html(&agent.name),
            escape_html(&agent.label),
            agent.confidence
        ));
    }
    html.push_str("</ul>\n");

    html.push_str(&format!(
        "<p>Summary: {}</p>\n",
        escape_html(&report.summary)
    ));

    let context = if report.retrieval.is_empty() {
        "None".to_string()
    } else {
        report
            .retrieval
            .iter()
            .map(|s| escape_html(s))
            .collect::<Vec<_>>()
            .join(", ")
    };
    html.push_str(&format!("<p>RAG Context: {}</p>\n", context));

    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
