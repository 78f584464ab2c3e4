//! Per-session state.
//!
//! A session owns everything loaded at startup and is borrowed by each
//! cascade run. There is no process-wide state.

use crate::cascade::Cascade;
use crate::error::CascadeError;
use crate::models::{Registry, RenderedReport};
use crate::registry::load_registry;
use crate::report::render;
use crate::retrieval::{load_index, RetrievalIndex};
use crate::source::ResourceSource;
use chrono::Utc;
use tracing::info;

/// State loaded once and shared by every run of a session.
#[derive(Debug, Clone)]
pub struct Session {
    pub registry: Registry,
    /// True when the registry is the built-in fallback roster.
    pub used_fallback: bool,
    /// Absent when retrieval is disabled or its document could not be used.
    pub retrieval: Option<RetrievalIndex>,
}

impl Session {
    /// Loads the registry and, if a source is given, the retrieval index.
    pub async fn start(
        registry_source: &ResourceSource,
        retrieval_source: Option<&ResourceSource>,
        fallback_size: usize,
        client: &reqwest::Client,
    ) -> Self {
        let loaded = load_registry(registry_source, client, fallback_size).await;

        let retrieval = match retrieval_source {
            Some(source) => load_index(source, client).await,
            None => {
                info!("Retrieval disabled");
                None
            }
        };

        Self {
            registry: loaded.registry,
            used_fallback: loaded.used_fallback,
            retrieval,
        }
    }

    /// Runs one cascade over `input` and renders the result.
    pub async fn run(&self, cascade: &Cascade, input: &str) -> Result<RenderedReport, CascadeError> {
        let results = cascade
            .aggregate(input, &self.registry, self.retrieval.as_ref())
            .await?;

        Ok(render(
            &results,
            &self.registry,
            input,
            self.used_fallback,
            Utc::now(),
        ))
    }
}
