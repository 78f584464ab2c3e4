//! Registry document parsing and the degrade-to-fallback loader.

use crate::error::SourceError;
use crate::models::{AgentDescriptor, AgentId, Registry};
use crate::source::ResourceSource;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Ten-agent roster shipped with the binary.
pub const BUNDLED_REGISTRY: &str = include_str!("../../assets/agents.json");

/// Number of generic agents used when no registry can be read.
pub const DEFAULT_FALLBACK_SIZE: usize = 3;

/// One entry of the registry document.
#[derive(Debug, Deserialize)]
struct RegistryEntry {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

/// Outcome of [`load_registry`].
#[derive(Debug, Clone)]
pub struct LoadedRegistry {
    pub registry: Registry,
    /// True when the document could not be used and the fallback roster was built.
    pub used_fallback: bool,
}

/// Parses a registry document: a JSON object mapping agent id to metadata.
///
/// Keys that are not numeric ids and entries that do not parse are skipped.
/// An empty result is an error.
pub fn parse_registry(text: &str) -> Result<Registry, SourceError> {
    let document: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(text).map_err(|e| SourceError::Malformed(e.to_string()))?;

    let mut agents: BTreeMap<AgentId, AgentDescriptor> = BTreeMap::new();
    for (key, value) in document {
        let id = match key.parse::<AgentId>() {
            Ok(id) => id,
            Err(_) => {
                warn!("Skipping registry entry with non-numeric id '{}'", key);
                continue;
            }
        };

        let entry: RegistryEntry = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping registry entry '{}': {}", key, e);
                continue;
            }
        };

        debug!("Loaded {}", entry.name);
        let descriptor = AgentDescriptor {
            id,
            name: entry.name,
            ready: true,
            description: entry.description,
            status: entry.status,
            extra: entry.extra,
        };
        if let Some(previous) = agents.insert(id, descriptor) {
            warn!(
                "Registry key '{}' repeats agent id {}; replacing '{}'",
                key, id, previous.name
            );
        }
    }

    if agents.is_empty() {
        return Err(SourceError::Malformed("registry has no agents".to_string()));
    }

    Ok(Registry::from_descriptors(agents.into_values()))
}

/// Builds `size` generic ready agents with ids `1..=size`.
pub fn fallback_registry(size: usize) -> Registry {
    let size = size.max(1) as u32;
    Registry::from_descriptors(
        (1..=size).map(|i| AgentDescriptor::ready(AgentId(i), format!("FallbackAgent{}", i))),
    )
}

/// Loads the registry, degrading to [`fallback_registry`] on any failure.
pub async fn load_registry(
    source: &ResourceSource,
    client: &reqwest::Client,
    fallback_size: usize,
) -> LoadedRegistry {
    info!("Loading agent registry from {}", source);

    let parsed = match source.read(BUNDLED_REGISTRY, client).await {
        Ok(text) => parse_registry(&text),
        Err(e) => Err(e),
    };

    match parsed {
        Ok(registry) => {
            info!("Loaded {} agents", registry.len());
            LoadedRegistry {
                registry,
                used_fallback: false,
            }
        }
        Err(e) => {
            warn!("Failed to load registry, using fallback: {}", e);
            LoadedRegistry {
                registry: fallback_registry(fallback_size),
                used_fallback: true,
            }
        }
    }
}
