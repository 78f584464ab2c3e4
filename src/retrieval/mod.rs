//! Evidence lookup for the cascade.
//!
//! A small list of `{query, text}` records is matched against the user's
//! input by case-insensitive substring. Only the list form of the document
//! is accepted; anything else leaves the index absent.

use crate::models::RetrievalRecord;
use crate::source::ResourceSource;
use tracing::{debug, info, warn};

/// Sample records shipped with the binary.
pub const BUNDLED_RETRIEVAL: &str = include_str!("../../assets/pubmed_sample.json");

/// Snippet returned when nothing matches or no index is loaded.
pub const DEFAULT_SNIPPET: &str = "PubMed: Federated learning key for privacy.";

/// Read-only list of retrieval records, searched in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalIndex {
    records: Vec<RetrievalRecord>,
}

impl RetrievalIndex {
    #[allow(dead_code)] // Programmatic construction
    pub fn new(records: Vec<RetrievalRecord>) -> Self {
        Self { records }
    }

    /// Parses a JSON array of `{query, text}` records. Elements that are not
    /// such records are skipped.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let items: Vec<serde_json::Value> = serde_json::from_str(text)?;

        let records = items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| match serde_json::from_value::<RetrievalRecord>(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping retrieval record {}: {}", i, e);
                    None
                }
            })
            .collect();

        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record whose non-empty query occurs in `input`, ignoring case.
    pub fn find(&self, input: &str) -> Option<&RetrievalRecord> {
        let haystack = input.to_lowercase();
        self.records
            .iter()
            .filter(|r| !r.query.is_empty())
            .find(|r| haystack.contains(&r.query.to_lowercase()))
    }
}

/// Loads the retrieval index. Returns `None` when the document is missing or malformed.
pub async fn load_index(
    source: &ResourceSource,
    client: &reqwest::Client,
) -> Option<RetrievalIndex> {
    info!("Loading retrieval records from {}", source);

    let text = match source.read(BUNDLED_RETRIEVAL, client).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to load retrieval data: {}", e);
            return None;
        }
    };

    match RetrievalIndex::parse(&text) {
        Ok(index) => {
            info!("Loaded {} retrieval records", index.len());
            Some(index)
        }
        Err(e) => {
            warn!("Retrieval data is not a list of records: {}", e);
            None
        }
    }
}

/// Looks up the evidence snippet for `input`. Always returns exactly one snippet.
pub fn retrieve(input: &str, index: Option<&RetrievalIndex>) -> Vec<String> {
    let found = index.and_then(|idx| idx.find(input));

    match found {
        Some(record) => {
            debug!("Retrieval matched query '{}'", record.query);
            vec![record.text.clone()]
        }
        None => {
            debug!("No retrieval match, using default snippet");
            vec![DEFAULT_SNIPPET.to_string()]
        }
    }
}
