//! Locations of the static documents a session loads at startup.
//!
//! A document is either compiled into the binary, read from disk, or
//! fetched over HTTP.

use crate::error::SourceError;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Where to read a registry or retrieval document from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSource {
    /// The copy shipped inside the binary.
    Bundled,
    /// A local JSON file.
    File(PathBuf),
    /// An `http://` or `https://` URL.
    Url(String),
}

impl ResourceSource {
    /// Parses a source string: `bundled`, an http(s) URL, or a file path.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("bundled") {
            ResourceSource::Bundled
        } else if value.starts_with("http://") || value.starts_with("https://") {
            ResourceSource::Url(value.to_string())
        } else {
            ResourceSource::File(PathBuf::from(value))
        }
    }

    /// Reads the document text. `bundled` is returned for [`ResourceSource::Bundled`].
    pub async fn read(
        &self,
        bundled: &'static str,
        client: &reqwest::Client,
    ) -> Result<String, SourceError> {
        match self {
            ResourceSource::Bundled => Ok(bundled.to_string()),
            ResourceSource::File(path) => {
                debug!("Reading {}", path.display());
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| SourceError::Io {
                        path: path.display().to_string(),
                        source,
                    })
            }
            ResourceSource::Url(url) => {
                debug!("Fetching {}", url);
                let response = client.get(url).send().await.map_err(|source| {
                    SourceError::Http {
                        url: url.clone(),
                        source,
                    }
                })?;

                if !response.status().is_success() {
                    return Err(SourceError::Status {
                        url: url.clone(),
                        status: response.status().as_u16(),
                    });
                }

                response.text().await.map_err(|source| SourceError::Http {
                    url: url.clone(),
                    source,
                })
            }
        }
    }
}

impl fmt::Display for ResourceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceSource::Bundled => write!(f, "bundled"),
            ResourceSource::File(path) => write!(f, "{}", path.display()),
            ResourceSource::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Builds an HTTP client whose requests give up after `timeout_seconds`.
pub fn http_client(timeout_seconds: u64) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        assert_eq!(ResourceSource::parse("bundled"), ResourceSource::Bundled);
        assert_eq!(ResourceSource::parse("BUNDLED"), ResourceSource::Bundled);
        assert_eq!(
            ResourceSource::parse("https://example.org/agents.json"),
            ResourceSource::Url("https://example.org/agents.json".to_string())
        );
        assert_eq!(
            ResourceSource::parse("data/agents.json"),
            ResourceSource::File(PathBuf::from("data/agents.json"))
        );
    }

    #[test]
    fn test_read_bundled_and_missing_file() {
        let client = http_client(1).unwrap();

        let text = tokio_test::block_on(ResourceSource::Bundled.read("[]", &client)).unwrap();
        assert_eq!(text, "[]");

        let missing = ResourceSource::File(PathBuf::from("/nonexistent/mediforge/agents.json"));
        let err = tokio_test::block_on(missing.read("[]", &client)).unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
