//! Resolving the two feed input modes into raw bytes plus format hints.
//!
//! A partner either uploads the feed document directly or points the service
//! at a URL to fetch. Both modes end in the same place: bytes, an optional
//! extension, and an optional declared MIME type for the format detector.

use std::path::Path;

use url::Url;

use crate::config::IngestConfig;

use super::error::IngestError;

/// One of the two mutually exclusive feed inputs.
#[derive(Debug, Clone)]
pub enum FeedSource {
    /// Remote document, fetched via HTTP GET.
    Url(String),
    /// Uploaded document.
    Upload {
        /// Original filename; its extension drives format detection.
        filename: String,
        /// Raw document bytes.
        bytes: Vec<u8>,
    },
}

/// A resolved feed: raw bytes plus whatever format hints the source carried.
#[derive(Debug, Clone)]
pub struct FetchedFeed {
    /// Raw document bytes.
    pub bytes: Vec<u8>,
    /// Lowercased extension from the filename or URL path, without the dot.
    pub extension: Option<String>,
    /// Declared `Content-Type` of the HTTP response (URL mode only).
    pub content_type: Option<String>,
    /// Human-readable description of where the feed came from, for error
    /// messages.
    pub source: String,
}

/// Resolves feed sources into [`FetchedFeed`]s.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
}

impl FeedFetcher {
    /// Create a fetcher whose remote requests carry the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &IngestConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Resolve a source into bytes plus format hints.
    ///
    /// # Errors
    ///
    /// - [`IngestError::InvalidUrl`] for malformed or non-http(s) URLs.
    /// - [`IngestError::Fetch`] for network failures, timeouts, and
    ///   non-success responses.
    pub async fn resolve(&self, source: FeedSource) -> Result<FetchedFeed, IngestError> {
        match source {
            FeedSource::Upload { filename, bytes } => Ok(FetchedFeed {
                bytes,
                extension: path_extension(&filename),
                content_type: None,
                source: filename,
            }),
            FeedSource::Url(raw) => self.fetch_url(raw).await,
        }
    }

    async fn fetch_url(&self, raw: String) -> Result<FetchedFeed, IngestError> {
        let url = Url::parse(&raw).map_err(|e| IngestError::InvalidUrl(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(IngestError::InvalidUrl(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }

        let extension = path_extension(url.path());
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| IngestError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Fetch(format!("remote returned status {status}")));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| IngestError::Fetch(e.to_string()))?
            .to_vec();

        Ok(FetchedFeed {
            bytes,
            extension,
            content_type,
            source: raw,
        })
    }
}

/// Lowercased extension of a filename or URL path, without the leading dot.
fn path_extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}
