//! Document download.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::ExtractionConfig;
use crate::error::{Error, Result};

/// Source of raw document bytes.
pub trait DocumentFetcher {
    /// Return the complete body behind `url`.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP fetcher.
///
/// Issues a plain GET with default headers. Requests are bounded by the
/// configured timeouts and are never retried.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Build a fetcher with explicit timeouts.
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| Error::Other(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Build a fetcher using the timeouts of a run configuration.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        Self::new(config.fetch_timeout, config.connect_timeout)
    }
}

impl DocumentFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let body = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.bytes())
            .map_err(|e| Error::fetch(url, e))?;

        log::debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}

/// Fetcher serving documents from memory, keyed by URL.
#[derive(Debug, Default, Clone)]
pub struct MemoryFetcher {
    documents: HashMap<String, Vec<u8>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the bytes returned for `url`.
    pub fn with_document(mut self, url: impl Into<String>, data: Vec<u8>) -> Self {
        self.documents.insert(url.into(), data);
        self
    }
}

impl DocumentFetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Other(format!("No document registered for {}", url)))
    }
}
