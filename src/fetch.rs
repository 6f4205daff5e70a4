//! HTML retrieval for the source diff
//!
//! Performs a single blocking GET per URL, treats non-success statuses as
//! errors, and normalizes the body by parsing it and re-serializing the
//! document before splitting it into positional lines. Normalization keeps
//! the line diff stable against cosmetic transfer differences (the browser
//! sees the same markup both fetches see).

use crate::{CaptureConfig, Error, Result};
use reqwest::blocking::Client;
use scraper::Html;
use std::time::Duration;

/// Raw HTML of one page, split into positional lines
///
/// Lines carry no identity beyond their index.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    /// URL the markup was fetched from
    pub source_url: String,
    /// Normalized markup, one entry per line
    pub lines: Vec<String>,
}

/// Blocking HTML fetcher
pub struct HtmlFetcher {
    client: Client,
}

impl HtmlFetcher {
    pub fn new(config: &CaptureConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Fetch(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Fetch a URL and split its normalized markup into lines
    pub fn fetch(&self, url: &str) -> Result<HtmlDocument> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::Fetch(format!("HTTP GET failed: {}", e)))?
            .error_for_status()
            .map_err(|e| Error::Fetch(format!("HTTP status error: {}", e)))?;

        let body = response
            .text()
            .map_err(|e| Error::Fetch(format!("Failed to read response body: {}", e)))?;

        let normalized = Html::parse_document(&body).root_element().html();
        let lines = normalized.lines().map(str::to_string).collect();

        Ok(HtmlDocument {
            source_url: url.to_string(),
            lines,
        })
    }
}
