//! Page fetching

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Trait for retrieving the HTML of a page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Plain GET over reqwest. Non-2xx pages are still returned; their body is
/// what the user would have seen.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("Fetching page {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!("Fetched {} ({}, {} bytes)", url, status, body.len());
        Ok(body)
    }
}
