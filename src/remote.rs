//! Remote image generator client
//!
//! Uses async reqwest for non-blocking HTTP requests. The fallback URL is a
//! pure function of prompt, size and seed so it is always available, even
//! when every caching tier fails.

use crate::config::CacheConfig;
use crate::error::{AssetError, Result};
use bytes::Bytes;

/// Client for the remote image generation service
#[derive(Debug, Clone)]
pub struct RemoteGenerator {
    pub base_url: String,
    user_agent: String,
    client: reqwest::Client,
}

impl RemoteGenerator {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: crate::config::DEFAULT_USER_AGENT.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Build a generator from the cache configuration
    ///
    /// Falls back to a default client if the configured one cannot be built.
    pub fn from_config(config: &CacheConfig) -> Self {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.fetch_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|e| {
            log::warn!("Failed to build HTTP client, using defaults: {}", e);
            reqwest::Client::new()
        });

        Self {
            base_url: config.remote_base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
            client,
        }
    }

    /// Direct URL for a generated square image
    pub fn url_for(&self, prompt: &str, size: u32, seed: u32) -> String {
        format!(
            "{}/prompt/{}?width={}&height={}&nologo=true&seed={}",
            self.base_url,
            urlencoding::encode(prompt),
            size,
            size,
            seed
        )
    }

    /// Fetch image bytes from a generator URL
    pub async fn fetch(&self, url: &str) -> Result<Bytes> {
        log::debug!("Fetching image from generator: {}", url);

        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.bytes().await?)
        } else {
            Err(AssetError::HttpStatus(response.status()))
        }
    }
}

impl Default for RemoteGenerator {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_REMOTE_BASE_URL)
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
