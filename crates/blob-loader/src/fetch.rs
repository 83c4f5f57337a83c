//! Fetch capability and its HTTP implementation

use crate::error::FetchError;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Fetches the raw bytes behind a locator
pub trait Fetcher: Send + Sync {
    fn fetch(&self, locator: &Url) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// HTTP(S) fetcher backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a new fetcher with default client settings
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Create a fetcher with a request timeout and user agent
    pub fn with_timeout(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, locator: &Url) -> Result<Vec<u8>, FetchError> {
        match locator.scheme() {
            "http" | "https" => {}
            other => return Err(FetchError::UnsupportedScheme(other.to_string())),
        }

        debug!(url = %locator, "Fetching blob");

        let response = self.client.get(locator.clone()).send().await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), url = %locator, "Failed to fetch blob");
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let data = response.bytes().await?.to_vec();
        debug!(url = %locator, size = data.len(), "Fetched blob");

        Ok(data)
    }
}
