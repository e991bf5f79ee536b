mod rate_limiter;
mod replay;
mod retry;

pub use rate_limiter::RateLimiter;
pub use replay::{RecordedRequest, ReplayTransport};
pub use retry::RetryPolicy;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use crate::error::{FetchFailure, ScrapeError};
use crate::models::Document;
use crate::traits::{HttpResponse, PageStore, Transport};

/// Transport backed by a shared `reqwest::Client`
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns [`FetchFailure::Network`] if the client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, FetchFailure> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchFailure::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, FetchFailure> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchFailure::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchFailure::Network(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

/// Fetches pages through the shared rate limiter and keeps a raw copy of each one.
///
/// Cloning is cheap; every clone paces against the same limiter.
pub struct PageFetcher {
    transport: Arc<dyn Transport>,
    store: Arc<dyn PageStore>,
    limiter: Arc<RateLimiter>,
    user_agent: String,
}

impl PageFetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn PageStore>,
        limiter: Arc<RateLimiter>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            store,
            limiter,
            user_agent: user_agent.into(),
        }
    }

    /// Fetch one page and save it as `page_name`. Never retries.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::Transport`] on network failure, a non-2xx status or a blank body
    /// - [`ScrapeError::Storage`] if the raw page cannot be saved
    pub async fn fetch(&self, url: &str, page_name: &str) -> Result<Document, ScrapeError> {
        self.limiter.wait().await;

        info!("Fetching {} as {}", url, page_name);

        let transport_error = |cause| ScrapeError::Transport {
            url: url.to_string(),
            cause,
        };

        let response = self
            .transport
            .get(url, &[("User-Agent", self.user_agent.as_str())])
            .await
            .map_err(transport_error)?;

        if !(200..300).contains(&response.status) {
            return Err(transport_error(FetchFailure::Status(response.status)));
        }

        if response.body.trim().is_empty() {
            return Err(transport_error(FetchFailure::EmptyBody));
        }

        self.store.save(page_name, response.body.as_bytes()).await?;

        Ok(Document {
            url: url.to_string(),
            body: response.body,
        })
    }
}

impl Clone for PageFetcher {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            store: Arc::clone(&self.store),
            limiter: Arc::clone(&self.limiter),
            user_agent: self.user_agent.clone(),
        }
    }
}
