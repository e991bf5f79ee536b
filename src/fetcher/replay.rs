//! In-memory transport serving captured pages, for offline replay and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::FetchFailure;
use crate::traits::{HttpResponse, Transport};

#[derive(Debug, Clone)]
enum Reply {
    Page(HttpResponse),
    Failure(String),
}

/// A request as seen by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub user_agent: Option<String>,
}

/// Serves canned responses keyed by URL. Unknown URLs fail as network errors.
#[derive(Debug, Default)]
pub struct ReplayTransport {
    replies: HashMap<String, Reply>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ReplayTransport {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.with_status(url, 200, body)
    }

    #[must_use]
    pub fn with_status(
        mut self,
        url: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        self.replies.insert(
            url.into(),
            Reply::Page(HttpResponse {
                status,
                body: body.into(),
            }),
        );
        self
    }

    #[must_use]
    pub fn with_failure(mut self, url: impl Into<String>, reason: impl Into<String>) -> Self {
        self.replies.insert(url.into(), Reply::Failure(reason.into()));
        self
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|request| request.url == url).count()
    }
}

#[async_trait]
impl Transport for ReplayTransport {
    async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, FetchFailure> {
        let user_agent = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("user-agent"))
            .map(|(_, value)| (*value).to_string());

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                url: url.to_string(),
                user_agent,
            });
        }

        match self.replies.get(url) {
            Some(Reply::Page(response)) => Ok(response.clone()),
            Some(Reply::Failure(reason)) => Err(FetchFailure::Network(reason.clone())),
            None => Err(FetchFailure::Network(format!("no captured page for {url}"))),
        }
    }
}
