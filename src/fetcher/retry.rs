//! Caller-side retry for transport failures.
//!
//! The fetcher itself never retries. The paginator and the detail resolver
//! wrap their fetches in a [`RetryPolicy`]; only [`ScrapeError::Transport`]
//! is retried, everything else is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::ScrapeError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure; 0 disables retries
    pub max_retries: u32,
    /// Sleep before retry n is `backoff * 2^(n-1)`
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, ScrapeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ScrapeError>>,
    {
        let mut attempt = 0u32;

        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retriable() || attempt >= self.max_retries {
                return Err(err);
            }

            let delay = self.backoff.saturating_mul(1u32 << attempt.min(31));
            tracing::warn!(
                attempt,
                max_retries = self.max_retries,
                delay_ms = delay.as_millis(),
                error = %err,
                "Transport error, retrying after backoff"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}
