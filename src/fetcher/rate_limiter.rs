//! Global request pacing.
//!
//! Every outbound request, listing or detail, passes through one shared gate
//! that keeps a minimum interval between the start of consecutive requests.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

/// Minimum-interval gate shared by every fetch in a run
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum spacing between the start of two requests
    min_interval: Duration,
    /// Start time of the most recent request
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a request may start.
    ///
    /// The lock is held while sleeping, so concurrent callers queue up and
    /// leave the gate one interval apart.
    pub async fn wait(&self) {
        let mut last_request = self.last_request.lock().await;

        if let Some(last) = *last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!(
                    wait_ms = wait_time.as_millis(),
                    "Rate limit: waiting before next request"
                );
                sleep(wait_time).await;
            }
        }

        *last_request = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}
