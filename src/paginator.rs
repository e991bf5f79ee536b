//! Walks the hotel list one page at a time.
//!
//! Two states: fetching the next page, or done. The paginator finishes when a
//! page has no next link, when the next link points back at the current page,
//! or when `max_pages` pages have been fetched, whichever comes first. A fetch
//! failure also finishes it and is returned to the caller; it is never
//! swallowed.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::ScrapeError;
use crate::extract::{Extractor, ListingPage, absolute_url};
use crate::fetcher::{PageFetcher, RetryPolicy};
use crate::models::PaginationCursor;
use crate::storage::page_file_name;

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    FetchingPage { url: String },
    Done,
}

/// One fetched listing page
#[derive(Debug)]
pub struct PageBatch {
    /// 1-based page index within the run
    pub number: usize,
    pub url: String,
    pub listing: ListingPage,
}

pub struct Paginator {
    fetcher: PageFetcher,
    extractor: Arc<Extractor>,
    base_url: String,
    city: String,
    max_pages: usize,
    retry: RetryPolicy,
    pages_fetched: usize,
    state: State,
}

impl Paginator {
    pub fn new(
        fetcher: PageFetcher,
        extractor: Arc<Extractor>,
        base_url: &str,
        city: &str,
        first_page: &str,
        max_pages: usize,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            base_url: base_url.to_string(),
            city: city.to_string(),
            max_pages,
            retry: RetryPolicy::none(),
            pages_fetched: 0,
            state: State::FetchingPage {
                url: absolute_url(base_url, first_page),
            },
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Fetch and extract the next listing page.
    ///
    /// Returns `Ok(None)` once pagination is over, and keeps returning it.
    ///
    /// # Errors
    ///
    /// Propagates the fetch error for the page; the paginator is done afterwards.
    pub async fn next_page(&mut self) -> Result<Option<PageBatch>, ScrapeError> {
        let url = match &self.state {
            State::FetchingPage { url } => url.clone(),
            State::Done => return Ok(None),
        };

        if self.pages_fetched >= self.max_pages {
            info!(
                "Reached maximum page limit ({}) for {}",
                self.max_pages, self.city
            );
            self.state = State::Done;
            return Ok(None);
        }

        let number = self.pages_fetched + 1;
        let page_name = page_file_name(&self.city, "hotelist", number);

        let fetched = self
            .retry
            .run(|| self.fetcher.fetch(&url, &page_name))
            .await;
        let document = match fetched {
            Ok(document) => document,
            Err(err) => {
                self.state = State::Done;
                return Err(err);
            }
        };
        self.pages_fetched = number;

        let listing = self.extractor.extract_listing(&document);
        info!(
            "Page {} for {}: {} listings",
            number,
            self.city,
            listing.records.len()
        );

        self.state = match &listing.cursor {
            PaginationCursor::Next(href) => {
                let next = absolute_url(&self.base_url, href);
                if next == url {
                    warn!("Next page URL is the same as current URL, stopping pagination");
                    State::Done
                } else {
                    State::FetchingPage { url: next }
                }
            }
            PaginationCursor::Terminal => State::Done,
        };

        Ok(Some(PageBatch {
            number,
            url,
            listing,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::fetcher::{RateLimiter, ReplayTransport};
    use crate::storage::MemoryPageStore;
    use crate::traits::SiteSelectors;

    const BASE: &str = "http://catalog.test";

    fn listing_page(hotel: &str, next: Option<&str>, last: bool) -> String {
        let pagination = match (next, last) {
            (_, true) => {
                r#"<div class="pagination paginationfillbtm"><span class="guiArw pageEndNext"></span></div>"#
                    .to_string()
            }
            (Some(href), false) => format!(
                r#"<div class="pagination paginationfillbtm"><a href="{href}">&raquo;</a></div>"#
            ),
            (None, false) => String::new(),
        };
        format!(
            r#"<html><body>
                 <div class="listing_info jfy"><a target="_blank" href="/{hotel}.html">{hotel}</a></div>
                 {pagination}
               </body></html>"#
        )
    }

    fn paginator(
        transport: ReplayTransport,
        max_pages: usize,
    ) -> (Paginator, Arc<ReplayTransport>, Arc<MemoryPageStore>) {
        let transport = Arc::new(transport);
        let store = Arc::new(MemoryPageStore::new());
        let fetcher = PageFetcher::new(
            transport.clone(),
            store.clone(),
            Arc::new(RateLimiter::new(Duration::ZERO)),
            "test-agent",
        );
        let extractor = Arc::new(Extractor::new(BASE, &SiteSelectors::default()).unwrap());
        let paginator = Paginator::new(fetcher, extractor, BASE, "Boston", "/p1.html", max_pages);
        (paginator, transport, store)
    }

    async fn drain(paginator: &mut Paginator) -> Vec<String> {
        let mut hotels = Vec::new();
        while let Some(batch) = paginator.next_page().await.unwrap() {
            for record in batch.listing.records {
                hotels.push(record.unwrap().name);
            }
        }
        hotels
    }

    /// Three pages that keep linking forward forever
    fn endless_site() -> ReplayTransport {
        ReplayTransport::new()
            .with_page(format!("{BASE}/p1.html"), listing_page("h1", Some("/p2.html"), false))
            .with_page(format!("{BASE}/p2.html"), listing_page("h2", Some("/p3.html"), false))
            .with_page(format!("{BASE}/p3.html"), listing_page("h3", Some("/p4.html"), false))
    }

    #[tokio::test]
    async fn fetches_a_single_page_by_default() {
        let (mut paginator, transport, store) = paginator(endless_site(), 1);

        assert_eq!(drain(&mut paginator).await, ["h1"]);
        assert!(paginator.is_done());
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(store.saved_names(), ["Boston-hotelist-1.html"]);
    }

    #[tokio::test]
    async fn stops_at_max_pages_without_end_marker() {
        let (mut paginator, transport, _) = paginator(endless_site(), 2);

        assert_eq!(drain(&mut paginator).await, ["h1", "h2"]);
        assert_eq!(paginator.pages_fetched(), 2);
        assert_eq!(transport.request_count(&format!("{BASE}/p3.html")), 0);
    }

    #[tokio::test]
    async fn end_marker_stops_before_max_pages() {
        let site = ReplayTransport::new()
            .with_page(format!("{BASE}/p1.html"), listing_page("h1", Some("/p2.html"), false))
            .with_page(format!("{BASE}/p2.html"), listing_page("h2", None, true));
        let (mut paginator, _, store) = paginator(site, 10);

        assert_eq!(drain(&mut paginator).await, ["h1", "h2"]);
        assert_eq!(
            store.saved_names(),
            ["Boston-hotelist-1.html", "Boston-hotelist-2.html"]
        );
    }

    #[tokio::test]
    async fn missing_pagination_container_is_terminal() {
        let site = ReplayTransport::new()
            .with_page(format!("{BASE}/p1.html"), listing_page("h1", None, false));
        let (mut paginator, _, _) = paginator(site, 10);

        assert_eq!(drain(&mut paginator).await, ["h1"]);
        assert_eq!(paginator.pages_fetched(), 1);
    }

    #[tokio::test]
    async fn self_link_does_not_loop() {
        let site = ReplayTransport::new()
            .with_page(format!("{BASE}/p1.html"), listing_page("h1", Some("/p1.html"), false));
        let (mut paginator, transport, _) = paginator(site, 50);

        assert_eq!(drain(&mut paginator).await, ["h1"]);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_is_returned_and_ends_pagination() {
        let site = ReplayTransport::new()
            .with_page(format!("{BASE}/p1.html"), listing_page("h1", Some("/p2.html"), false))
            .with_status(format!("{BASE}/p2.html"), 500, "oops");
        let (mut paginator, _, _) = paginator(site, 5);

        assert!(paginator.next_page().await.unwrap().is_some());
        let err = paginator.next_page().await.unwrap_err();
        assert!(matches!(err, ScrapeError::Transport { .. }));
        assert!(paginator.is_done());
        assert!(paginator.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn retry_policy_attempts_a_page_up_to_the_limit() {
        let site = ReplayTransport::new()
            .with_failure(format!("{BASE}/p1.html"), "connection reset");
        let (paginator, transport, _) = paginator(site, 1);
        let mut paginator = paginator.with_retry(RetryPolicy {
            max_retries: 2,
            backoff: Duration::ZERO,
        });

        let err = paginator.next_page().await.unwrap_err();
        assert!(matches!(err, ScrapeError::Transport { .. }));
        assert_eq!(transport.request_count(&format!("{BASE}/p1.html")), 3);
    }
}
