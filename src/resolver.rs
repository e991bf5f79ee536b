//! Fetches and extracts the detail page behind each listing record.
//!
//! Resolution of one record is independent of every other, so a batch can be
//! resolved by a bounded pool of workers. All workers share the fetcher, and
//! with it the run's single rate limiter.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::error::ScrapeError;
use crate::extract::Extractor;
use crate::fetcher::{PageFetcher, RetryPolicy};
use crate::models::{DetailRecord, ListingRecord};
use crate::storage::detail_file_name;

/// Results for one batch of listing records
#[derive(Debug, Default)]
pub struct DetailBatch {
    /// `(record index, outcome)` for every record that finished, sorted by index.
    /// Outcomes here are successes or record-scoped failures only.
    pub completed: Vec<(usize, Result<DetailRecord, ScrapeError>)>,
    /// The run-scoped failure that stopped the batch early, with its record index
    pub aborted: Option<(usize, ScrapeError)>,
}

#[derive(Clone)]
pub struct DetailResolver {
    fetcher: PageFetcher,
    extractor: Arc<Extractor>,
    city: String,
    retry: RetryPolicy,
}

impl DetailResolver {
    pub fn new(fetcher: PageFetcher, extractor: Arc<Extractor>, city: &str) -> Self {
        Self {
            fetcher,
            extractor,
            city: city.to_string(),
            retry: RetryPolicy::none(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Resolve the detail page of one listing.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::MissingLink`] if the record has no detail URL
    /// - any fetch or extraction error for the detail page
    pub async fn resolve(&self, record: &ListingRecord) -> Result<DetailRecord, ScrapeError> {
        let url = record
            .detail_url
            .as_deref()
            .ok_or_else(|| ScrapeError::MissingLink {
                name: record.name.clone(),
            })?;

        let page_name = detail_file_name(&self.city, url);
        let document = self
            .retry
            .run(|| self.fetcher.fetch(url, &page_name))
            .await?;

        let detail = self.extractor.extract_detail(&document)?;
        debug!(hotel = %record.name, "Resolved detail page");
        Ok(detail)
    }

    /// Resolve a batch with at most `concurrency` detail pages in flight.
    ///
    /// Record-scoped failures are collected alongside successes. The first
    /// run-scoped failure stops the batch: in-flight work is dropped and only
    /// already finished records are returned.
    pub async fn resolve_all(&self, records: &[ListingRecord], concurrency: usize) -> DetailBatch {
        let mut pending = stream::iter(records.iter().enumerate())
            .map(|(index, record)| async move { (index, self.resolve(record).await) })
            .buffer_unordered(concurrency.max(1));

        let mut batch = DetailBatch {
            completed: Vec::with_capacity(records.len()),
            aborted: None,
        };

        while let Some((index, outcome)) = pending.next().await {
            match outcome {
                Err(err) if !err.is_record_scoped() => {
                    warn!(
                        hotel = %records[index].name,
                        error = %err,
                        "Detail resolution aborted"
                    );
                    batch.aborted = Some((index, err));
                    break;
                }
                outcome => batch.completed.push((index, outcome)),
            }
        }

        batch.completed.sort_by_key(|(index, _)| *index);
        batch
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

    fn detail_page(counts: [u32; 5]) -> String {
        let severity: String = counts
            .iter()
            .map(|c| {
                format!(r#"<div class="wrap row"><span class="compositeCount">{c}</span></div>"#)
            })
            .collect();
        let travelers: String = (0..4)
            .map(|i| {
                format!(
                    r#"<div class="filter_connection_wrapper"><div class="value">{i}</div></div>"#
                )
            })
            .collect();
        let summary: String = (0..6)
            .map(|_| r#"<li><img alt="4 of 5 bubbles"></li>"#)
            .collect();
        format!(
            r#"<div class="content wrap trip_type_layout">{severity}{travelers}<ul>{summary}</ul></div>"#
        )
    }

    fn record(name: &str, path: Option<&str>) -> ListingRecord {
        ListingRecord {
            name: name.to_string(),
            stars: None,
            review_count: None,
            detail_url: path.map(|p| format!("{BASE}{p}")),
        }
    }

    fn resolver(transport: ReplayTransport) -> (DetailResolver, Arc<MemoryPageStore>) {
        let store = Arc::new(MemoryPageStore::new());
        let fetcher = PageFetcher::new(
            Arc::new(transport),
            store.clone(),
            Arc::new(RateLimiter::new(Duration::ZERO)),
            "test-agent",
        );
        let extractor = Arc::new(Extractor::new(BASE, &SiteSelectors::default()).unwrap());
        (DetailResolver::new(fetcher, extractor, "Boston"), store)
    }

    #[tokio::test]
    async fn resolves_and_saves_detail_page() {
        let site = ReplayTransport::new()
            .with_page(format!("{BASE}/a.html"), detail_page([10, 5, 2, 1, 0]));
        let (resolver, store) = resolver(site);

        let detail = resolver.resolve(&record("Alpha", Some("/a.html"))).await.unwrap();

        assert_eq!(detail.breakdown.counts(), [10, 5, 2, 1, 0]);
        assert_eq!(
            store.saved_names(),
            [detail_file_name("Boston", &format!("{BASE}/a.html"))]
        );
    }

    #[tokio::test]
    async fn missing_link_is_reported_without_fetching() {
        let (resolver, store) = resolver(ReplayTransport::new());

        let err = resolver.resolve(&record("Nowhere", None)).await.unwrap_err();

        assert!(matches!(err, ScrapeError::MissingLink { ref name } if name == "Nowhere"));
        assert!(store.saved_names().is_empty());
    }

    #[tokio::test]
    async fn batch_keeps_record_failures_and_document_order() {
        let site = ReplayTransport::new()
            .with_page(format!("{BASE}/a.html"), detail_page([1, 0, 0, 0, 0]))
            .with_page(format!("{BASE}/c.html"), detail_page([0, 0, 0, 0, 3]));
        let (resolver, _) = resolver(site);
        let records = [
            record("A", Some("/a.html")),
            record("B", None),
            record("C", Some("/c.html")),
        ];

        for concurrency in [1, 3] {
            let batch = resolver.resolve_all(&records, concurrency).await;
            assert!(batch.aborted.is_none());

            let indices: Vec<usize> = batch.completed.iter().map(|(i, _)| *i).collect();
            assert_eq!(indices, [0, 1, 2]);
            assert!(batch.completed[0].1.is_ok());
            assert!(matches!(batch.completed[1].1, Err(ScrapeError::MissingLink { .. })));
            assert_eq!(batch.completed[2].1.as_ref().unwrap().breakdown.terrible, 3);
        }
    }

    #[tokio::test]
    async fn sequential_batch_stops_at_first_run_failure() {
        let site = ReplayTransport::new()
            .with_page(format!("{BASE}/a.html"), detail_page([1, 0, 0, 0, 0]))
            .with_status(format!("{BASE}/b.html"), 502, "bad gateway")
            .with_page(format!("{BASE}/c.html"), detail_page([1, 0, 0, 0, 0]));
        let c_url = format!("{BASE}/c.html");
        let (resolver, store) = resolver(site);
        let records = [
            record("A", Some("/a.html")),
            record("B", Some("/b.html")),
            record("C", Some("/c.html")),
        ];

        let batch = resolver.resolve_all(&records, 1).await;

        assert_eq!(batch.completed.len(), 1);
        assert_eq!(batch.completed[0].0, 0);
        let (index, err) = batch.aborted.unwrap();
        assert_eq!(index, 1);
        assert!(matches!(err, ScrapeError::Transport { .. }));
        assert!(
            !store
                .saved_names()
                .contains(&detail_file_name("Boston", &c_url))
        );
    }

    #[tokio::test]
    async fn malformed_detail_page_aborts_the_batch() {
        let site = ReplayTransport::new()
            .with_page(format!("{BASE}/a.html"), "<html><body>maintenance</body></html>");
        let (resolver, _) = resolver(site);

        let batch = resolver.resolve_all(&[record("A", Some("/a.html"))], 2).await;

        assert!(batch.completed.is_empty());
        assert!(matches!(
            batch.aborted,
            Some((0, ScrapeError::MalformedDocument { .. }))
        ));
    }
}
