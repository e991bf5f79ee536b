use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::aggregator::Aggregator;
use crate::error::{ScrapeError, serialize_display};
use crate::extract::{Extractor, absolute_url};
use crate::fetcher::{PageFetcher, RateLimiter, RetryPolicy};
use crate::models::{AggregatedResult, ListingRecord};
use crate::paginator::Paginator;
use crate::resolver::DetailResolver;
use crate::storage::page_file_name;
use crate::traits::{ListingFailure, PageStore, ScraperConfig, Transport};

/// The run-scoped error that ended a run early, and what the run was doing
#[derive(Debug, Serialize)]
pub struct RunFailure {
    pub stage: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: ScrapeError,
}

impl RunFailure {
    fn new(stage: impl Into<String>, error: ScrapeError) -> Self {
        Self {
            stage: stage.into(),
            error,
        }
    }
}

/// Everything one run produced, including a partial result if it was aborted
#[derive(Debug, Serialize)]
pub struct ScrapeOutcome {
    pub city: String,
    pub state: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pages_fetched: usize,
    pub result: AggregatedResult,
    pub aborted: Option<RunFailure>,
}

impl ScrapeOutcome {
    /// No run-scoped abort and no per-hotel failure
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.aborted.is_none() && self.result.failures.is_empty()
    }
}

/// Resolves the first hotel list page from a city index page
#[derive(Clone)]
pub struct CityLocator {
    fetcher: PageFetcher,
    extractor: Arc<Extractor>,
    base_url: String,
    retry: RetryPolicy,
}

impl CityLocator {
    pub fn new(
        fetcher: PageFetcher,
        extractor: Arc<Extractor>,
        base_url: &str,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            base_url: base_url.to_string(),
            retry,
        }
    }

    #[must_use]
    pub fn city_url(base_url: &str, city: &str, state: &str) -> String {
        absolute_url(
            base_url,
            &format!(
                "city={}&state={}",
                urlencoding::encode(city),
                urlencoding::encode(state)
            ),
        )
    }

    /// Fetch the city index page and return the hotel list link found on it.
    ///
    /// # Errors
    ///
    /// Any fetch error, or [`ScrapeError::MalformedDocument`] if the page has
    /// no hotel list link.
    pub async fn locate(&self, city: &str, state: &str) -> Result<String, ScrapeError> {
        let url = Self::city_url(&self.base_url, city, state);
        let page_name = page_file_name(city, "tourism", "page");

        let document = self
            .retry
            .run(|| self.fetcher.fetch(&url, &page_name))
            .await?;
        let link = self.extractor.extract_city_link(&document)?;

        info!("Hotel list for {}, {} is at {}", city, state, link);
        Ok(link)
    }
}

#[derive(Clone)]
pub struct HotelFinder {
    config: ScraperConfig,
    fetcher: PageFetcher,
    extractor: Arc<Extractor>,
}

impl HotelFinder {
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidSelector`] if a configured selector does
    /// not parse.
    pub fn new(
        config: ScraperConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn PageStore>,
    ) -> Result<Self, ScrapeError> {
        let extractor = Arc::new(Extractor::new(&config.base_url, &config.selectors)?);
        let limiter = Arc::new(RateLimiter::new(config.request_delay));
        let fetcher = PageFetcher::new(transport, store, limiter, config.user_agent.clone());

        Ok(Self {
            config,
            fetcher,
            extractor,
        })
    }

    fn retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.config.max_retries,
            backoff: self.config.retry_backoff,
        }
    }

    /// Scrape every hotel of a city.
    ///
    /// Never fails as a whole: a run-scoped error ends the run and is returned
    /// in [`ScrapeOutcome::aborted`] next to whatever was completed before it.
    pub async fn scrape(&self, city: &str, state: &str) -> ScrapeOutcome {
        let started_at = Utc::now();
        info!("Scraping hotels for {}, {}", city, state);

        let mut aggregator = Aggregator::new();
        let mut pages_fetched = 0;
        let aborted = self
            .run(city, state, &mut aggregator, &mut pages_fetched)
            .await
            .err();

        if let Some(failure) = &aborted {
            error!(stage = %failure.stage, error = %failure.error, "Run aborted");
        }

        let result = aggregator.into_result();
        info!(
            "Finished {}, {}: {} hotels, {} failures over {} pages",
            city,
            state,
            result.hotels.len(),
            result.failures.len(),
            pages_fetched
        );

        ScrapeOutcome {
            city: city.to_string(),
            state: state.to_string(),
            started_at,
            finished_at: Utc::now(),
            pages_fetched,
            result,
            aborted,
        }
    }

    async fn run(
        &self,
        city: &str,
        state: &str,
        aggregator: &mut Aggregator,
        pages_fetched: &mut usize,
    ) -> Result<(), RunFailure> {
        let retry = self.retry();

        let first_page = CityLocator::new(
            self.fetcher.clone(),
            Arc::clone(&self.extractor),
            &self.config.base_url,
            retry,
        )
        .locate(city, state)
        .await
        .map_err(|error| RunFailure::new("locating hotel list", error))?;

        let mut paginator = Paginator::new(
            self.fetcher.clone(),
            Arc::clone(&self.extractor),
            &self.config.base_url,
            city,
            &first_page,
            self.config.max_pages,
        )
        .with_retry(retry);
        let resolver = DetailResolver::new(self.fetcher.clone(), Arc::clone(&self.extractor), city)
            .with_retry(retry);

        loop {
            let next = paginator.next_page().await;
            *pages_fetched = paginator.pages_fetched();

            let batch = match next {
                Ok(Some(batch)) => batch,
                Ok(None) => break,
                Err(error) => {
                    let stage = format!("fetching listing page {}", paginator.pages_fetched() + 1);
                    return Err(RunFailure::new(stage, error));
                }
            };

            let mut listings: Vec<ListingRecord> = Vec::with_capacity(batch.listing.records.len());
            for (i, outcome) in batch.listing.records.into_iter().enumerate() {
                match outcome {
                    Ok(record) => listings.push(record),
                    Err(ListingFailure { name, error }) => {
                        let key = name.unwrap_or_else(|| format!("page-{}#{}", batch.number, i));
                        aggregator.record_failure(key, error);
                    }
                }
            }

            let details = resolver
                .resolve_all(&listings, self.config.detail_concurrency)
                .await;

            let stage = details
                .aborted
                .as_ref()
                .map(|(index, _)| format!("resolving detail page for {}", listings[*index].name));

            let mut slots: Vec<Option<ListingRecord>> = listings.into_iter().map(Some).collect();
            aggregator.merge(details.completed.into_iter().filter_map(|(index, outcome)| {
                slots[index].take().map(|listing| (listing, outcome))
            }));

            if let (Some(stage), Some((_, error))) = (stage, details.aborted) {
                return Err(RunFailure::new(stage, error));
            }
        }

        Ok(())
    }
}
