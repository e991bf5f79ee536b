//! Traits and configuration for the hotel catalog scraper

use std::time::Duration;

use async_trait::async_trait;
use scraper::Html;

use crate::error::{FetchFailure, ScrapeError};
use crate::models::ListingRecord;

pub const DEFAULT_BASE_URL: &str = "http://www.tripadvisor.com";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10_2) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/41.0.2272.76 Safari/537.36";

/// Configuration for a scraping run
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Base URL every relative link is joined onto
    pub base_url: String,
    /// Sent as `User-Agent` on every request
    pub user_agent: String,
    /// Minimum spacing between the start of two requests
    pub request_delay: Duration,
    /// Listing pages to walk before stopping, even if more exist
    pub max_pages: usize,
    /// Detail pages resolved at once; 1 keeps the run strictly sequential
    pub detail_concurrency: usize,
    /// Extra attempts for a fetch that failed at the transport level
    pub max_retries: u32,
    /// Base delay for exponential backoff between those attempts
    pub retry_backoff: Duration,
    /// CSS selectors for the catalog markup
    pub selectors: SiteSelectors,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_delay: Duration::from_secs(2),
            max_pages: 1,
            detail_concurrency: 1,
            max_retries: 0,
            retry_backoff: Duration::from_secs(1),
            selectors: SiteSelectors::default(),
        }
    }
}

/// CSS selectors for every page kind the scraper reads
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// Link from the city index page to the hotel list
    pub city_hotels_link: String,
    /// Listing layouts, tried in order until one matches
    pub listing_matchers: Vec<ListingSelectors>,
    pub pagination: PaginationSelectors,
    pub detail: DetailSelectors,
}

/// One listing-page layout
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    /// Label used in logs when this layout is picked
    pub label: String,
    /// Container selector for individual hotels
    pub container: String,
    /// Anchor carrying both the hotel name and its detail link
    pub title_link: String,
    /// Star rating image; its `alt` reads like `4.5 of 5 stars`
    pub stars: String,
    /// Element whose text mentions the review count
    pub reviews: String,
}

#[derive(Debug, Clone)]
pub struct PaginationSelectors {
    /// Pagination container selector
    pub container: String,
    /// Present inside the container on the last page
    pub end_marker: String,
    /// Candidate links within pagination
    pub next_link: String,
    /// Link texts that mean "next page"
    pub next_labels: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DetailSelectors {
    /// Block holding every rating distribution
    pub container: String,
    /// One row per severity bucket, best first
    pub severity_row: String,
    pub severity_count: String,
    /// One row per traveler type: family, couple, solo, business
    pub traveler_row: String,
    pub traveler_value: String,
    /// One row per sub-rating, in fixed category order
    pub summary_row: String,
    /// Icon inside a sub-rating row; its `alt` carries the rating
    pub summary_icon: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        let listing = |label: &str, container: &str| ListingSelectors {
            label: label.to_string(),
            container: container.to_string(),
            title_link: r#"a[target="_blank"]"#.to_string(),
            stars: "img.sprite-ratings".to_string(),
            reviews: "span.more".to_string(),
        };

        Self {
            city_hotels_link: "li.hotels.twoLines a[href]".to_string(),
            listing_matchers: vec![
                listing(
                    "reasoning_v5",
                    "div.listing.wrap.reasoning_v5_wrap.jfy_listing.p13n_imperfect",
                ),
                listing("listing_info", "div.listing_info.jfy"),
                listing("easy_clear", "div.listing.easyClear.p13n_imperfect"),
            ],
            pagination: PaginationSelectors {
                container: "div.pagination.paginationfillbtm".to_string(),
                end_marker: "span.guiArw.pageEndNext".to_string(),
                next_link: "a[href]".to_string(),
                next_labels: vec!["»".to_string(), "&raquo;".to_string()],
            },
            detail: DetailSelectors {
                container: "div.content.wrap.trip_type_layout".to_string(),
                severity_row: "div.wrap.row".to_string(),
                severity_count: "span.compositeCount".to_string(),
                traveler_row: "div.filter_connection_wrapper".to_string(),
                traveler_value: "div.value".to_string(),
                summary_row: "li".to_string(),
                summary_icon: "img".to_string(),
            },
        }
    }
}

/// Raw HTTP response handed back by a [`Transport`]
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// The network boundary: one GET with caller-supplied headers
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, FetchFailure>;
}

/// Where raw pages are kept for offline replay and debugging
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Persist one fetched page under a deterministic name
    ///
    /// # Arguments
    /// * `name` - File name, keyed by city and page index or detail URL
    /// * `bytes` - The page exactly as received
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<(), ScrapeError>;
}

/// A listing container that could not be read
#[derive(Debug)]
pub struct ListingFailure {
    /// Hotel name, when it was read before the failing field
    pub name: Option<String>,
    pub error: ScrapeError,
}

/// Outcome for a single listing container
pub type ListingOutcome = Result<ListingRecord, ListingFailure>;

/// A structural rule for one listing-page layout
pub trait ListingMatcher: Send + Sync {
    /// Label used in logs
    fn label(&self) -> &str;

    /// Extract every hotel this layout recognises
    ///
    /// # Returns
    /// * `None` - No container of this layout exists in the document
    /// * `Some(records)` - One outcome per container, in document order
    fn try_extract(&self, document: &Html) -> Option<Vec<ListingOutcome>>;
}
