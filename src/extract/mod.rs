//! # Markup Extraction
//!
//! Turns raw catalog pages into typed records. All parsing happens on a
//! `scraper::Html` that lives only for the duration of one call, so nothing
//! here is held across an `.await`.
//!
//! ## Page kinds
//!
//! - **City index**: a single link to the hotel list
//! - **Listing page**: hotels plus a pagination cursor. Several layouts exist
//!   across site revisions; they are tried in order and the first one with at
//!   least one container wins. Later layouts are never consulted once one
//!   matches.
//! - **Detail page**: five severity buckets, four traveler types and six
//!   icon sub-ratings, all positional
//!
//! ## Numbers
//!
//! Counts are trimmed and stripped of thousand separators before parsing.
//! Anything that still fails to parse is a `FieldExtraction` error, never zero.

mod detail;
mod listing;

pub use listing::SelectorMatcher;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::error::ScrapeError;
use crate::models::{DetailRecord, Document, PaginationCursor, Rating};
use crate::traits::{ListingMatcher, ListingOutcome, SiteSelectors};

use detail::DetailLocators;
use listing::PaginationLocators;

const THOUSAND_SEPARATORS: [char; 4] = [',', '\u{a0}', '\u{202f}', '\''];

/// Hotels found on one listing page and where to go next
#[derive(Debug)]
pub struct ListingPage {
    /// One outcome per hotel container, in document order
    pub records: Vec<ListingOutcome>,
    /// Label of the layout that matched, if any did
    pub matcher: Option<String>,
    pub cursor: PaginationCursor,
}


pub struct Extractor {
    city_link: Selector,
    matchers: Vec<Box<dyn ListingMatcher>>,
    pagination: PaginationLocators,
    detail: DetailLocators,
}

impl Extractor {
    /// Build an extractor with one [`SelectorMatcher`] per configured listing layout.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidSelector`] if any selector fails to parse.
    pub fn new(base_url: &str, selectors: &SiteSelectors) -> Result<Self, ScrapeError> {
        let matchers = selectors
            .listing_matchers
            .iter()
            .map(|layout| {
                SelectorMatcher::new(base_url, layout)
                    .map(|matcher| Box::new(matcher) as Box<dyn ListingMatcher>)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::with_matchers(selectors, matchers)
    }

    /// Build an extractor around an explicit, ordered matcher chain.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidSelector`] if a pagination, detail or city
    /// selector fails to parse.
    pub fn with_matchers(
        selectors: &SiteSelectors,
        matchers: Vec<Box<dyn ListingMatcher>>,
    ) -> Result<Self, ScrapeError> {
        Ok(Self {
            city_link: parse_selector(&selectors.city_hotels_link)?,
            matchers,
            pagination: PaginationLocators::new(&selectors.pagination)?,
            detail: DetailLocators::new(&selectors.detail)?,
        })
    }

    pub fn extract_listing(&self, document: &Document) -> ListingPage {
        let html = Html::parse_document(&document.body);
        let cursor = self.pagination.cursor(&html);

        for matcher in &self.matchers {
            match matcher.try_extract(&html) {
                Some(records) if !records.is_empty() => {
                    debug!(
                        matcher = matcher.label(),
                        records = records.len(),
                        "Listing layout matched"
                    );
                    return ListingPage {
                        records,
                        matcher: Some(matcher.label().to_string()),
                        cursor,
                    };
                }
                _ => debug!("Layout {} not found on {}", matcher.label(), document.url),
            }
        }

        warn!("No listing layout matched {}", document.url);
        ListingPage {
            records: Vec::new(),
            matcher: None,
            cursor,
        }
    }

    /// Extract the rating breakdown of a detail page.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::MalformedDocument`] if the breakdown container is missing
    ///   or holds an unexpected number of buckets
    /// - [`ScrapeError::FieldExtraction`] if a single count or icon cannot be read
    pub fn extract_detail(&self, document: &Document) -> Result<DetailRecord, ScrapeError> {
        let html = Html::parse_document(&document.body);
        self.detail.extract(&html, &document.url)
    }

    /// Find the hotel list link on a city index page.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::MalformedDocument`] if the link is absent.
    pub fn extract_city_link(&self, document: &Document) -> Result<String, ScrapeError> {
        let html = Html::parse_document(&document.body);
        html.select(&self.city_link)
            .find_map(|link| link.value().attr("href"))
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty())
            .ok_or_else(|| ScrapeError::malformed(&document.url, "hotel list link not found"))
    }
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

/// First non-blank text node under `element`, trimmed
pub(crate) fn first_text<'a>(element: ElementRef<'a>) -> Option<&'a str> {
    element.text().map(str::trim).find(|text| !text.is_empty())
}

/// All text under `element`, trimmed; used for error reporting
pub(crate) fn raw_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Parse a count such as `" 1,234 "`.
///
/// # Errors
///
/// Returns [`ScrapeError::FieldExtraction`] carrying the untouched input.
pub fn clean_count(field: &str, raw: &str) -> Result<u32, ScrapeError> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !THOUSAND_SEPARATORS.contains(c))
        .collect();

    cleaned
        .parse::<u32>()
        .map_err(|_| ScrapeError::field(field, raw))
}

/// Parse the leading number of an icon caption such as `"4.5 of 5 stars"`.
///
/// # Errors
///
/// Returns [`ScrapeError::FieldExtraction`] when there is no number or it
/// falls outside the 1 to 5 scale.
pub fn parse_rating(field: &str, caption: &str) -> Result<Rating, ScrapeError> {
    caption
        .split_whitespace()
        .next()
        .and_then(|token| token.parse::<f32>().ok())
        .and_then(Rating::new)
        .ok_or_else(|| ScrapeError::field(field, caption))
}

/// Join a link found in markup onto the site base URL
#[must_use]
pub fn absolute_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{href}", base_url.trim_end_matches('/'))
    } else {
        format!("{}/{href}", base_url.trim_end_matches('/'))
    }
}
