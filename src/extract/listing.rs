//! Listing-page layouts and pagination lookup

use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use crate::error::ScrapeError;
use crate::models::{ListingRecord, PaginationCursor, Rating};
use crate::traits::{
    ListingFailure, ListingMatcher, ListingOutcome, ListingSelectors, PaginationSelectors,
};

use super::{absolute_url, clean_count, first_text, parse_rating, parse_selector, raw_text};

/// A listing layout described by CSS selectors
pub struct SelectorMatcher {
    label: String,
    base_url: String,
    container: Selector,
    title_link: Selector,
    stars: Selector,
    reviews: Selector,
}

impl SelectorMatcher {
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidSelector`] if any selector fails to parse.
    pub fn new(base_url: &str, selectors: &ListingSelectors) -> Result<Self, ScrapeError> {
        Ok(Self {
            label: selectors.label.clone(),
            base_url: base_url.to_string(),
            container: parse_selector(&selectors.container)?,
            title_link: parse_selector(&selectors.title_link)?,
            stars: parse_selector(&selectors.stars)?,
            reviews: parse_selector(&selectors.reviews)?,
        })
    }

    fn extract_record(&self, container: ElementRef<'_>) -> ListingOutcome {
        let link = container.select(&self.title_link).next();

        let Some(name) = link.and_then(first_text).map(str::to_string) else {
            let raw = link.map(raw_text).unwrap_or_default();
            return Err(ListingFailure {
                name: None,
                error: ScrapeError::field("name", &raw),
            });
        };

        let detail_url = link
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(|href| absolute_url(&self.base_url, href));

        match self.extract_summary(container) {
            Ok((stars, review_count)) => Ok(ListingRecord {
                name,
                stars,
                review_count,
                detail_url,
            }),
            Err(error) => Err(ListingFailure {
                name: Some(name),
                error,
            }),
        }
    }

    fn extract_summary(
        &self,
        container: ElementRef<'_>,
    ) -> Result<(Option<Rating>, Option<u32>), ScrapeError> {
        // A missing icon means "unrated"; a present but unreadable one is an error.
        let stars = match container.select(&self.stars).next() {
            Some(icon) => Some(parse_rating(
                "stars",
                icon.value().attr("alt").unwrap_or_default(),
            )?),
            None => None,
        };

        let review_count = container
            .select(&self.reviews)
            .next()
            .and_then(|element| element.text().find(|text| text.contains("review")))
            .map(parse_review_count)
            .transpose()?;

        Ok((stars, review_count))
    }
}

impl ListingMatcher for SelectorMatcher {
    fn label(&self) -> &str {
        &self.label
    }

    fn try_extract(&self, document: &Html) -> Option<Vec<ListingOutcome>> {
        let records: Vec<ListingOutcome> = document
            .select(&self.container)
            .map(|container| self.extract_record(container))
            .collect();

        (!records.is_empty()).then_some(records)
    }
}

/// `"1,234 reviews"` -> 1234
fn parse_review_count(text: &str) -> Result<u32, ScrapeError> {
    let token = text.split_whitespace().next().unwrap_or_default();
    clean_count("review_count", token).map_err(|_| ScrapeError::field("review_count", text.trim()))
}

pub(crate) struct PaginationLocators {
    container: Selector,
    end_marker: Selector,
    next_link: Selector,
    next_labels: Vec<String>,
}

impl PaginationLocators {
    pub(crate) fn new(selectors: &PaginationSelectors) -> Result<Self, ScrapeError> {
        Ok(Self {
            container: parse_selector(&selectors.container)?,
            end_marker: parse_selector(&selectors.end_marker)?,
            next_link: parse_selector(&selectors.next_link)?,
            next_labels: selectors.next_labels.clone(),
        })
    }

    /// No container and an explicit end marker both mean "last page".
    pub(crate) fn cursor(&self, document: &Html) -> PaginationCursor {
        let Some(pagination) = document.select(&self.container).next() else {
            info!("No pagination container, treating page as the last one");
            return PaginationCursor::Terminal;
        };

        if pagination.select(&self.end_marker).next().is_some() {
            info!("We reached last page");
            return PaginationCursor::Terminal;
        }

        let next = pagination.select(&self.next_link).find_map(|link| {
            let label = raw_text(link);
            if self.next_labels.iter().any(|wanted| *wanted == label) {
                link.value().attr("href").map(str::trim)
            } else {
                None
            }
        });

        match next {
            Some(href) if !href.is_empty() => {
                info!("Next url is {}", href);
                PaginationCursor::Next(href.to_string())
            }
            _ => {
                warn!("Pagination has neither an end marker nor a next link, stopping");
                PaginationCursor::Terminal
            }
        }
    }
}
