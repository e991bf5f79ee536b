//! Detail-page rating breakdown

use scraper::{ElementRef, Html, Selector};

use crate::error::ScrapeError;
use crate::models::{CategoryBreakdown, CategoryScores, DetailRecord, Rating, TravelerTypes};
use crate::traits::DetailSelectors;

use super::{clean_count, first_text, parse_rating, parse_selector, raw_text};

const SEVERITY_BUCKETS: usize = 5;
const TRAVELER_TYPES: [&str; 4] = ["family", "couple", "solo", "business"];

pub(crate) struct DetailLocators {
    container: Selector,
    severity_row: Selector,
    severity_count: Selector,
    traveler_row: Selector,
    traveler_value: Selector,
    summary_row: Selector,
    summary_icon: Selector,
}

impl DetailLocators {
    pub(crate) fn new(selectors: &DetailSelectors) -> Result<Self, ScrapeError> {
        Ok(Self {
            container: parse_selector(&selectors.container)?,
            severity_row: parse_selector(&selectors.severity_row)?,
            severity_count: parse_selector(&selectors.severity_count)?,
            traveler_row: parse_selector(&selectors.traveler_row)?,
            traveler_value: parse_selector(&selectors.traveler_value)?,
            summary_row: parse_selector(&selectors.summary_row)?,
            summary_icon: parse_selector(&selectors.summary_icon)?,
        })
    }

    /// Structure is checked before any field is read, so a page with the wrong
    /// shape never produces a partial breakdown.
    pub(crate) fn extract(&self, document: &Html, url: &str) -> Result<DetailRecord, ScrapeError> {
        let container = document
            .select(&self.container)
            .next()
            .ok_or_else(|| ScrapeError::malformed(url, "rating breakdown container not found"))?;

        let severity: Vec<ElementRef<'_>> = container.select(&self.severity_row).collect();
        if severity.len() != SEVERITY_BUCKETS {
            return Err(ScrapeError::malformed(
                url,
                format!(
                    "expected {SEVERITY_BUCKETS} severity buckets, found {}",
                    severity.len()
                ),
            ));
        }

        let travelers: Vec<ElementRef<'_>> = container.select(&self.traveler_row).collect();
        if travelers.len() != TRAVELER_TYPES.len() {
            return Err(ScrapeError::malformed(
                url,
                format!(
                    "expected {} traveler types, found {}",
                    TRAVELER_TYPES.len(),
                    travelers.len()
                ),
            ));
        }

        let summaries: Vec<ElementRef<'_>> = container.select(&self.summary_row).collect();
        if summaries.len() < CategoryScores::CATEGORIES.len() {
            return Err(ScrapeError::malformed(
                url,
                format!(
                    "expected {} sub-ratings, found {}",
                    CategoryScores::CATEGORIES.len(),
                    summaries.len()
                ),
            ));
        }

        let mut counts = [0u32; SEVERITY_BUCKETS];
        for ((slot, row), field) in counts
            .iter_mut()
            .zip(&severity)
            .zip(CategoryBreakdown::BUCKETS)
        {
            *slot = self.severity_count(*row, field)?;
        }

        let values = travelers
            .iter()
            .zip(TRAVELER_TYPES)
            .map(|(row, field)| self.traveler_value(*row, field))
            .collect::<Result<Vec<_>, _>>()?;
        let [family, couple, solo, business]: [String; 4] = values
            .try_into()
            .map_err(|_| ScrapeError::malformed(url, "traveler types out of shape"))?;

        // Every category reads its own row; nothing is borrowed from a neighbour.
        let ratings = summaries
            .iter()
            .zip(CategoryScores::CATEGORIES)
            .map(|(row, field)| self.summary_rating(*row, field))
            .collect::<Result<Vec<_>, _>>()?;
        let ratings: [Rating; 6] = ratings
            .try_into()
            .map_err(|_| ScrapeError::malformed(url, "sub-ratings out of shape"))?;

        Ok(DetailRecord {
            breakdown: CategoryBreakdown::from_counts(counts),
            travelers: TravelerTypes {
                family,
                couple,
                solo,
                business,
            },
            scores: CategoryScores::from_ratings(ratings),
        })
    }

    fn severity_count(&self, row: ElementRef<'_>, field: &str) -> Result<u32, ScrapeError> {
        let cell = row
            .select(&self.severity_count)
            .next()
            .ok_or_else(|| ScrapeError::field(field, &raw_text(row)))?;
        clean_count(field, first_text(cell).unwrap_or_default())
    }

    fn traveler_value(&self, row: ElementRef<'_>, field: &str) -> Result<String, ScrapeError> {
        row.select(&self.traveler_value)
            .next()
            .and_then(first_text)
            .map(str::to_string)
            .ok_or_else(|| ScrapeError::field(field, &raw_text(row)))
    }

    fn summary_rating(&self, row: ElementRef<'_>, field: &str) -> Result<Rating, ScrapeError> {
        let caption = row
            .select(&self.summary_icon)
            .next()
            .and_then(|icon| icon.value().attr("alt"))
            .ok_or_else(|| ScrapeError::field(field, &raw_text(row)))?;
        parse_rating(field, caption)
    }
}
