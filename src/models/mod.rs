//! Data models for hotel listings, review breakdowns and the aggregated run output

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{ScrapeError, serialize_error_map};

/// Raw markup of one fetched page
#[derive(Debug, Clone)]
pub struct Document {
    pub url: String,
    pub body: String,
}

/// An ordinal rating read from a star or bubble icon, e.g. `4.5 of 5`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Rating(f32);

impl Rating {
    pub const MIN: f32 = 1.0;
    pub const MAX: f32 = 5.0;

    /// Returns `None` outside `1.0..=5.0`.
    #[must_use]
    pub fn new(value: f32) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A hotel entry as it appears on a listing page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingRecord {
    pub name: String,
    pub stars: Option<Rating>,
    pub review_count: Option<u32>,
    pub detail_url: Option<String>,
}

/// Review counts per severity bucket, best first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub excellent: u32,
    pub very_good: u32,
    pub average: u32,
    pub poor: u32,
    pub terrible: u32,
}

impl CategoryBreakdown {
    pub const BUCKETS: [&'static str; 5] =
        ["excellent", "very_good", "average", "poor", "terrible"];

    #[must_use]
    pub fn from_counts(counts: [u32; 5]) -> Self {
        let [excellent, very_good, average, poor, terrible] = counts;
        Self {
            excellent,
            very_good,
            average,
            poor,
            terrible,
        }
    }

    #[must_use]
    pub fn counts(&self) -> [u32; 5] {
        [
            self.excellent,
            self.very_good,
            self.average,
            self.poor,
            self.terrible,
        ]
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts().iter().map(|&count| u64::from(count)).sum()
    }

    /// 5-to-1 weighted mean of the buckets.
    ///
    /// Returns `None` when every bucket is zero; callers must report that as
    /// a failure rather than pick a score.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn weighted_average(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }

        let weighted: u64 = self
            .counts()
            .iter()
            .zip([5u64, 4, 3, 2, 1])
            .map(|(&count, weight)| u64::from(count) * weight)
            .sum();

        Some(weighted as f64 / total as f64)
    }
}

/// Review counts by traveler type. Kept verbatim; the site mixes numbers and text here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TravelerTypes {
    pub family: String,
    pub couple: String,
    pub solo: String,
    pub business: String,
}

/// The six sub-ratings shown as icons on a detail page
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryScores {
    pub sleep_quality: Rating,
    pub location: Rating,
    pub rooms: Rating,
    pub service: Rating,
    pub value: Rating,
    pub cleanliness: Rating,
}

impl CategoryScores {
    pub const CATEGORIES: [&'static str; 6] = [
        "sleep_quality",
        "location",
        "rooms",
        "service",
        "value",
        "cleanliness",
    ];

    #[must_use]
    pub fn from_ratings(ratings: [Rating; 6]) -> Self {
        let [sleep_quality, location, rooms, service, value, cleanliness] = ratings;
        Self {
            sleep_quality,
            location,
            rooms,
            service,
            value,
            cleanliness,
        }
    }

    #[must_use]
    pub fn ratings(&self) -> [Rating; 6] {
        [
            self.sleep_quality,
            self.location,
            self.rooms,
            self.service,
            self.value,
            self.cleanliness,
        ]
    }
}

/// Everything extracted from one detail page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRecord {
    pub breakdown: CategoryBreakdown,
    pub travelers: TravelerTypes,
    pub scores: CategoryScores,
}

/// One hotel in the final output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotelReport {
    #[serde(flatten)]
    pub listing: ListingRecord,
    #[serde(flatten)]
    pub detail: DetailRecord,
    pub average_score: f64,
}

/// Hotels keyed by name, plus the hotels that could not be completed and why
#[derive(Debug, Default, Serialize)]
pub struct AggregatedResult {
    pub hotels: BTreeMap<String, HotelReport>,
    #[serde(serialize_with = "serialize_error_map")]
    pub failures: BTreeMap<String, ScrapeError>,
}

impl AggregatedResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hotels.is_empty() && self.failures.is_empty()
    }
}

/// Where the paginator goes after the current listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationCursor {
    /// Link to the next page, as found in the markup (usually relative)
    Next(String),
    Terminal,
}

impl PaginationCursor {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_average_matches_reference_weighting() {
        let breakdown = CategoryBreakdown::from_counts([10, 5, 2, 1, 0]);
        let avg = breakdown.weighted_average().unwrap();
        assert!((avg - 78.0 / 18.0).abs() < 1e-9, "got {avg}");
    }

    #[test]
    fn weighted_average_undefined_for_all_zero_buckets() {
        assert_eq!(CategoryBreakdown::default().weighted_average(), None);
    }

    #[test]
    fn weighted_average_stays_within_one_and_five() {
        let samples = [
            [1, 0, 0, 0, 0],
            [0, 0, 0, 0, 1],
            [0, 0, 7, 0, 0],
            [3, 1, 4, 1, 5],
            [u32::MAX, u32::MAX, u32::MAX, u32::MAX, u32::MAX],
            [0, 0, 0, u32::MAX, 1],
        ];
        for counts in samples {
            let avg = CategoryBreakdown::from_counts(counts)
                .weighted_average()
                .unwrap();
            assert!((1.0..=5.0).contains(&avg), "{counts:?} gave {avg}");
        }
    }

    #[test]
    fn extreme_buckets_hit_the_bounds_exactly() {
        let best = CategoryBreakdown::from_counts([9, 0, 0, 0, 0]);
        let worst = CategoryBreakdown::from_counts([0, 0, 0, 0, 9]);
        assert_eq!(best.weighted_average(), Some(5.0));
        assert_eq!(worst.weighted_average(), Some(1.0));
    }

    #[test]
    fn rating_rejects_values_outside_scale() {
        assert!(Rating::new(0.0).is_none());
        assert!(Rating::new(5.5).is_none());
        assert_eq!(Rating::new(4.5).map(Rating::value), Some(4.5));
        assert_eq!(Rating::new(3.0).unwrap().to_string(), "3");
    }

    #[test]
    fn hotel_report_serializes_flat() {
        let rating = Rating::new(4.0).unwrap();
        let report = HotelReport {
            listing: ListingRecord {
                name: "Alpha".into(),
                stars: Some(rating),
                review_count: Some(18),
                detail_url: Some("http://example.com/a".into()),
            },
            detail: DetailRecord {
                breakdown: CategoryBreakdown::from_counts([10, 5, 2, 1, 0]),
                travelers: TravelerTypes::default(),
                scores: CategoryScores::from_ratings([rating; 6]),
            },
            average_score: 4.5,
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["name"], "Alpha");
        assert_eq!(value["review_count"], 18);
        assert_eq!(value["breakdown"]["excellent"], 10);
        assert_eq!(value["scores"]["rooms"], 4.0);
        assert_eq!(value["average_score"], 4.5);
    }
}
