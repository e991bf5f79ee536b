use tracing::{error, info, warn};

use crate::error::ScrapeError;
use crate::models::{AggregatedResult, CategoryBreakdown, DetailRecord, HotelReport, ListingRecord};

/// Folds listing and detail records into one result keyed by hotel name.
///
/// A name seen twice in one run keeps whatever was recorded last, success or
/// failure, and the replacement is logged.
#[derive(Debug, Default)]
pub struct Aggregator {
    result: AggregatedResult,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weighted 5-to-1 average of a breakdown.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::DivisionUndefined`] when every bucket is zero.
    pub fn weighted_score(name: &str, breakdown: &CategoryBreakdown) -> Result<f64, ScrapeError> {
        breakdown
            .weighted_average()
            .ok_or_else(|| ScrapeError::DivisionUndefined {
                name: name.to_string(),
            })
    }

    /// Record one fully resolved hotel, or its scoring failure.
    pub fn record(&mut self, listing: ListingRecord, detail: DetailRecord) {
        match Self::weighted_score(&listing.name, &detail.breakdown) {
            Ok(average_score) => {
                let name = listing.name.clone();
                info!("Hotel {}: average score {:.2}", name, average_score);

                if self.result.failures.remove(&name).is_some() {
                    warn!(
                        "Hotel {} succeeded after an earlier failure, keeping the later result",
                        name
                    );
                }
                let report = HotelReport {
                    listing,
                    detail,
                    average_score,
                };
                if self.result.hotels.insert(name.clone(), report).is_some() {
                    warn!("Duplicate hotel {}, keeping the later listing", name);
                }
            }
            Err(err) => self.record_failure(listing.name, err),
        }
    }

    pub fn record_failure(&mut self, name: impl Into<String>, err: ScrapeError) {
        let name = name.into();
        error!(hotel = %name, error = %err, "Hotel could not be completed");

        if self.result.hotels.remove(&name).is_some() {
            warn!("Hotel {} failed after an earlier success, keeping the later failure", name);
        }
        if self.result.failures.insert(name.clone(), err).is_some() {
            warn!("Duplicate failure for {}, keeping the later one", name);
        }
    }

    /// Pair listings with their detail outcomes and fold them in order.
    pub fn merge<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (ListingRecord, Result<DetailRecord, ScrapeError>)>,
    {
        for (listing, detail) in pairs {
            match detail {
                Ok(detail) => self.record(listing, detail),
                Err(err) => self.record_failure(listing.name, err),
            }
        }
    }

    pub fn result(&self) -> &AggregatedResult {
        &self.result
    }

    pub fn into_result(self) -> AggregatedResult {
        self.result
    }
}
