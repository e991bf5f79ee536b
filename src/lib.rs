pub mod aggregator;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod hotel_finder;
pub mod models;
pub mod paginator;
pub mod report;
pub mod resolver;
pub mod storage;
pub mod traits;

pub use aggregator::Aggregator;
pub use error::{FetchFailure, ScrapeError};
pub use extract::Extractor;
pub use fetcher::{PageFetcher, RateLimiter, ReqwestTransport, RetryPolicy};
pub use hotel_finder::{CityLocator, HotelFinder, RunFailure, ScrapeOutcome};
pub use models::{AggregatedResult, HotelReport, ListingRecord, Rating};
pub use storage::{FilePageStore, MemoryPageStore};
pub use traits::{PageStore, ScraperConfig, SiteSelectors, Transport};
