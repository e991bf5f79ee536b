//! Markup fixtures shaped like the catalog's city, listing and detail pages.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use hotel_scraper::fetcher::ReplayTransport;
use hotel_scraper::{HotelFinder, MemoryPageStore, ScraperConfig};

pub const BASE: &str = "http://catalog.test";
pub const CITY_URL: &str = "http://catalog.test/city=Boston&state=MA";
pub const FIRST_PAGE: &str = "/Hotels-g60745-Boston_Massachusetts-Hotels.html";

/// One hotel container on a listing page
pub struct Listed<'a> {
    pub name: &'a str,
    pub href: Option<&'a str>,
    pub stars_alt: Option<&'a str>,
    pub reviews: Option<&'a str>,
}

impl<'a> Listed<'a> {
    pub fn new(name: &'a str, href: &'a str) -> Self {
        Self {
            name,
            href: Some(href),
            stars_alt: Some("4.5 of 5 stars"),
            reviews: Some("1,234 reviews"),
        }
    }

    pub fn without_link(name: &'a str) -> Self {
        Self {
            href: None,
            ..Self::new(name, "")
        }
    }
}

pub fn city_page(hotel_list: &str) -> String {
    format!(
        r#"<html><body><ul class="navLinks">
             <li class="restaurants twoLines"><a href="/Restaurants-Boston.html">Restaurants</a></li>
             <li class="hotels twoLines"><a href="{hotel_list}">Hotels</a></li>
           </ul></body></html>"#
    )
}

/// Listing page in the `listing_info` layout; `next` adds a pagination block
pub fn listing_page(hotels: &[Listed<'_>], next: Option<&str>) -> String {
    let containers: String = hotels
        .iter()
        .map(|hotel| {
            let link = match hotel.href {
                Some(href) => format!(r#"<a target="_blank" href="{href}">{}</a>"#, hotel.name),
                None => format!(r#"<a target="_blank">{}</a>"#, hotel.name),
            };
            let stars = hotel
                .stars_alt
                .map(|alt| format!(r#"<img class="sprite-ratings" alt="{alt}">"#))
                .unwrap_or_default();
            let reviews = hotel
                .reviews
                .map(|text| format!(r#"<span class="more"><a href="{BASE}/r">{text}</a></span>"#))
                .unwrap_or_default();
            format!(
                r#"<div class="listing_info jfy"><div class="title">{link}</div>{stars}{reviews}</div>"#
            )
        })
        .collect();

    let pagination = match next {
        Some(href) => format!(
            r#"<div class="pagination paginationfillbtm"><span class="pageNum current">1</span><a href="{href}">&raquo;</a></div>"#
        ),
        None => r#"<div class="pagination paginationfillbtm"><span class="guiArw pageEndNext">&raquo;</span></div>"#
            .to_string(),
    };

    format!("<html><body><div id=\"hotels\">{containers}</div>{pagination}</body></html>")
}

pub fn detail_page(counts: [u32; 5], ratings: [f32; 6]) -> String {
    let severity: String = ["Excellent", "Very good", "Average", "Poor", "Terrible"]
        .iter()
        .zip(counts)
        .map(|(label, count)| {
            format!(
                r#"<div class="wrap row"><span class="text">{label}</span><span class="compositeCount">{count}</span></div>"#
            )
        })
        .collect();
    let travelers: String = ["Families", "Couples", "Solo", "Business"]
        .iter()
        .zip([120, 340, 56, 78])
        .map(|(label, value)| {
            format!(
                r#"<div class="filter_connection_wrapper"><label>{label}</label><div class="value">{value}</div></div>"#
            )
        })
        .collect();
    let summary: String = ratings
        .iter()
        .map(|rating| {
            format!(r#"<li><img class="sprite-rating_s_fill" alt="{rating} of 5 stars"></li>"#)
        })
        .collect();

    format!(
        r#"<html><body><div class="content wrap trip_type_layout">
             <div class="col rating">{severity}</div>
             <div class="col segment">{travelers}</div>
             <ul class="barChart">{summary}</ul>
           </div></body></html>"#
    )
}

pub const EVEN_RATINGS: [f32; 6] = [4.0; 6];

pub fn url(path: &str) -> String {
    format!("{BASE}{path}")
}

/// A site with a city page pointing at `FIRST_PAGE`
pub fn site() -> ReplayTransport {
    ReplayTransport::new().with_page(CITY_URL, city_page(FIRST_PAGE))
}

pub fn config() -> ScraperConfig {
    ScraperConfig {
        base_url: BASE.to_string(),
        user_agent: "hotel-scraper-test/0.1".to_string(),
        request_delay: Duration::ZERO,
        retry_backoff: Duration::ZERO,
        ..ScraperConfig::default()
    }
}

pub fn finder(
    config: ScraperConfig,
    site: ReplayTransport,
) -> (HotelFinder, Arc<ReplayTransport>, Arc<MemoryPageStore>) {
    let transport = Arc::new(site);
    let store = Arc::new(MemoryPageStore::new());
    let finder = HotelFinder::new(config, transport.clone(), store.clone())
        .expect("default selectors parse");
    (finder, transport, store)
}
