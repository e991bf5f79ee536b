//! # Run Reports
//!
//! Renders an [`AggregatedResult`] for humans or machines.
//!
//! ## Table layout
//!
//! One row per hotel, ordered by name:
//! - **Name**: truncated to [`NAME_WIDTH`] characters
//! - **Stars** and **Reviews**: `-` when the listing did not show them
//! - **Buckets**: the five severity counts, excellent to terrible
//! - **Avg**: the weighted average, two decimals
//! - **Sub-ratings**: sleep, location, rooms, service, value, cleanliness
//!
//! Failures follow in their own section, one line per identifier.

use std::fmt::Write;

use serde::Serialize;

use crate::models::{AggregatedResult, HotelReport};

/// Widest hotel name shown before truncation
pub const NAME_WIDTH: usize = 32;

const HEADER: [&str; 14] = [
    "Stars", "Reviews", "Exc", "VGood", "Avg", "Poor", "Terr", "Score", "Sleep", "Loc", "Rooms",
    "Serv", "Value", "Clean",
];
const COLUMN_WIDTH: usize = 7;

/// Render the result as a fixed-width text table followed by a failures section.
pub fn render_table(result: &AggregatedResult) -> String {
    let mut out = String::new();

    let _ = write!(out, "{:<NAME_WIDTH$}", "Hotel");
    for title in HEADER {
        let _ = write!(out, " {title:>COLUMN_WIDTH$}");
    }
    out.push('\n');
    out.push_str(&"-".repeat(NAME_WIDTH + HEADER.len() * (COLUMN_WIDTH + 1)));
    out.push('\n');

    for (name, report) in &result.hotels {
        out.push_str(&table_row(name, report));
        out.push('\n');
    }

    if result.hotels.is_empty() {
        out.push_str("(no hotels)\n");
    }

    if !result.failures.is_empty() {
        let _ = writeln!(out, "\nFailures ({}):", result.failures.len());
        for (name, err) in &result.failures {
            let _ = writeln!(out, "  {name}: {err}");
        }
    }

    out
}

/// Render a result, or a whole run outcome, as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

fn table_row(name: &str, report: &HotelReport) -> String {
    let listing = &report.listing;
    let mut cells = Vec::with_capacity(HEADER.len());

    cells.push(
        listing
            .stars
            .map_or_else(|| "-".to_string(), |stars| stars.to_string()),
    );
    cells.push(
        listing
            .review_count
            .map_or_else(|| "-".to_string(), |count| count.to_string()),
    );
    cells.extend(
        report
            .detail
            .breakdown
            .counts()
            .iter()
            .map(ToString::to_string),
    );
    cells.push(format!("{:.2}", report.average_score));
    cells.extend(
        report
            .detail
            .scores
            .ratings()
            .iter()
            .map(ToString::to_string),
    );

    let mut row = format!("{:<NAME_WIDTH$}", truncate(name, NAME_WIDTH));
    for cell in cells {
        let _ = write!(row, " {cell:>COLUMN_WIDTH$}");
    }
    row
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        return name.to_string();
    }
    let mut short: String = name.chars().take(width - 1).collect();
    short.push('~');
    short
}
