use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hotel_scraper::report::{render_json, render_table};
use hotel_scraper::traits::DEFAULT_BASE_URL;
use hotel_scraper::{FilePageStore, HotelFinder, ReqwestTransport, ScraperConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Scrape hotel listings and review breakdowns for a city")]
struct Args {
    /// City to scrape, e.g. "Boston"
    #[arg(long, env = "HOTEL_SCRAPER_CITY")]
    city: String,

    /// State or region of the city, e.g. "MA"
    #[arg(long, env = "HOTEL_SCRAPER_STATE")]
    state: String,

    /// Directory every fetched page is saved to
    #[arg(long, env = "HOTEL_SCRAPER_DATADIR", default_value = "data/")]
    datadir: PathBuf,

    /// Listing pages to walk
    #[arg(long, env = "HOTEL_SCRAPER_MAX_PAGES", default_value_t = 1)]
    max_pages: usize,

    /// Detail pages resolved at once
    #[arg(long, env = "HOTEL_SCRAPER_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Minimum delay between two requests, in milliseconds
    #[arg(long, env = "HOTEL_SCRAPER_DELAY_MS", default_value_t = 2000)]
    delay_ms: u64,

    /// Extra attempts for a request that failed at the transport level
    #[arg(long, env = "HOTEL_SCRAPER_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    #[arg(long, env = "HOTEL_SCRAPER_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, value_enum, env = "HOTEL_SCRAPER_FORMAT", default_value = "table")]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn scraper_config(&self) -> ScraperConfig {
        ScraperConfig {
            base_url: self.base_url.clone(),
            request_delay: Duration::from_millis(self.delay_ms),
            max_pages: self.max_pages,
            detail_concurrency: self.concurrency.max(1),
            max_retries: self.max_retries,
            ..ScraperConfig::default()
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "hotel_scraper=debug"
    } else {
        "hotel_scraper=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_logging(args.verbose);

    info!("Starting hotel scraper for {}, {}", args.city, args.state);

    let store = FilePageStore::new(&args.datadir)
        .await
        .with_context(|| format!("Failed to prepare data directory {}", args.datadir.display()))?;
    let transport =
        ReqwestTransport::new(Duration::from_secs(30)).context("Failed to build HTTP client")?;

    let finder = HotelFinder::new(args.scraper_config(), Arc::new(transport), Arc::new(store))
        .context("Invalid scraper configuration")?;

    let outcome = finder.scrape(&args.city, &args.state).await;

    match args.format {
        OutputFormat::Table => {
            print!("{}", render_table(&outcome.result));
            if let Some(failure) = &outcome.aborted {
                println!("\nRun aborted while {}: {}", failure.stage, failure.error);
            }
        }
        OutputFormat::Json => {
            println!("{}", render_json(&outcome).context("Failed to serialize results")?);
        }
    }

    if outcome.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(
            "Run incomplete: {} failures{}",
            outcome.result.failures.len(),
            if outcome.aborted.is_some() { ", aborted" } else { "" }
        );
        Ok(ExitCode::FAILURE)
    }
}
