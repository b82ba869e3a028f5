use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use freiplatzmeldung::rules::{DEFAULT_OUTPUT_FILE, DEFAULT_REGION};
use freiplatzmeldung::utils::ListingStats;
use freiplatzmeldung::{ScrapeConfig, WebScraper, export, snapshot};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "freiplatzmeldung")]
#[command(about = "Scrapes freiplatzmeldungen.de listings into a CSV file", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        short = 'o',
        long = "output",
        default_value = DEFAULT_OUTPUT_FILE,
        help = "CSV file to write"
    )]
    output: PathBuf,

    #[arg(
        long,
        default_value = DEFAULT_REGION,
        help = "Region (bundesland) code sent with the search form"
    )]
    region: String,

    #[arg(
        long,
        help = "Stop after this many list pages",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    max_pages: Option<u32>,

    #[arg(
        long,
        default_value_t = 100,
        help = "Delay between detail page requests in milliseconds"
    )]
    delay_ms: u64,

    #[arg(long, help = "Write the scraped listings to this JSON file")]
    save_snapshot: Option<PathBuf>,

    #[arg(
        long,
        conflicts_with_all = ["save_snapshot", "max_pages", "region"],
        help = "Export listings from a JSON snapshot instead of scraping"
    )]
    from_snapshot: Option<PathBuf>,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let listings = if let Some(path) = &cli.from_snapshot {
        snapshot::load(path).unwrap_or_else(|e| {
            log::error!("Error loading snapshot {}: {}", path.display(), e);
            process::exit(1);
        })
    } else {
        let config = ScrapeConfig {
            region: cli.region.clone(),
            max_pages: cli.max_pages,
            detail_delay: Duration::from_millis(cli.delay_ms),
        };

        let scraper = WebScraper::new(config).unwrap_or_else(|e| {
            log::error!("Error creating scraper: {}", e);
            process::exit(1);
        });

        let listings = scraper.scrape().await.unwrap_or_else(|e| {
            log::error!("Error scraping listings: {}", e);
            process::exit(1);
        });

        if let Some(path) = &cli.save_snapshot
            && let Err(e) = snapshot::save(path, &listings)
        {
            log::error!("Error saving snapshot {}: {}", path.display(), e);
            process::exit(1);
        }

        listings
    };

    export::write_csv(&cli.output, &listings).unwrap_or_else(|e| {
        log::error!("Error writing {}: {}", cli.output.display(), e);
        process::exit(1);
    });

    print!("{}", ListingStats::from_listings(&listings));
}
