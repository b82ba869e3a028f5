pub mod export;
mod parser;
pub mod rules;
pub mod scraper;
pub mod snapshot;
pub mod types;
pub mod utils;

pub use parser::ParseError;
pub use scraper::{ScrapeConfig, ScraperError, SessionTokens, WebScraper};
