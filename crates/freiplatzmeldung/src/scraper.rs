use crate::parser::{
    ParseError, parse_last_page, parse_listing_details, parse_listing_summaries,
    parse_search_response,
};
use crate::rules;
use crate::types::{Listing, ListingDetails, ListingSummary};
use crate::utils::absolute_url;

use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, COOKIE, ORIGIN, REFERER, SET_COOKIE};
use std::collections::HashSet;
use std::time::Duration;

const XHR_ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";
const DOCUMENT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_GERMAN: &str = "de-DE,de;q=0.8";

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
    #[error("Session cookie '{0}' missing from response")]
    MissingCookie(String),
}

/// CSRF token and PHP session id handed out by the listing page. Every
/// later request carries both as a cookie header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    csrf_token: String,
    session_id: String,
}

impl SessionTokens {
    pub fn new(csrf_token: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            csrf_token: csrf_token.into(),
            session_id: session_id.into(),
        }
    }

    /// Builds the tokens from raw `Set-Cookie` header values. Later headers
    /// override earlier ones with the same cookie name.
    pub fn from_set_cookie<'a>(
        headers: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ScraperError> {
        let mut csrf_token = None;
        let mut session_id = None;

        for header in headers {
            let Some((name, value)) = header
                .split(';')
                .next()
                .and_then(|pair| pair.split_once('='))
            else {
                continue;
            };

            match name.trim() {
                rules::CSRF_COOKIE => csrf_token = Some(value.trim().to_string()),
                rules::SESSION_COOKIE => session_id = Some(value.trim().to_string()),
                _ => {}
            }
        }

        Ok(Self {
            csrf_token: csrf_token
                .ok_or_else(|| ScraperError::MissingCookie(rules::CSRF_COOKIE.to_string()))?,
            session_id: session_id
                .ok_or_else(|| ScraperError::MissingCookie(rules::SESSION_COOKIE.to_string()))?,
        })
    }

    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn cookie_header(&self) -> String {
        format!(
            "{}={}; {}={}",
            rules::CSRF_COOKIE,
            self.csrf_token,
            rules::SESSION_COOKIE,
            self.session_id
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeConfig {
    /// `bundesland` code sent with the search form.
    pub region: String,
    pub max_pages: Option<u32>,
    /// Pause between two detail page requests.
    pub detail_delay: Duration,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            region: rules::DEFAULT_REGION.to_string(),
            max_pages: None,
            detail_delay: Duration::from_millis(100),
        }
    }
}

/// Form fields of the search request. Everything except the region is left
/// unfiltered.
pub fn list_payload(region: &str) -> Vec<(&'static str, String)> {
    let form_url = rules::LISTING_PAGE_PATH.trim_start_matches('/').to_string();
    vec![
        ("REAL_URL", form_url.clone()),
        ("changed_element", "ctrl_bundesland".to_string()),
        ("FORM_URL", form_url),
        ("FORM_SUBMIT", "Sin_form_offer_id_".to_string()),
        ("REQUEST_TOKEN", String::new()),
        ("sozialer_bereich", "1".to_string()),
        ("country", "DE".to_string()),
        ("bundesland", region.to_string()),
        ("landkreis", "0".to_string()),
        ("hilfeform", String::new()),
        ("projektausrichtung", String::new()),
        ("kapazitaet_sex", String::new()),
        ("search_alter", String::new()),
        ("stichwort", String::new()),
    ]
}

fn pages_to_fetch(last_page: u32, max_pages: Option<u32>) -> u32 {
    match max_pages {
        Some(cap) => last_page.min(cap),
        None => last_page,
    }
}

/// Flattens parsed pages in page order, then in-page order. Only the first
/// listing per `href` is kept.
fn collect_unique(pages: impl IntoIterator<Item = Vec<ListingSummary>>) -> Vec<ListingSummary> {
    let mut seen = HashSet::new();
    let mut summaries = Vec::new();

    for summary in pages.into_iter().flatten() {
        if seen.insert(summary.href.clone()) {
            summaries.push(summary);
        } else {
            log::warn!("Skipping duplicate listing {}", summary.href);
        }
    }

    summaries
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    base_url: String,
    config: ScrapeConfig,
}

impl WebScraper {
    pub fn new(config: ScrapeConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            base_url: rules::SITE_ROOT.to_string(),
            config,
        })
    }

    fn listing_page_url(&self) -> String {
        format!("{}{}", self.base_url, rules::LISTING_PAGE_PATH)
    }

    /// Runs the whole pipeline: session bootstrap, every list page, then one
    /// detail request per listing.
    pub async fn scrape(&self) -> Result<Vec<Listing>, ScraperError> {
        let tokens = self.bootstrap_session().await?;
        let summaries = self.fetch_summaries(&tokens).await?;
        self.enrich(&tokens, summaries).await
    }

    pub async fn bootstrap_session(&self) -> Result<SessionTokens, ScraperError> {
        let url = self.listing_page_url();
        log::info!("Requesting session cookies from {}...", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?;

        SessionTokens::from_set_cookie(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok()),
        )
    }

    /// Returns the HTML fragment of one search result page.
    pub async fn fetch_list_page(
        &self,
        tokens: &SessionTokens,
        page: u32,
    ) -> Result<String, ScraperError> {
        let url = format!(
            "{}{}&page={}",
            self.base_url,
            rules::SEARCH_ENDPOINT_PATH,
            page
        );
        log::debug!("Fetching list page {}: {}", page, url);

        let body = self
            .client
            .post(&url)
            .header(ACCEPT, XHR_ACCEPT)
            .header(ACCEPT_LANGUAGE, ACCEPT_GERMAN)
            .header(COOKIE, tokens.cookie_header())
            .header(ORIGIN, self.base_url.as_str())
            .header(REFERER, self.listing_page_url())
            .header("X-Requested-With", "XMLHttpRequest")
            .form(&list_payload(&self.config.region))
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;

        Ok(parse_search_response(&body)?)
    }

    /// Fetches pages 1 through the last page announced by page 1 and parses
    /// them into summaries, in page order.
    pub async fn fetch_summaries(
        &self,
        tokens: &SessionTokens,
    ) -> Result<Vec<ListingSummary>, ScraperError> {
        let first_page = self.fetch_list_page(tokens, 1).await?;
        let last_page = parse_last_page(&first_page)?;
        let pages = pages_to_fetch(last_page, self.config.max_pages);
        if pages < last_page {
            log::info!("Limiting run to {} of {} pages", pages, last_page);
        }

        let mut pages_parsed = Vec::with_capacity(pages as usize);
        let mut fragment = first_page;

        for page in 1..=pages {
            if page > 1 {
                fragment = self.fetch_list_page(tokens, page).await?;
            }
            pages_parsed.push(parse_listing_summaries(&fragment)?);
            log::info!("Progress: {:03}/{} pages done", page, pages);
        }

        Ok(collect_unique(pages_parsed))
    }

    pub async fn fetch_listing_details(
        &self,
        tokens: &SessionTokens,
        summary: &ListingSummary,
    ) -> Result<ListingDetails, ScraperError> {
        let url = absolute_url(&self.base_url, &summary.href);
        log::debug!("Fetching listing details: {}", url);

        let html = self
            .client
            .get(&url)
            .header(ACCEPT, DOCUMENT_ACCEPT)
            .header(ACCEPT_LANGUAGE, ACCEPT_GERMAN)
            .header(COOKIE, tokens.cookie_header())
            .header(REFERER, self.listing_page_url())
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "same-origin")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;

        Ok(parse_listing_details(&html))
    }

    /// Fetches the detail page of every summary, one at a time with the
    /// configured delay between requests.
    pub async fn enrich(
        &self,
        tokens: &SessionTokens,
        summaries: Vec<ListingSummary>,
    ) -> Result<Vec<Listing>, ScraperError> {
        let total = summaries.len();
        let mut listings = Vec::with_capacity(total);

        for (index, summary) in summaries.into_iter().enumerate() {
            if index > 0 && !self.config.detail_delay.is_zero() {
                tokio::time::sleep(self.config.detail_delay).await;
            }

            let details = self.fetch_listing_details(tokens, &summary).await?;
            log::info!("Enriched {}/{}: {}", index + 1, total, summary);
            listings.push(Listing::new(summary, details));
        }

        Ok(listings)
    }
}
