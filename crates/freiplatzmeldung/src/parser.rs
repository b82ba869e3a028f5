use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;

use crate::rules::{self, detail, pagination, summary};
use crate::types::{ListingDetails, ListingSummary, UNKNOWN_CAPACITY};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Failed to parse date: {0}")]
    DateParse(String),
    #[error("Malformed search response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Pagination control not found: {0}")]
    Pagination(String),
}

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("invalid selector in extraction rules")
}

static RE_LAST_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(pagination::TITLE_PATTERN).expect("invalid regex: last page title")
});

static SEL_LAST_PAGE: LazyLock<Selector> = LazyLock::new(|| sel(pagination::LAST_PAGE_LINK));
static SEL_LABEL_VALUE: LazyLock<Selector> = LazyLock::new(|| sel(rules::LABEL_VALUE));

static SEL_CONTAINER: LazyLock<Selector> = LazyLock::new(|| sel(summary::CONTAINER));
static SEL_TITLE: LazyLock<Selector> = LazyLock::new(|| sel(summary::TITLE));
static SEL_CAPACITY: LazyLock<Selector> = LazyLock::new(|| sel(summary::CAPACITY));
static SEL_AVAILABLE_FROM: LazyLock<Selector> = LazyLock::new(|| sel(summary::AVAILABLE_FROM));
static SEL_UPDATED: LazyLock<Selector> = LazyLock::new(|| sel(summary::UPDATED));
static SEL_COMMENT: LazyLock<Selector> = LazyLock::new(|| sel(summary::COMMENT));
static SEL_LINK: LazyLock<Selector> = LazyLock::new(|| sel(summary::LINK));

static SEL_SUPPLEMENTARY: LazyLock<Selector> =
    LazyLock::new(|| sel(detail::SUPPLEMENTARY_BLOCK));
static SEL_CONTACT: LazyLock<Selector> = LazyLock::new(|| sel(detail::CONTACT_BLOCK));
static SEL_MAP: LazyLock<Selector> = LazyLock::new(|| sel(detail::MAP_BLOCK));
static SEL_MAP_ADDRESS: LazyLock<Selector> = LazyLock::new(|| sel(detail::MAP_ADDRESS));
static SEL_DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| sel(detail::DESCRIPTION_BLOCK));
static SEL_DESCRIPTION_TEXT: LazyLock<Selector> =
    LazyLock::new(|| sel(detail::DESCRIPTION_TEXT));
static SEL_FOOTER_ICONS: LazyLock<Selector> = LazyLock::new(|| sel(detail::FOOTER_ICONS));
static SEL_HOMEPAGE: LazyLock<Selector> = LazyLock::new(|| sel(detail::HOMEPAGE_LINK));

/// Envelope returned by the search endpoint: `{"content": {"content": "<html>"}}`.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    content: SearchContent,
}

#[derive(Debug, Deserialize)]
struct SearchContent {
    content: String,
}

fn elem_text(element: ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn missing(field: &str) -> ParseError {
    ParseError::MissingField(field.to_string())
}

fn strip_label(text: &str) -> &str {
    text.trim().trim_end_matches(':').trim_end()
}

fn label_matches(text: &str, label: &str) -> bool {
    strip_label(text) == strip_label(label)
}

/// First element after `start` in document order (descendants included) that
/// matches `selector`.
fn following<'a>(
    document: &'a Html,
    start: ElementRef<'a>,
    selector: &Selector,
) -> Option<ElementRef<'a>> {
    let start_id = start.id();
    document
        .tree
        .root()
        .descendants()
        .skip_while(|node| node.id() != start_id)
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|element| selector.matches(element))
}

/// Looks up the first text node inside `scope` equal to one of `labels` and
/// returns the text of the next `dd` after it within the same scope.
fn label_value(scope: ElementRef, labels: &[&str]) -> Option<String> {
    let mut nodes = scope.descendants().skip_while(|node| {
        !node
            .value()
            .as_text()
            .is_some_and(|text| labels.iter().any(|label| label_matches(text, label)))
    });
    nodes.next()?;

    nodes
        .filter_map(ElementRef::wrap)
        .find(|element| SEL_LABEL_VALUE.matches(element))
        .map(elem_text)
}

fn required_label(scope: ElementRef, label: &str) -> Result<String, ParseError> {
    label_value(scope, &[label]).ok_or_else(|| missing(label))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits the concatenated aid-type text, e.g.
/// `"(§ 27) Hilfe zur Erziehung(§ 34) Heimerziehung"`, into one entry per
/// parenthesized paragraph.
pub fn split_hilfeform(raw: &str) -> Vec<String> {
    raw.trim()
        .split('(')
        .filter(|fragment| !fragment.trim().is_empty())
        .map(|fragment| normalize_whitespace(&format!("({fragment}").replace(')', ") ")))
        .collect()
}

pub fn parse_search_response(body: &str) -> Result<String, ParseError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response.content.content)
}

/// Reads the page count from the "Gehe zu Seite N" link of the first page.
pub fn parse_last_page(fragment: &str) -> Result<u32, ParseError> {
    let document = Html::parse_fragment(fragment);

    let title = document
        .select(&SEL_LAST_PAGE)
        .find_map(|link| link.value().attr("title"))
        .ok_or_else(|| ParseError::Pagination(pagination::LAST_PAGE_LINK.to_string()))?;

    let caps = RE_LAST_PAGE
        .captures(title)
        .ok_or_else(|| ParseError::Pagination(format!("Unexpected link title: {}", title)))?;

    caps[1]
        .parse::<u32>()
        .ok()
        .filter(|&last| last > 0)
        .ok_or_else(|| ParseError::Pagination(format!("Invalid page number: {}", &caps[1])))
}

pub fn parse_listing_summaries(fragment: &str) -> Result<Vec<ListingSummary>, ParseError> {
    let document = Html::parse_fragment(fragment);

    document
        .select(&SEL_CONTAINER)
        .map(parse_listing_summary)
        .collect()
}

fn parse_capacity(container: ElementRef) -> Result<i32, ParseError> {
    let element = container
        .select(&SEL_CAPACITY)
        .next()
        .ok_or_else(|| missing("freie_plaetze"))?;

    if element.value().attr(summary::CAPACITY_ICON_ATTR).is_some() {
        return Ok(UNKNOWN_CAPACITY);
    }

    let text = elem_text(element);
    Ok(text.parse::<i32>().unwrap_or_else(|_| {
        log::warn!("Illegible capacity '{}', recording as unknown", text);
        UNKNOWN_CAPACITY
    }))
}

fn parse_listing_summary(container: ElementRef) -> Result<ListingSummary, ParseError> {
    let angebotstitel = container
        .select(&SEL_TITLE)
        .next()
        .map(elem_text)
        .ok_or_else(|| missing("angebotstitel"))?;

    let freie_plaetze = parse_capacity(container)?;

    let freie_plaetze_ab = container
        .select(&SEL_AVAILABLE_FROM)
        .next()
        .map(elem_text)
        .and_then(|text| NaiveDate::parse_from_str(&text, summary::AVAILABLE_FROM_FORMAT).ok());

    let updated = container
        .select(&SEL_UPDATED)
        .next()
        .map(elem_text)
        .ok_or_else(|| missing("aktualisiert_am"))?;
    let aktualisiert_am = NaiveDate::parse_from_str(&updated, summary::UPDATED_FORMAT)
        .map_err(|_| ParseError::DateParse(format!("Invalid update stamp: {}", updated)))?;

    let traeger = required_label(container, summary::LABEL_OPERATOR)?;
    let alter = required_label(container, summary::LABEL_AGE)?;
    let geschlecht = required_label(container, summary::LABEL_GENDER)?;

    let hilfeform = label_value(container, &[summary::LABEL_AID_TYPE])
        .map(|value| split_hilfeform(&value))
        .unwrap_or_default();

    let einsatzgebiet_standort = label_value(container, &summary::LABELS_SERVICE_AREA)
        .map(|value| split_list(&value))
        .unwrap_or_default();

    let projektausrichtung = label_value(container, &[summary::LABEL_ORIENTATION])
        .map(|value| split_list(&value))
        .unwrap_or_default();

    let kommentarfeld = container
        .select(&SEL_COMMENT)
        .next()
        .map(elem_text)
        .unwrap_or_default();

    let href = container
        .select(&SEL_LINK)
        .find_map(|link| link.value().attr("href"))
        .map(str::to_string)
        .ok_or_else(|| missing("href"))?;

    Ok(ListingSummary {
        angebotstitel,
        freie_plaetze,
        freie_plaetze_ab,
        kommentarfeld,
        traeger,
        hilfeform,
        projektausrichtung,
        alter,
        einsatzgebiet_standort,
        geschlecht,
        aktualisiert_am,
        href,
    })
}

fn or_empty(value: Option<String>, field: &str) -> String {
    value.unwrap_or_else(|| {
        log::debug!("Detail field '{}' not present, leaving empty", field);
        String::new()
    })
}

fn block_label(block: Option<ElementRef>, label: &str) -> Option<String> {
    block.and_then(|block| label_value(block, &[label]))
}

fn block_following<'a>(
    document: &'a Html,
    block: &Selector,
    target: &Selector,
) -> Option<ElementRef<'a>> {
    document
        .select(block)
        .next()
        .and_then(|block| following(document, block, target))
}

/// Extracts the detail page fields. Every field is looked up on its own; a
/// missing block or label leaves only that field empty.
pub fn parse_listing_details(html: &str) -> ListingDetails {
    let document = Html::parse_document(html);

    let supplementary = document.select(&SEL_SUPPLEMENTARY).next();
    let contact = document.select(&SEL_CONTACT).next();

    ListingDetails {
        betreuungsumfang: or_empty(
            block_label(supplementary, detail::LABEL_CARE_SCOPE),
            "betreuungsumfang",
        ),
        gesamtkapazitaet: or_empty(
            block_label(supplementary, detail::LABEL_TOTAL_CAPACITY),
            "gesamtkapazitaet",
        ),
        geschlecht_allgemein: or_empty(
            block_label(supplementary, detail::LABEL_GENERAL_GENDER),
            "geschlecht_allgemein",
        ),
        kostensatz: or_empty(
            block_label(supplementary, detail::LABEL_COST_RATE),
            "kostensatz",
        ),
        betriebserlaubnis: or_empty(
            block_label(supplementary, detail::LABEL_PERMIT),
            "betriebserlaubnis",
        ),
        projektleiter_in: or_empty(
            block_label(contact, detail::LABEL_PROJECT_LEAD),
            "projektleiter_in",
        ),
        telefon: or_empty(
            block_label(contact, detail::LABEL_PHONE),
            "telefon",
        ),
        telefon_mobil: or_empty(
            block_label(contact, detail::LABEL_MOBILE),
            "telefon_mobil",
        ),
        telefax: or_empty(
            block_label(contact, detail::LABEL_FAX),
            "telefax",
        ),
        email: or_empty(
            block_label(contact, detail::LABEL_EMAIL),
            "email",
        ),
        homepage: or_empty(
            block_following(&document, &SEL_FOOTER_ICONS, &SEL_HOMEPAGE)
                .and_then(|link| link.value().attr("href"))
                .map(str::to_string),
            "homepage",
        ),
        standort: or_empty(
            block_following(&document, &SEL_MAP, &SEL_MAP_ADDRESS).map(elem_text),
            "standort",
        ),
        kurzbeschreibung: or_empty(
            block_following(&document, &SEL_DESCRIPTION, &SEL_DESCRIPTION_TEXT).map(elem_text),
            "kurzbeschreibung",
        ),
    }
}
