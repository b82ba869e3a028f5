use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Capacity value used when the portal renders the number as an icon.
pub const UNKNOWN_CAPACITY: i32 = -1;

/// Fields available directly on a list page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSummary {
    pub angebotstitel: String,
    pub freie_plaetze: i32,
    pub freie_plaetze_ab: Option<NaiveDate>,
    pub kommentarfeld: String,
    pub traeger: String,
    pub hilfeform: Vec<String>,
    pub projektausrichtung: Vec<String>,
    pub alter: String,
    pub einsatzgebiet_standort: Vec<String>,
    pub geschlecht: String,
    pub aktualisiert_am: NaiveDate,
    /// Relative URL of the detail page. Unique per listing.
    pub href: String,
}

impl ListingSummary {
    pub fn has_known_capacity(&self) -> bool {
        self.freie_plaetze != UNKNOWN_CAPACITY
    }
}

impl Display for ListingSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let capacity = if self.has_known_capacity() {
            self.freie_plaetze.to_string()
        } else {
            "?".to_string()
        };
        write!(
            f,
            "[{}] {} - {} ({} frei)",
            self.aktualisiert_am, self.angebotstitel, self.traeger, capacity
        )
    }
}

/// Fields scraped from a listing's own page. Empty when the page omits them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingDetails {
    pub betreuungsumfang: String,
    pub gesamtkapazitaet: String,
    pub geschlecht_allgemein: String,
    pub kostensatz: String,
    pub betriebserlaubnis: String,
    pub projektleiter_in: String,
    pub telefon: String,
    pub telefon_mobil: String,
    pub telefax: String,
    pub email: String,
    pub homepage: String,
    pub standort: String,
    pub kurzbeschreibung: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub summary: ListingSummary,
    pub details: ListingDetails,
}

impl Listing {
    pub fn new(summary: ListingSummary, details: ListingDetails) -> Self {
        Self { summary, details }
    }
}
