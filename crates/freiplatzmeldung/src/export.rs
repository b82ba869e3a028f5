//! CSV export of enriched listings.
//!
//! One header row, one row per listing, no index column. Multi-valued fields
//! are joined with `;` and phone numbers carry a leading `'` so spreadsheet
//! applications keep them as text.

use std::io;
use std::path::Path;

use chrono::NaiveDate;

use crate::rules::SITE_ROOT;
use crate::types::Listing;
use crate::utils::absolute_url;

pub const COLUMNS: [&str; 25] = [
    "angebotstitel",
    "freie_plaetze",
    "freie_plaetze_ab",
    "aktualisiert_am",
    "traeger",
    "hilfeform",
    "projektausrichtung",
    "alter",
    "einsatzgebiet_standort",
    "geschlecht",
    "kommentarfeld",
    "url",
    "betreuungsumfang",
    "gesamtkapazitaet",
    "geschlecht_allgemein",
    "kostensatz",
    "betriebserlaubnis",
    "projektleiter_in",
    "telefon",
    "telefon_mobil",
    "telefax",
    "email",
    "homepage",
    "standort",
    "kurzbeschreibung",
];

pub const TEXT_MARKER: char = '\'';
const LIST_SEPARATOR: &str = ";";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn as_text(phone: &str) -> String {
    if phone.is_empty() {
        String::new()
    } else {
        format!("{}{}", TEXT_MARKER, phone)
    }
}

/// Cells of one listing in [`COLUMNS`] order.
pub fn listing_row(root: &str, listing: &Listing) -> [String; 25] {
    let s = &listing.summary;
    let d = &listing.details;
    [
        s.angebotstitel.clone(),
        s.freie_plaetze.to_string(),
        format_date(s.freie_plaetze_ab),
        format_date(Some(s.aktualisiert_am)),
        s.traeger.clone(),
        s.hilfeform.join(LIST_SEPARATOR),
        s.projektausrichtung.join(LIST_SEPARATOR),
        s.alter.clone(),
        s.einsatzgebiet_standort.join(LIST_SEPARATOR),
        s.geschlecht.clone(),
        s.kommentarfeld.clone(),
        absolute_url(root, &s.href),
        d.betreuungsumfang.clone(),
        d.gesamtkapazitaet.clone(),
        d.geschlecht_allgemein.clone(),
        d.kostensatz.clone(),
        d.betriebserlaubnis.clone(),
        d.projektleiter_in.clone(),
        as_text(&d.telefon),
        as_text(&d.telefon_mobil),
        as_text(&d.telefax),
        d.email.clone(),
        d.homepage.clone(),
        d.standort.clone(),
        d.kurzbeschreibung.clone(),
    ]
}

pub fn write_listings<W: io::Write>(writer: W, listings: &[Listing]) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(COLUMNS)?;
    for listing in listings {
        csv.write_record(listing_row(SITE_ROOT, listing))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_csv(path: impl AsRef<Path>, listings: &[Listing]) -> Result<(), ExportError> {
    let path = path.as_ref();
    log::info!("Writing {} listings to {}", listings.len(), path.display());
    let file = std::fs::File::create(path)?;
    write_listings(io::BufWriter::new(file), listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ListingDetails, ListingSummary};

    fn listing(title: &str, href: &str, telefon: &str, telefax: &str) -> Listing {
        Listing::new(
            ListingSummary {
                angebotstitel: title.to_string(),
                freie_plaetze: 2,
                freie_plaetze_ab: NaiveDate::from_ymd_opt(2024, 4, 1),
                kommentarfeld: String::new(),
                traeger: "Jugendhilfe e.V.".to_string(),
                hilfeform: vec![
                    "(§ 34) Heimerziehung".to_string(),
                    "(§ 35a) Eingliederungshilfe".to_string(),
                ],
                projektausrichtung: vec!["Therapeutisch".to_string()],
                alter: "6-14 Jahre".to_string(),
                einsatzgebiet_standort: vec!["Berlin-Mitte".to_string(), "Berlin-Pankow".to_string()],
                geschlecht: "gemischt".to_string(),
                aktualisiert_am: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                href: href.to_string(),
            },
            ListingDetails {
                telefon: telefon.to_string(),
                telefax: telefax.to_string(),
                email: "info@example.org".to_string(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_write_two_listings() {
        let listings = vec![
            listing("Wohngruppe A", "freiplatzmeldungen/a.html", "030 111", "030 112"),
            listing("Wohngruppe B", "/freiplatzmeldungen/b.html", "0170 222", ""),
        ];

        let mut buf = Vec::new();
        write_listings(&mut buf, &listings).expect("Failed to write CSV");
        let output = String::from_utf8(buf).unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], COLUMNS.join(","));

        let mut reader = csv::Reader::from_reader(output.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        let col = |name: &str| COLUMNS.iter().position(|c| *c == name).unwrap();

        assert_eq!(&rows[0][col("angebotstitel")], "Wohngruppe A");
        assert_eq!(&rows[0][col("telefon")], "'030 111");
        assert_eq!(&rows[0][col("telefax")], "'030 112");
        assert_eq!(&rows[1][col("telefon")], "'0170 222");
        assert_eq!(&rows[1][col("telefax")], "");
        assert_eq!(
            &rows[1][col("url")],
            "https://freiplatzmeldungen.de/freiplatzmeldungen/b.html"
        );
        assert_eq!(&rows[0][col("freie_plaetze_ab")], "2024-04-01");
        assert_eq!(&rows[0][col("aktualisiert_am")], "2024-03-01");
        assert_eq!(
            &rows[0][col("hilfeform")],
            "(§ 34) Heimerziehung;(§ 35a) Eingliederungshilfe"
        );
        assert_eq!(
            &rows[0][col("einsatzgebiet_standort")],
            "Berlin-Mitte;Berlin-Pankow"
        );
    }

    #[test]
    fn test_empty_export_has_header_only() {
        let mut buf = Vec::new();
        write_listings(&mut buf, &[]).expect("Failed to write CSV");
        assert_eq!(String::from_utf8(buf).unwrap(), format!("{}\n", COLUMNS.join(",")));
    }

    #[test]
    fn test_write_csv_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("freiplatzmeldungen.csv");

        write_csv(&path, &[listing("A", "a.html", "", "")]).expect("Failed to write file");

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("https://freiplatzmeldungen.de/a.html"));
    }
}
