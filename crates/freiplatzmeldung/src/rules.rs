//! Site-specific coupling to freiplatzmeldungen.de.
//!
//! Every label text, CSS selector, cookie name and URL path the scraper relies
//! on is collected here, so a markup change on the portal is a one-file edit.

pub const SITE_ROOT: &str = "https://freiplatzmeldungen.de";
pub const LISTING_PAGE_PATH: &str = "/kinder-jugendliche-und-familien.html";
pub const SEARCH_ENDPOINT_PATH: &str =
    "/ajax.php?action=fmd&id=29&use=searchform_update&pageId=40";

pub const CSRF_COOKIE: &str = "csrf_https-contao_csrf_token";
pub const SESSION_COOKIE: &str = "PHPSESSID";

/// Berlin.
pub const DEFAULT_REGION: &str = "16";

pub const DEFAULT_OUTPUT_FILE: &str = "freiplatzmeldungen.csv";

pub mod pagination {
    pub const LAST_PAGE_LINK: &str = "a.last";
    pub const TITLE_PATTERN: &str = r"(?i)gehe\s+zu\s+seite\s+(\d+)";
}

pub mod summary {
    pub const CONTAINER: &str = ".container_offer.halfbox";
    pub const TITLE: &str = "h2.offertitle";
    pub const CAPACITY: &str = ".big-number";
    pub const CAPACITY_ICON_ATTR: &str = "alt";
    pub const AVAILABLE_FROM: &str = "span.green";
    pub const AVAILABLE_FROM_FORMAT: &str = "ab %d.%m.%Y";
    pub const UPDATED: &str = ".aktualisiert_am";
    pub const UPDATED_FORMAT: &str = "aktualisiert am %d.%m.%Y";
    pub const COMMENT: &str = "p.kommentarfeld";
    pub const LINK: &str = "div.offerlink.offer_footer.is_closed a[href]";

    pub const LABEL_AID_TYPE: &str = "Hilfeform:";
    pub const LABEL_OPERATOR: &str = "Träger:";
    pub const LABEL_AGE: &str = "Alter:";
    pub const LABEL_GENDER: &str = "Geschlecht:";
    pub const LABEL_ORIENTATION: &str = "Projektausrichtung";
    pub const LABELS_SERVICE_AREA: [&str; 2] = ["Einsatzgebiet:", "Standort:"];
}

pub mod detail {
    pub const SUPPLEMENTARY_BLOCK: &str = ".infoblock.zusatzinfos";
    pub const LABEL_CARE_SCOPE: &str = "Betreuungsumfang:";
    pub const LABEL_GENERAL_GENDER: &str = "Geschlecht allgemein:";
    pub const LABEL_TOTAL_CAPACITY: &str = "Gesamtkapazität:";
    pub const LABEL_COST_RATE: &str = "Kostensatz:";
    pub const LABEL_PERMIT: &str = "Betriebserlaubnis:";

    pub const CONTACT_BLOCK: &str = ".infoblock.kontaktdaten";
    pub const LABEL_PROJECT_LEAD: &str = "Projektleiter_in";
    pub const LABEL_PHONE: &str = "Telefon";
    pub const LABEL_MOBILE: &str = "Mobile Nummer";
    pub const LABEL_FAX: &str = "Telefax";
    pub const LABEL_EMAIL: &str = "E-Mail";

    pub const MAP_BLOCK: &str = ".infoblock.map";
    pub const MAP_ADDRESS: &str = "div.margin_10_bottom";

    pub const DESCRIPTION_BLOCK: &str = ".infoblock.kurzbeschreibung";
    pub const DESCRIPTION_TEXT: &str = "dd.margin_10_bottom";

    pub const FOOTER_ICONS: &str = ".footericons_wrapper";
    pub const HOMEPAGE_LINK: &str = "a.icon_link";
}

/// Element holding the value that belongs to a preceding label text node.
pub const LABEL_VALUE: &str = "dd";
