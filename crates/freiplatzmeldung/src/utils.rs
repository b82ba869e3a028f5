use crate::types::Listing;

/// Joins the site root and a listing's relative URL with exactly one slash.
/// Already absolute URLs are returned unchanged.
pub fn absolute_url(root: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    format!(
        "{}/{}",
        root.trim_end_matches('/'),
        href.trim_start_matches('/')
    )
}

#[derive(Debug, PartialEq, Eq)]
pub struct ListingStats {
    pub total: usize,
    pub unknown_capacity: usize,
    pub free_places: i64,
    pub available_later: usize,
    pub without_contact: usize,
}

impl ListingStats {
    pub fn from_listings(listings: &[Listing]) -> ListingStats {
        ListingStats {
            total: listings.len(),
            unknown_capacity: listings
                .iter()
                .filter(|l| !l.summary.has_known_capacity())
                .count(),
            free_places: listings
                .iter()
                .filter(|l| l.summary.has_known_capacity())
                .map(|l| i64::from(l.summary.freie_plaetze))
                .sum(),
            available_later: listings
                .iter()
                .filter(|l| l.summary.freie_plaetze_ab.is_some())
                .count(),
            without_contact: listings
                .iter()
                .filter(|l| l.details.telefon.is_empty() && l.details.email.is_empty())
                .count(),
        }
    }
}

impl std::fmt::Display for ListingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  Listings:                    {}", self.total)?;
        writeln!(f, "  Free places (known):         {}", self.free_places)?;
        writeln!(f, "  Listings with unknown count: {}", self.unknown_capacity)?;
        writeln!(f, "  Listings free from a date:   {}", self.available_later)?;
        writeln!(f, "  Listings without contact:    {}", self.without_contact)
    }
}
