//! JSON dumps of scraped listings, so an export can be rerun without
//! hitting the portal again.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::types::Listing;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn save(path: impl AsRef<Path>, listings: &[Listing]) -> Result<(), SnapshotError> {
    let path = path.as_ref();
    log::info!("Saving {} listings to {}", listings.len(), path.display());

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, listings)?;
    writer.flush()?;
    Ok(())
}

pub fn load(path: impl AsRef<Path>) -> Result<Vec<Listing>, SnapshotError> {
    let path = path.as_ref();
    let listings: Vec<Listing> = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    log::info!("Loaded {} listings from {}", listings.len(), path.display());
    Ok(listings)
}
