//! New-show detection between two upcoming-shows listings.
//!
//! A show is identified by band, venue, date and place. Anything in the
//! latest listing whose identity is missing from the previous listing is
//! reported once, stamped with the day it was first seen.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::ExportError;
use crate::export::CsvRecord;
use crate::flatten::ShowRecord;

/// A show that was not in the previous listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowChangeRecord {
    pub date: NaiveDate,
    pub band: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub venue: Option<String>,
    pub country: Option<String>,
    pub first_seen: NaiveDate,
}

impl CsvRecord for ShowChangeRecord {
    const FIELDS: &'static [&'static str] =
        &["date", "band", "city", "state", "venue", "country", "firstSeen"];
}

impl ShowChangeRecord {
    fn new(show: &ShowRecord, first_seen: NaiveDate) -> Self {
        Self {
            date: show.date,
            band: show.band.clone(),
            city: show.city.clone(),
            state: show.state.clone(),
            venue: show.venue.clone(),
            country: show.country.clone(),
            first_seen,
        }
    }
}

type ShowKey<'a> = (
    &'a str,
    Option<&'a str>,
    NaiveDate,
    Option<&'a str>,
    Option<&'a str>,
    Option<&'a str>,
);

fn show_key(show: &ShowRecord) -> ShowKey<'_> {
    (
        show.band.as_str(),
        show.venue.as_deref(),
        show.date,
        show.city.as_deref(),
        show.state.as_deref(),
        show.country.as_deref(),
    )
}

/// Shows in `latest` that `previous` does not list, in `latest` order.
#[must_use]
pub fn new_shows(
    latest: &[ShowRecord],
    previous: &[ShowRecord],
    first_seen: NaiveDate,
) -> Vec<ShowChangeRecord> {
    let known: HashSet<ShowKey<'_>> = previous.iter().map(show_key).collect();
    latest
        .iter()
        .filter(|show| !known.contains(&show_key(show)))
        .map(|show| ShowChangeRecord::new(show, first_seen))
        .collect()
}

/// Read an upcoming-shows listing written by an earlier run.
///
/// # Errors
///
/// Returns `ExportError::Io` when the file cannot be opened (including when
/// it does not exist) and `ExportError::Csv` when a row does not parse.
#[instrument(skip(path), fields(path = %path.display()))]
pub fn read_show_listing(path: &Path) -> Result<Vec<ShowRecord>, ExportError> {
    let file = File::open(path)?;
    let shows = csv::Reader::from_reader(file)
        .deserialize()
        .collect::<Result<Vec<ShowRecord>, _>>()?;
    debug!(shows = shows.len(), "Read show listing");
    Ok(shows)
}
