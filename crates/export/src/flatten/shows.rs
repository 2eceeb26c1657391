use atvenu_export_core::{Account, DateRange};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::admitted_shows;
use crate::export::CsvRecord;

/// One show in the upcoming-shows listing.
///
/// Also read back from an earlier listing when reporting new shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowRecord {
    pub date: NaiveDate,
    pub band: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub venue: Option<String>,
    pub country: Option<String>,
}

impl CsvRecord for ShowRecord {
    const FIELDS: &'static [&'static str] = &["date", "band", "city", "state", "venue", "country"];
}

/// Every show inside `range`, ordered by date. Shows on the same date keep
/// tree order.
#[must_use]
pub fn flatten_shows(accounts: &[Account], range: &DateRange) -> Vec<ShowRecord> {
    let mut records: Vec<ShowRecord> = admitted_shows(accounts, range)
        .filter_map(|(account, _, show)| {
            let location = show.location.as_ref();
            Some(ShowRecord {
                date: show.show_date?,
                band: account.name.clone(),
                city: location.and_then(|l| l.city.clone()),
                state: location.and_then(|l| l.state_province.clone()),
                venue: location.and_then(|l| l.name.clone()),
                country: location.and_then(|l| l.country.clone()),
            })
        })
        .collect();
    records.sort_by_key(|r| r.date);
    records
}
