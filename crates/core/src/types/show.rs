//! Shows and their venue metadata.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::id::ShowUuid;
use super::settlement::Count;
use super::transaction::Transaction;

/// A single show (one date at one venue) on a tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    /// Show UUID.
    pub uuid: ShowUuid,
    /// First day of the show.
    #[serde(default, deserialize_with = "deserialize_show_date")]
    pub show_date: Option<NaiveDate>,
    /// Last day of the show (multi-day events).
    #[serde(default, deserialize_with = "deserialize_show_date")]
    pub show_end_date: Option<NaiveDate>,
    /// Settlement state (e.g. `settled`).
    #[serde(default)]
    pub state: Option<String>,
    /// Reported attendance.
    #[serde(default)]
    pub attendance: Option<i64>,
    /// Show capacity (falls back to the venue capacity when absent).
    #[serde(default)]
    pub capacity: Option<i64>,
    /// Currency used for the show's settlement.
    #[serde(default)]
    pub currency_format: Option<CurrencyFormat>,
    /// Venue location.
    #[serde(default)]
    pub location: Option<Location>,
    /// Itemized transactions (attached after pagination).
    #[serde(skip)]
    pub transactions: Vec<Transaction>,
    /// Settlement main counts (attached after pagination).
    #[serde(skip)]
    pub counts: Vec<Count>,
}

/// Venue location for a show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Venue name.
    #[serde(default)]
    pub name: Option<String>,
    /// City.
    #[serde(default)]
    pub city: Option<String>,
    /// Country.
    #[serde(default)]
    pub country: Option<String>,
    /// State or province.
    #[serde(default)]
    pub state_province: Option<String>,
    /// Venue capacity.
    #[serde(default)]
    pub capacity: Option<i64>,
}

/// Currency format attached to a show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    /// ISO 4217 currency code.
    #[serde(default)]
    pub code: Option<String>,
}

impl Show {
    /// Create a show shell with a date and no venue metadata.
    #[must_use]
    pub fn new(uuid: impl Into<ShowUuid>, show_date: Option<NaiveDate>) -> Self {
        Self {
            uuid: uuid.into(),
            show_date,
            show_end_date: None,
            state: None,
            attendance: None,
            capacity: None,
            currency_format: None,
            location: None,
            transactions: Vec::new(),
            counts: Vec::new(),
        }
    }

    /// Show capacity, falling back to the venue capacity.
    #[must_use]
    pub fn effective_capacity(&self) -> Option<i64> {
        self.capacity
            .or_else(|| self.location.as_ref().and_then(|l| l.capacity))
    }

    /// Currency code, if the API reported one.
    #[must_use]
    pub fn currency_code(&self) -> Option<&str> {
        self.currency_format
            .as_ref()
            .and_then(|c| c.code.as_deref())
    }
}

/// Accepts `YYYY-MM-DD` as well as full timestamps (only the date part is
/// kept). Empty strings and `null` map to `None`.
fn deserialize_show_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| serde::de::Error::custom(format!("invalid show date {raw:?}: {e}")))
}
