//! Accounts and tours, the two upper levels of the export tree.

use serde::{Deserialize, Serialize};

use super::id::{AccountUuid, TourUuid};
use super::show::Show;

/// An artist account within the organization.
///
/// Deserializes from an `accounts` connection node. Older queries alias the
/// name as `artistName`, so both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account UUID.
    pub uuid: AccountUuid,
    /// Artist/band name.
    #[serde(alias = "artistName")]
    pub name: String,
    /// Tours in API order (attached after pagination).
    #[serde(skip)]
    pub tours: Vec<Tour>,
}

/// A tour belonging to exactly one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    /// Tour UUID.
    pub uuid: TourUuid,
    /// Tour name.
    #[serde(alias = "tourName")]
    pub name: String,
    /// Shows in API order (attached after pagination).
    #[serde(skip)]
    pub shows: Vec<Show>,
}

impl Account {
    /// Create an account shell with no tours.
    #[must_use]
    pub fn new(uuid: impl Into<AccountUuid>, name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            tours: Vec::new(),
        }
    }
}

impl Tour {
    /// Create a tour shell with no shows.
    #[must_use]
    pub fn new(uuid: impl Into<TourUuid>, name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            shows: Vec::new(),
        }
    }
}
