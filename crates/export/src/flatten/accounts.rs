use atvenu_export_core::Account;
use serde::Serialize;

use crate::export::CsvRecord;

/// An account listing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub artist_name: String,
    pub uuid: String,
}

impl CsvRecord for AccountRecord {
    const FIELDS: &'static [&'static str] = &["artistName", "uuid"];
}

#[must_use]
pub fn flatten_accounts(accounts: &[Account]) -> Vec<AccountRecord> {
    accounts
        .iter()
        .map(|account| AccountRecord {
            artist_name: account.name.clone(),
            uuid: account.uuid.to_string(),
        })
        .collect()
}
