//! Turning the merged tree into flat, row-oriented records.
//!
//! Everything here is pure: trees in, records out. Shows are filtered on
//! `showDate` against a half-open [`DateRange`]; leaves are visited in tree
//! order, so records come out in API order.

mod accounts;
mod counts;
mod shows;
mod totals;
mod transactions;

pub use accounts::{AccountRecord, flatten_accounts};
pub use counts::{CountRecord, CountRows, VariantInfo, VariantTable, flatten_counts};
pub use shows::{ShowRecord, flatten_shows};
pub use totals::{ItemTotalRecord, ItemTotals};
pub use transactions::{TransactionRecord, flatten_transactions};

use atvenu_export_core::{Account, DateRange, Show, Tour};

/// Every show that passes `range`, with its owning account and tour, in tree
/// order.
pub fn admitted_shows<'a>(
    accounts: &'a [Account],
    range: &'a DateRange,
) -> impl Iterator<Item = (&'a Account, &'a Tour, &'a Show)> + 'a {
    accounts.iter().flat_map(move |account| {
        account.tours.iter().flat_map(move |tour| {
            tour.shows
                .iter()
                .filter(move |show| range.admits(show))
                .map(move |show| (account, tour, show))
        })
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::{date, dated, show, tree};
    use super::*;

    #[test]
    fn test_admitted_shows_applies_range() {
        let accounts = tree(|uuid| show(uuid, dated(uuid)));
        let range = DateRange::starting(date(2022, 1, 1));

        let admitted: Vec<_> = admitted_shows(&accounts, &range)
            .map(|(account, tour, show)| (account.name.as_str(), tour.name.as_str(), show.uuid.as_str()))
            .collect();
        assert_eq!(admitted, [("The Band", "Spring Tour", "show_new")]);
    }
}
