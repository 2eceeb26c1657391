use std::collections::HashMap;

use atvenu_export_core::Transaction;
use serde::Serialize;

use crate::export::CsvRecord;

/// Units sold for one item name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemTotalRecord {
    pub item_name: String,
    pub sold_quantity: i64,
}

impl CsvRecord for ItemTotalRecord {
    const FIELDS: &'static [&'static str] = &["itemName", "soldQuantity"];
}

/// Running sold-quantity totals keyed by item name.
///
/// Items keep the order in which they were first seen. Transactions without
/// an item name are not counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemTotals {
    totals: Vec<(String, i64)>,
    index: HashMap<String, usize>,
}

impl ItemTotals {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every transaction's sold quantity to its item's total.
    #[must_use]
    pub fn accumulate(mut self, transactions: &[Transaction]) -> Self {
        for tx in transactions {
            if let Some(name) = tx.item_name.as_deref() {
                self.add(name, tx.sold_quantity_or_zero());
            }
        }
        self
    }

    /// Sum `other` into `self`. Items only in `other` are appended in
    /// `other`'s order.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        for (name, quantity) in other.totals {
            self.add(&name, quantity);
        }
        self
    }

    #[must_use]
    pub fn get(&self, item_name: &str) -> Option<i64> {
        self.index
            .get(item_name)
            .and_then(|&i| self.totals.get(i))
            .map(|(_, quantity)| *quantity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    #[must_use]
    pub fn into_records(self) -> Vec<ItemTotalRecord> {
        self.totals
            .into_iter()
            .map(|(item_name, sold_quantity)| ItemTotalRecord {
                item_name,
                sold_quantity,
            })
            .collect()
    }

    fn add(&mut self, name: &str, quantity: i64) {
        if let Some(slot) = self
            .index
            .get(name)
            .and_then(|&i| self.totals.get_mut(i))
        {
            slot.1 += quantity;
            return;
        }
        self.index.insert(name.to_string(), self.totals.len());
        self.totals.push((name.to_string(), quantity));
    }
}
