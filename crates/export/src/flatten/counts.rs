use std::collections::HashMap;

use atvenu_export_core::{Account, DateRange, MerchItem, MerchVariantUuid};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::admitted_shows;
use crate::export::CsvRecord;

/// Catalogue data for one merch variant, joined onto counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantInfo {
    /// Owning item's name.
    pub item_name: String,
    pub category: Option<String>,
    pub product_type: Option<String>,
    pub sku: Option<String>,
    pub size: Option<String>,
    pub price: Option<Decimal>,
}

/// Merch variants of one account, keyed by variant UUID.
#[derive(Debug, Clone, Default)]
pub struct VariantTable {
    variants: HashMap<MerchVariantUuid, VariantInfo>,
}

impl VariantTable {
    /// Index every variant of every item.
    #[must_use]
    pub fn from_items(items: &[MerchItem]) -> Self {
        let variants = items
            .iter()
            .flat_map(|item| {
                item.merch_variants.iter().map(move |variant| {
                    (
                        variant.uuid.clone(),
                        VariantInfo {
                            item_name: item.name.clone(),
                            category: item.category.clone(),
                            product_type: item.product_type_name().map(str::to_string),
                            sku: variant.sku.clone(),
                            size: variant.size.clone(),
                            price: variant.price,
                        },
                    )
                })
            })
            .collect();
        Self { variants }
    }

    #[must_use]
    pub fn get(&self, uuid: &MerchVariantUuid) -> Option<&VariantInfo> {
        self.variants.get(uuid)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// One settlement count with show context and joined variant data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountRecord {
    pub artist_name: String,
    pub tour_name: String,
    pub show_date: Option<NaiveDate>,
    pub show_end_date: Option<NaiveDate>,
    pub state: Option<String>,
    pub attendance: Option<i64>,
    pub capacity: Option<i64>,
    pub city: Option<String>,
    pub state_province: Option<String>,
    pub country: Option<String>,
    pub currency_code: Option<String>,
    pub category: Option<String>,
    pub product_type: Option<String>,
    pub variant_name: String,
    pub variant_sku: Option<String>,
    pub variant_size: Option<String>,
    pub variant_price: Option<Decimal>,
    pub sold_quantity: i64,
}

impl CsvRecord for CountRecord {
    const FIELDS: &'static [&'static str] = &[
        "artistName",
        "tourName",
        "showDate",
        "showEndDate",
        "state",
        "attendance",
        "capacity",
        "city",
        "stateProvince",
        "country",
        "currencyCode",
        "category",
        "productType",
        "variantName",
        "variantSku",
        "variantSize",
        "variantPrice",
        "soldQuantity",
    ];
}

/// Flattened counts plus the variant UUIDs that had no catalogue entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountRows {
    pub records: Vec<CountRecord>,
    /// One entry per dropped count, in tree order.
    pub unmatched: Vec<MerchVariantUuid>,
}

/// One record per count of every show inside `range` whose variant is in
/// `variants`. Counts without a catalogue match are dropped and reported in
/// [`CountRows::unmatched`].
#[must_use]
pub fn flatten_counts(accounts: &[Account], range: &DateRange, variants: &VariantTable) -> CountRows {
    let mut rows = CountRows::default();

    for (account, tour, show) in admitted_shows(accounts, range) {
        let location = show.location.as_ref();
        for count in &show.counts {
            let Some(variant) = variants.get(&count.merch_variant_uuid) else {
                rows.unmatched.push(count.merch_variant_uuid.clone());
                continue;
            };

            rows.records.push(CountRecord {
                artist_name: account.name.clone(),
                tour_name: tour.name.clone(),
                show_date: show.show_date,
                show_end_date: show.show_end_date,
                state: show.state.clone(),
                attendance: show.attendance,
                capacity: show.effective_capacity(),
                city: location.and_then(|l| l.city.clone()),
                state_province: location.and_then(|l| l.state_province.clone()),
                country: location.and_then(|l| l.country.clone()),
                currency_code: show.currency_code().map(str::to_string),
                category: variant.category.clone(),
                product_type: variant.product_type.clone(),
                variant_name: variant.item_name.clone(),
                variant_sku: variant.sku.clone(),
                variant_size: variant.size.clone(),
                variant_price: count.price_override.or(variant.price),
                sold_quantity: count.sold_quantity(),
            });
        }
    }

    rows
}
