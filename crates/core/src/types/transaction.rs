//! Itemized point-of-sale transactions.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// One itemized sale line from a show's point of sale.
///
/// Every field is optional: the API omits values that do not apply to the
/// itemization type (e.g. refunds on a plain sale).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    pub artist_name: Option<String>,
    pub before_tax_price_amount: Option<Decimal>,
    pub cardholder_name: Option<String>,
    pub device: Option<String>,
    pub discount_name: Option<String>,
    pub gross_sold_amount: Option<Decimal>,
    pub gross_sold_amount_with_modifiers: Option<Decimal>,
    pub item_name: Option<String>,
    pub itemization_type: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub modifiers: Vec<Modifier>,
    pub net_sold_amount: Option<Decimal>,
    pub net_sold_amount_with_modifiers: Option<Decimal>,
    pub order_id: Option<String>,
    pub order_type: Option<String>,
    /// Payment time as reported by the API (ISO 8601).
    pub payment_timestamp: Option<String>,
    pub product_type: Option<String>,
    pub refunded_discount_amount: Option<Decimal>,
    pub refunded_quantity: Option<i64>,
    pub refunded_tax_one_amount: Option<Decimal>,
    pub refunded_tax_two_amount: Option<Decimal>,
    pub size: Option<String>,
    pub sold_quantity: Option<i64>,
    pub staff_name: Option<String>,
    pub stand_name: Option<String>,
    pub tax_one_amount: Option<Decimal>,
    pub tax_two_amount: Option<Decimal>,
    pub tender_type: Option<String>,
    pub total_discount_amount: Option<Decimal>,
    pub total_refunded_amount: Option<Decimal>,
    pub total_refunded_amount_with_modifiers: Option<Decimal>,
    pub unit_price_amount: Option<Decimal>,
}

/// A price, tax or discount adjustment applied to a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Modifier {
    pub modifier_name: Option<String>,
    pub discount_amount: Option<Decimal>,
    pub gross_amount: Option<Decimal>,
    pub refunded_discount_amount: Option<Decimal>,
    pub refunded_gross_amount: Option<Decimal>,
    pub refunded_tax_one_amount: Option<Decimal>,
    pub refunded_tax_two_amount: Option<Decimal>,
    pub tax_one_amount: Option<Decimal>,
    pub tax_two_amount: Option<Decimal>,
    pub unit_price_amount: Option<Decimal>,
}

impl Transaction {
    /// Sold quantity, treating a missing value as zero.
    #[must_use]
    pub fn sold_quantity_or_zero(&self) -> i64 {
        self.sold_quantity.unwrap_or(0)
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
