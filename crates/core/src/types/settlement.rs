//! Settlement counts and the merchandise catalogue they reference.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::id::{MerchItemUuid, MerchVariantUuid};

/// One main-count line of a show settlement.
///
/// A count references its merchandise variant by UUID only; price, size,
/// SKU and category come from the account's catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Count {
    /// Variant this count is for.
    pub merch_variant_uuid: MerchVariantUuid,
    /// Owning merch item, when the query requested it.
    #[serde(default)]
    pub merch_item_uuid: Option<MerchItemUuid>,
    /// Show-specific price overriding the catalogue price.
    #[serde(default)]
    pub price_override: Option<Decimal>,
    /// Units counted in before the show.
    #[serde(default)]
    pub count_in: Option<i64>,
    /// Units counted out after the show.
    #[serde(default)]
    pub count_out: Option<i64>,
    /// Complimentary units given away.
    #[serde(default)]
    pub comps: Option<i64>,
    /// Restocks added during the show.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub merch_adds: Vec<MerchAdd>,
}

/// Units added to a count during the show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchAdd {
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// A merchandise item in an account's catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchItem {
    pub uuid: MerchItemUuid,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub product_type: Option<ProductType>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub merch_variants: Vec<MerchVariant>,
}

/// Product type of a merch item (e.g. `Apparel`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductType {
    #[serde(default)]
    pub name: Option<String>,
}

/// A sellable variant (size/colour) of a merch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchVariant {
    pub uuid: MerchVariantUuid,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
}

impl Count {
    /// Total units added during the show; missing quantities count as zero.
    #[must_use]
    pub fn adds_quantity(&self) -> i64 {
        self.merch_adds.iter().map(|a| a.quantity.unwrap_or(0)).sum()
    }

    /// Units sold: `countIn + adds - countOut - comps`, missing values as zero.
    #[must_use]
    pub fn sold_quantity(&self) -> i64 {
        self.count_in.unwrap_or(0) + self.adds_quantity()
            - self.count_out.unwrap_or(0)
            - self.comps.unwrap_or(0)
    }
}

impl MerchItem {
    /// Product type name, if any.
    #[must_use]
    pub fn product_type_name(&self) -> Option<&str> {
        self.product_type.as_ref().and_then(|p| p.name.as_deref())
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
