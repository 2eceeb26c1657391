use atvenu_export_core::{Account, DateRange, Transaction};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::admitted_shows;
use crate::export::CsvRecord;

/// One itemized transaction with its account, tour and show context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub band_name: String,
    pub tour_name: String,
    pub show_date: Option<NaiveDate>,
    pub show_end_date: Option<NaiveDate>,
    pub attendance: Option<i64>,
    pub capacity: Option<i64>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub state_province: Option<String>,
    pub artist_name: Option<String>,
    pub before_tax_price_amount: Option<Decimal>,
    pub cardholder_name: Option<String>,
    pub device: Option<String>,
    pub discount_name: Option<String>,
    pub gross_sold_amount: Option<Decimal>,
    pub gross_sold_amount_with_modifiers: Option<Decimal>,
    pub item_name: Option<String>,
    pub itemization_type: Option<String>,
    /// JSON array of the transaction's modifiers.
    pub modifiers: String,
    pub net_sold_amount: Option<Decimal>,
    pub net_sold_amount_with_modifiers: Option<Decimal>,
    pub order_id: Option<String>,
    pub order_type: Option<String>,
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

impl CsvRecord for TransactionRecord {
    const FIELDS: &'static [&'static str] = &[
        "bandName",
        "tourName",
        "showDate",
        "showEndDate",
        "attendance",
        "capacity",
        "city",
        "country",
        "stateProvince",
        "artistName",
        "beforeTaxPriceAmount",
        "cardholderName",
        "device",
        "discountName",
        "grossSoldAmount",
        "grossSoldAmountWithModifiers",
        "itemName",
        "itemizationType",
        "modifiers",
        "netSoldAmount",
        "netSoldAmountWithModifiers",
        "orderId",
        "orderType",
        "paymentTimestamp",
        "productType",
        "refundedDiscountAmount",
        "refundedQuantity",
        "refundedTaxOneAmount",
        "refundedTaxTwoAmount",
        "size",
        "soldQuantity",
        "staffName",
        "standName",
        "taxOneAmount",
        "taxTwoAmount",
        "tenderType",
        "totalDiscountAmount",
        "totalRefundedAmount",
        "totalRefundedAmountWithModifiers",
        "unitPriceAmount",
    ];
}

/// One record per transaction of every show inside `range`.
#[must_use]
pub fn flatten_transactions(accounts: &[Account], range: &DateRange) -> Vec<TransactionRecord> {
    admitted_shows(accounts, range)
        .flat_map(|(account, tour, show)| {
            let location = show.location.as_ref();
            show.transactions.iter().map(move |tx| {
                let Transaction {
                    artist_name,
                    before_tax_price_amount,
                    cardholder_name,
                    device,
                    discount_name,
                    gross_sold_amount,
                    gross_sold_amount_with_modifiers,
                    item_name,
                    itemization_type,
                    modifiers,
                    net_sold_amount,
                    net_sold_amount_with_modifiers,
                    order_id,
                    order_type,
                    payment_timestamp,
                    product_type,
                    refunded_discount_amount,
                    refunded_quantity,
                    refunded_tax_one_amount,
                    refunded_tax_two_amount,
                    size,
                    sold_quantity,
                    staff_name,
                    stand_name,
                    tax_one_amount,
                    tax_two_amount,
                    tender_type,
                    total_discount_amount,
                    total_refunded_amount,
                    total_refunded_amount_with_modifiers,
                    unit_price_amount,
                } = tx.clone();

                TransactionRecord {
                    band_name: account.name.clone(),
                    tour_name: tour.name.clone(),
                    show_date: show.show_date,
                    show_end_date: show.show_end_date,
                    attendance: show.attendance,
                    capacity: show.capacity,
                    city: location.and_then(|l| l.city.clone()),
                    country: location.and_then(|l| l.country.clone()),
                    state_province: location.and_then(|l| l.state_province.clone()),
                    artist_name,
                    before_tax_price_amount,
                    cardholder_name,
                    device,
                    discount_name,
                    gross_sold_amount,
                    gross_sold_amount_with_modifiers,
                    item_name,
                    itemization_type,
                    modifiers: serde_json::to_string(&modifiers)
                        .unwrap_or_else(|_| "[]".to_string()),
                    net_sold_amount,
                    net_sold_amount_with_modifiers,
                    order_id,
                    order_type,
                    payment_timestamp,
                    product_type,
                    refunded_discount_amount,
                    refunded_quantity,
                    refunded_tax_one_amount,
                    refunded_tax_two_amount,
                    size,
                    sold_quantity,
                    staff_name,
                    stand_name,
                    tax_one_amount,
                    tax_two_amount,
                    tender_type,
                    total_discount_amount,
                    total_refunded_amount,
                    total_refunded_amount_with_modifiers,
                    unit_price_amount,
                }
            })
        })
        .collect()
}
