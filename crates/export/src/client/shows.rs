//! Tour- and show-level queries: shows, itemized transactions and settlement
//! counts.

use atvenu_export_core::{Count, DateRange, Show, ShowUuid, TourUuid, Transaction};
use tracing::instrument;

use super::{ApiClient, Transport};
use crate::error::ExportError;
use crate::merge::Connection;
use crate::pagination::PaginatedQuery;
use crate::queries;

impl<T: Transport> ApiClient<T> {
    /// Fetch the shows of one tour.
    ///
    /// A bounded `range` is also sent to the API as an overlap window so it
    /// can skip whole pages; the exact `[start, end)` filter on `showDate` is
    /// applied later when flattening.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if any page fails.
    #[instrument(skip(self, range), fields(tour = %tour))]
    pub async fn fetch_shows(
        &self,
        tour: &TourUuid,
        range: Option<&DateRange>,
    ) -> Result<Connection<Show>, ExportError> {
        let scope = format!("tour {tour} shows");
        let window = range.and_then(|r| r.last_day().map(|last| (r.start(), last)));

        let query = match window {
            Some((start, last)) => PaginatedQuery::new(
                "showsOverlapping",
                queries::SHOWS_OVERLAPPING,
                "tour.shows",
                scope,
            )
            .variable("startDate", start.to_string())
            .variable("endDate", last.to_string()),
            None => PaginatedQuery::new("shows", queries::SHOWS, "tour.shows", scope),
        }
        .variable("uuid", tour.as_str());

        self.fetch_all(query).await
    }

    /// Fetch the itemized transactions of one show.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if any page fails.
    #[instrument(skip(self), fields(show = %show))]
    pub async fn fetch_transactions(
        &self,
        show: &ShowUuid,
    ) -> Result<Connection<Transaction>, ExportError> {
        let query = PaginatedQuery::new(
            "transactions",
            queries::TRANSACTIONS,
            "show.itemizedTransactions",
            format!("show {show} transactions"),
        )
        .variable("uuid", show.as_str());

        self.fetch_all(query).await
    }

    /// Fetch the main counts of a show's settlement.
    ///
    /// A show that has not been settled yet has no settlement and yields an
    /// empty connection.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if any page fails.
    #[instrument(skip(self), fields(show = %show))]
    pub async fn fetch_counts(&self, show: &ShowUuid) -> Result<Connection<Count>, ExportError> {
        let query = PaginatedQuery::new(
            "counts",
            queries::COUNTS,
            "show.settlements.0.mainCounts",
            format!("show {show} counts"),
        )
        .variable("uuid", show.as_str());

        self.fetch_all(query).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use crate::config::ClientOptions;
    use crate::testing::ScriptedTransport;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn empty_shows() -> serde_json::Value {
        json!({"data": {"tour": {"shows": {"pageInfo": {"hasNextPage": false}, "nodes": []}}}})
    }

    #[tokio::test]
    async fn test_bounded_range_sends_inclusive_window() {
        let transport = ScriptedTransport::new().respond(empty_shows());
        let client = ApiClient::new(transport, ClientOptions::default());
        let range = DateRange::new(date(2022, 4, 14), Some(date(2022, 4, 16))).unwrap();

        client
            .fetch_shows(&TourUuid::new("tour_1"), Some(&range))
            .await
            .unwrap();

        let request = &client.transport().requests()[0];
        assert_eq!(request.operation_name, "showsOverlapping");
        assert_eq!(request.variables["startDate"], json!("2022-04-14"));
        assert_eq!(request.variables["endDate"], json!("2022-04-15"));
    }

    #[tokio::test]
    async fn test_open_range_fetches_every_show() {
        let transport = ScriptedTransport::new().respond(empty_shows());
        let client = ApiClient::new(transport, ClientOptions::default());
        let range = DateRange::starting(date(2022, 1, 1));

        client
            .fetch_shows(&TourUuid::new("tour_1"), Some(&range))
            .await
            .unwrap();

        let request = &client.transport().requests()[0];
        assert_eq!(request.operation_name, "shows");
        assert!(request.variables.get("startDate").is_none());
    }

    #[tokio::test]
    async fn test_counts_follow_settlement_path() {
        let transport = ScriptedTransport::new().respond(json!({"data": {"show": {"settlements": [{
            "path": "main",
            "mainCounts": {
                "pageInfo": {"hasNextPage": false, "endCursor": "x"},
                "nodes": [{"merchVariantUuid": "variant_1", "countIn": 10, "countOut": 2, "comps": 1,
                           "merchAdds": [{"quantity": 3}, {"quantity": 2}]}]
            }
        }]}}}));
        let client = ApiClient::new(transport, ClientOptions::default());

        let counts = client.fetch_counts(&ShowUuid::new("show_1")).await.unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.nodes()[0].sold_quantity(), 12);
    }

    #[tokio::test]
    async fn test_unsettled_show_has_no_counts() {
        let transport = ScriptedTransport::new()
            .respond(json!({"data": {"show": {"settlements": []}}}));
        let client = ApiClient::new(transport, ClientOptions::default());

        let counts = client.fetch_counts(&ShowUuid::new("show_1")).await.unwrap();
        assert!(counts.is_empty());
    }

    #[tokio::test]
    async fn test_transactions_paginate() {
        let transport = ScriptedTransport::new()
            .respond(json!({"data": {"show": {"itemizedTransactions": {
                "pageInfo": {"hasNextPage": true, "endCursor": "t1"},
                "nodes": [{"itemName": "Tee", "soldQuantity": 1}]
            }}}}))
            .respond(json!({"data": {"show": {"itemizedTransactions": {
                "pageInfo": {"hasNextPage": false, "endCursor": "t2"},
                "nodes": [{"itemName": "Hat", "soldQuantity": 2}]
            }}}}));
        let client = ApiClient::new(transport, ClientOptions::default());

        let transactions = client
            .fetch_transactions(&ShowUuid::new("show_1"))
            .await
            .unwrap();
        let items: Vec<_> = transactions
            .nodes()
            .iter()
            .map(|t| t.item_name.as_deref().unwrap())
            .collect();
        assert_eq!(items, ["Tee", "Hat"]);
    }
}
