//! Account-level queries: the organization's accounts, their tours and their
//! merchandise catalogue.

use atvenu_export_core::{Account, AccountUuid, MerchItem, Tour};
use tracing::{info, instrument};

use super::{ApiClient, Transport};
use crate::error::ExportError;
use crate::merge::Connection;
use crate::pagination::PaginatedQuery;
use crate::queries::{self, ACCOUNTS_PAGE_SIZE};

impl<T: Transport> ApiClient<T> {
    /// Fetch every account in the organization, in API order.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if any page fails.
    #[instrument(skip(self))]
    pub async fn fetch_accounts(&self) -> Result<Vec<Account>, ExportError> {
        let query = PaginatedQuery::new(
            "accounts",
            queries::ACCOUNTS,
            "organization.accounts",
            "organization accounts",
        )
        .with_page_size(ACCOUNTS_PAGE_SIZE);

        let accounts = self.fetch_all::<Account>(query).await?;
        info!(count = accounts.len(), pages = accounts.page_count(), "Fetched accounts");
        Ok(accounts.into_nodes())
    }

    /// Fetch the tours of one account.
    ///
    /// `open` filters by tour state; `None` returns every tour.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if any page fails.
    #[instrument(skip(self), fields(account = %account))]
    pub async fn fetch_tours(
        &self,
        account: &AccountUuid,
        open: Option<bool>,
    ) -> Result<Connection<Tour>, ExportError> {
        let query = PaginatedQuery::new(
            "tours",
            queries::TOURS,
            "account.tours",
            format!("account {account} tours"),
        )
        .variable("uuid", account.as_str())
        .variable("open", open);

        self.fetch_all(query).await
    }

    /// Fetch the merchandise catalogue of one account.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if any page fails.
    #[instrument(skip(self), fields(account = %account))]
    pub async fn fetch_merch_items(
        &self,
        account: &AccountUuid,
    ) -> Result<Vec<MerchItem>, ExportError> {
        let query = PaginatedQuery::new(
            "merchItems",
            queries::MERCH_ITEMS,
            "account.merchItems",
            format!("account {account} merch items"),
        )
        .variable("uuid", account.as_str());

        let items = self.fetch_all::<MerchItem>(query).await?;
        info!(count = items.len(), "Fetched merch items");
        Ok(items.into_nodes())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use crate::config::ClientOptions;
    use crate::testing::ScriptedTransport;

    use super::*;

    #[tokio::test]
    async fn test_fetch_accounts_uses_fixed_page_size() {
        let transport = ScriptedTransport::new()
            .respond(json!({"data": {"organization": {"accounts": {
                "pageInfo": {"hasNextPage": true, "endCursor": "a1"},
                "nodes": [{"uuid": "account_1", "name": "Band One"}]
            }}}}))
            .respond(json!({"data": {"organization": {"accounts": {
                "pageInfo": {"hasNextPage": false, "endCursor": "a2"},
                "nodes": [{"uuid": "account_2", "artistName": "Band Two"}]
            }}}}));
        let client = ApiClient::new(transport, ClientOptions::default());

        let accounts = client.fetch_accounts().await.unwrap();
        let names: Vec<_> = accounts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Band One", "Band Two"]);

        let requests = client.transport().requests_for("accounts");
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].variables["first"], json!(20));
        assert_eq!(requests[1].cursor(), Some("a1"));
    }

    #[tokio::test]
    async fn test_fetch_tours_passes_open_filter() {
        let transport = ScriptedTransport::new().respond(json!({"data": {"account": {"tours": {
            "pageInfo": {"hasNextPage": false, "endCursor": null},
            "nodes": [{"uuid": "tour_1", "name": "Spring"}]
        }}}}));
        let client = ApiClient::new(transport, ClientOptions::default());

        let tours = client
            .fetch_tours(&AccountUuid::new("account_1"), Some(true))
            .await
            .unwrap();
        assert_eq!(tours.len(), 1);

        let request = &client.transport().requests()[0];
        assert_eq!(request.uuid(), Some("account_1"));
        assert_eq!(request.variables["open"], json!(true));
        assert_eq!(request.variables["first"], json!(200));
    }

    #[tokio::test]
    async fn test_fetch_merch_items() {
        let transport = ScriptedTransport::new().respond(json!({"data": {"account": {"merchItems": {
            "pageInfo": {"hasNextPage": false},
            "nodes": [{
                "uuid": "item_1",
                "name": "Tour Tee",
                "category": "Apparel",
                "productType": {"name": "T-Shirt"},
                "merchVariants": [{"uuid": "variant_1", "sku": "TT-S", "size": "S", "price": 30}]
            }]
        }}}}));
        let client = ApiClient::new(transport, ClientOptions::default());

        let items = client
            .fetch_merch_items(&AccountUuid::new("account_1"))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].merch_variants[0].sku.as_deref(), Some("TT-S"));
    }
}
