//! Building the account → tour → show → leaf tree.
//!
//! Each level is fetched with its own paginators, then attached to its parent
//! by value. Siblings are fetched concurrently with `buffered`, which yields
//! results in input order, so the assembled tree keeps API order no matter
//! which request finishes first.

use atvenu_export_core::{Account, DateRange, Show, Tour};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, instrument};

use crate::client::{ApiClient, Transport};
use crate::error::ExportError;
use crate::merge::{Parent, merge_connection};

/// Which leaf collection to fetch under each show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    /// Shows only.
    None,
    /// Itemized transactions.
    Transactions,
    /// Settlement main counts.
    Counts,
}

/// What to fetch while building the tree.
#[derive(Debug, Clone)]
pub struct TreeOptions {
    /// Shows outside this range are not descended into.
    pub range: Option<DateRange>,
    /// Leaf collection to fetch for each show.
    pub leaves: LeafKind,
    /// Sibling subtrees fetched at once per level.
    pub concurrency: usize,
    /// Restrict to accounts with exactly this name.
    pub account_name: Option<String>,
    /// Tour state filter passed to the API (`None` = all tours).
    pub open_tours: Option<bool>,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            range: None,
            leaves: LeafKind::None,
            concurrency: 4,
            account_name: None,
            open_tours: None,
        }
    }
}

/// Fetches and assembles export trees.
pub struct TreeBuilder<'c, T> {
    client: &'c ApiClient<T>,
    options: TreeOptions,
}

impl<'c, T: Transport> TreeBuilder<'c, T> {
    /// Create a builder.
    #[must_use]
    pub fn new(client: &'c ApiClient<T>, options: TreeOptions) -> Self {
        Self { client, options }
    }

    /// Options in use.
    #[must_use]
    pub const fn options(&self) -> &TreeOptions {
        &self.options
    }

    fn width(&self) -> usize {
        self.options.concurrency.max(1)
    }

    /// Fetch the organization's accounts, applying the account-name filter.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if the accounts connection fails.
    pub async fn fetch_accounts(&self) -> Result<Vec<Account>, ExportError> {
        let accounts = self.client.fetch_accounts().await?;
        Ok(match &self.options.account_name {
            Some(name) => {
                let selected: Vec<_> = accounts.into_iter().filter(|a| &a.name == name).collect();
                info!(account = %name, matched = selected.len(), "Filtered accounts by name");
                selected
            }
            None => accounts,
        })
    }

    /// Fetch every account with its full subtree.
    ///
    /// # Errors
    ///
    /// Fails on the first subtree that fails; nothing partial is returned.
    #[instrument(skip(self))]
    pub async fn build_all(&self) -> Result<Vec<Account>, ExportError> {
        let accounts = self.fetch_accounts().await?;
        let accounts: Vec<Account> = stream::iter(accounts)
            .map(|account| self.build_account(account))
            .buffered(self.width())
            .try_collect()
            .await?;

        info!(
            accounts = accounts.len(),
            tours = accounts.iter().map(|a| a.tours.len()).sum::<usize>(),
            "Built export tree"
        );
        Ok(accounts)
    }

    /// Fetch an account's tours and everything below them.
    ///
    /// # Errors
    ///
    /// Fails on the first tour that fails.
    #[instrument(skip(self, account), fields(account = %account.uuid))]
    pub async fn build_account(&self, account: Account) -> Result<Account, ExportError> {
        let tours = self
            .client
            .fetch_tours(&account.uuid, self.options.open_tours)
            .await?;
        debug!(tours = tours.len(), "Fetched tours");

        let tours: Vec<Tour> = stream::iter(tours.into_nodes())
            .map(|tour| self.build_tour(tour))
            .buffered(self.width())
            .try_collect()
            .await?;

        Ok(account.attach(tours))
    }

    /// Fetch a tour's shows and their leaves.
    ///
    /// Shows outside the date range are kept out of the tree entirely, so
    /// their leaves are never requested.
    ///
    /// # Errors
    ///
    /// Fails on the first show that fails.
    #[instrument(skip(self, tour), fields(tour = %tour.uuid))]
    pub async fn build_tour(&self, tour: Tour) -> Result<Tour, ExportError> {
        let range = self.options.range.as_ref();
        let shows = self.client.fetch_shows(&tour.uuid, range).await?;
        let fetched = shows.len();

        let shows: Vec<Show> = shows
            .into_nodes()
            .into_iter()
            .filter(|show| range.is_none_or(|r| r.admits(show)))
            .collect();
        debug!(fetched, kept = shows.len(), "Fetched shows");

        let shows: Vec<Show> = stream::iter(shows)
            .map(|show| self.build_show(show))
            .buffered(self.width())
            .try_collect()
            .await?;

        Ok(tour.attach(shows))
    }

    /// Fetch a show's leaf collection.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if the leaf connection fails.
    pub async fn build_show(&self, show: Show) -> Result<Show, ExportError> {
        match self.options.leaves {
            LeafKind::None => Ok(show),
            LeafKind::Transactions => {
                let transactions = self.client.fetch_transactions(&show.uuid).await?;
                Ok(merge_connection(show, transactions))
            }
            LeafKind::Counts => {
                let counts = self.client.fetch_counts(&show.uuid).await?;
                Ok(merge_connection(show, counts))
            }
        }
    }
}
