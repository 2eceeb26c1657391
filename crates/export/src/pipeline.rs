//! End-to-end export runs: fetch a tree, flatten it, write CSV.
//!
//! Each run builds its tree completely (or one account at a time for
//! counts) before anything is written, so a failed run never leaves a
//! half-written batch behind.

use std::path::{Path, PathBuf};

use atvenu_export_core::{Account, DateRange};
use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::changes::new_shows;
use crate::client::{ApiClient, Transport};
use crate::error::ExportError;
use crate::export::{AppendSession, ExportMode, export_to_csv};
use crate::flatten::{
    ItemTotals, ShowRecord, VariantTable, admitted_shows, flatten_accounts, flatten_counts,
    flatten_shows, flatten_transactions,
};
use crate::tree::{LeafKind, TreeBuilder, TreeOptions};

/// Which accounts and shows a run covers.
#[derive(Debug, Clone)]
pub struct RunScope {
    /// Shows are exported when `showDate` falls inside this range.
    pub range: DateRange,
    /// Restrict to the account with exactly this name.
    pub account_name: Option<String>,
}

impl RunScope {
    #[must_use]
    pub const fn new(range: DateRange) -> Self {
        Self {
            range,
            account_name: None,
        }
    }

    #[must_use]
    pub fn with_account(mut self, name: impl Into<String>) -> Self {
        self.account_name = Some(name.into());
        self
    }
}

/// What a finished run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub output: PathBuf,
    pub accounts: usize,
    pub shows: usize,
    /// CSV rows, excluding the header.
    pub rows: usize,
    /// Counts dropped because their variant was not in the catalogue.
    pub unmatched: usize,
    /// Shows missing from the previous listing.
    pub new_shows: usize,
}

/// Where to report shows that an earlier listing did not have.
#[derive(Debug, Clone)]
pub struct ChangeReport {
    /// The earlier listing, read before this run writes anything.
    pub previous: Vec<ShowRecord>,
    /// Stamped on every new show.
    pub first_seen: NaiveDate,
    /// Changes file. Only written when there is at least one new show.
    pub output: PathBuf,
}

impl RunSummary {
    fn new(output: &Path) -> Self {
        Self {
            output: output.to_path_buf(),
            ..Self::default()
        }
    }

    fn count_tree(&mut self, accounts: &[Account], range: &DateRange) {
        self.accounts += accounts.len();
        self.shows += admitted_shows(accounts, range).count();
    }
}

fn tree_options<T: Transport>(
    client: &ApiClient<T>,
    scope: &RunScope,
    leaves: LeafKind,
    open_tours: Option<bool>,
) -> TreeOptions {
    TreeOptions {
        range: Some(scope.range),
        leaves,
        concurrency: client.options().max_in_flight,
        account_name: scope.account_name.clone(),
        open_tours,
    }
}

/// Export every account's name and UUID.
///
/// # Errors
///
/// Returns `ExportError::NoData` when the organization has no accounts, or
/// the fetch/write error that stopped the run.
#[instrument(skip(client))]
pub async fn export_accounts<T: Transport>(
    client: &ApiClient<T>,
    output: &Path,
) -> Result<RunSummary, ExportError> {
    let accounts = client.fetch_accounts().await?;
    let mut summary = RunSummary::new(output);
    summary.accounts = accounts.len();
    summary.rows = export_to_csv(&flatten_accounts(&accounts), output, ExportMode::Overwrite)?;

    info!(rows = summary.rows, path = %output.display(), "Exported accounts");
    Ok(summary)
}

/// Export itemized transactions for every show in scope.
///
/// # Errors
///
/// Returns `ExportError::NoData` when no show in scope has transactions, or
/// the fetch/write error that stopped the run.
#[instrument(skip(client, scope), fields(range = %scope.range))]
pub async fn export_transactions<T: Transport>(
    client: &ApiClient<T>,
    scope: &RunScope,
    output: &Path,
) -> Result<RunSummary, ExportError> {
    let options = tree_options(client, scope, LeafKind::Transactions, None);
    let accounts = TreeBuilder::new(client, options).build_all().await?;

    let mut summary = RunSummary::new(output);
    summary.count_tree(&accounts, &scope.range);
    let records = flatten_transactions(&accounts, &scope.range);
    summary.rows = export_to_csv(&records, output, ExportMode::Overwrite)?;

    info!(
        accounts = summary.accounts,
        shows = summary.shows,
        rows = summary.rows,
        path = %output.display(),
        "Exported transactions"
    );
    Ok(summary)
}

/// Export settlement counts joined with each account's merch catalogue.
///
/// Accounts are processed one at a time and appended to `output` as each
/// completes, so a failure keeps the accounts already written.
///
/// # Errors
///
/// Returns `ExportError::NoData` when no account produced a row, or the
/// fetch/write error that stopped the run.
#[instrument(skip(client, scope), fields(range = %scope.range))]
pub async fn export_counts<T: Transport>(
    client: &ApiClient<T>,
    scope: &RunScope,
    output: &Path,
) -> Result<RunSummary, ExportError> {
    let builder = TreeBuilder::new(client, tree_options(client, scope, LeafKind::Counts, Some(false)));
    let mut session = AppendSession::new(output);
    let mut summary = RunSummary::new(output);

    for account in builder.fetch_accounts().await? {
        let name = account.name.clone();
        let (account, items) = tokio::try_join!(
            builder.build_account(account.clone()),
            client.fetch_merch_items(&account.uuid),
        )?;

        let variants = VariantTable::from_items(&items);
        let accounts = [account];
        let rows = flatten_counts(&accounts, &scope.range, &variants);
        if !rows.unmatched.is_empty() {
            warn!(
                account = %name,
                dropped = rows.unmatched.len(),
                "Counts reference merch variants missing from the catalogue"
            );
        }

        summary.count_tree(&accounts, &scope.range);
        summary.unmatched += rows.unmatched.len();
        let written = session.write(&rows.records)?;
        info!(account = %name, variants = variants.len(), rows = written, "Exported account counts");
    }

    summary.rows = session.finish()?;
    info!(
        accounts = summary.accounts,
        shows = summary.shows,
        rows = summary.rows,
        dropped = summary.unmatched,
        path = %output.display(),
        "Exported counts"
    );
    Ok(summary)
}

/// Export the upcoming-shows listing for open tours.
///
/// # Errors
///
/// Returns `ExportError::NoData` when no show falls in the window, or the
/// fetch/write error that stopped the run.
#[instrument(skip(client, scope), fields(range = %scope.range))]
pub async fn export_shows<T: Transport>(
    client: &ApiClient<T>,
    scope: &RunScope,
    output: &Path,
) -> Result<RunSummary, ExportError> {
    let (summary, _) = show_listing(client, scope, output).await?;
    Ok(summary)
}

/// Export the upcoming-shows listing, then write the shows that
/// `report.previous` does not list to `report.output`.
///
/// # Errors
///
/// Returns `ExportError::NoData` when no show falls in the window, or the
/// fetch/write error that stopped the run. No new shows is not an error.
#[instrument(skip(client, scope, report), fields(range = %scope.range, previous = report.previous.len()))]
pub async fn export_shows_with_changes<T: Transport>(
    client: &ApiClient<T>,
    scope: &RunScope,
    output: &Path,
    report: &ChangeReport,
) -> Result<RunSummary, ExportError> {
    let (mut summary, latest) = show_listing(client, scope, output).await?;

    let changes = new_shows(&latest, &report.previous, report.first_seen);
    if changes.is_empty() {
        info!("No new shows since the previous listing");
        return Ok(summary);
    }
    summary.new_shows = export_to_csv(&changes, &report.output, ExportMode::Overwrite)?;

    info!(new_shows = summary.new_shows, path = %report.output.display(), "Exported new shows");
    Ok(summary)
}

async fn show_listing<T: Transport>(
    client: &ApiClient<T>,
    scope: &RunScope,
    output: &Path,
) -> Result<(RunSummary, Vec<ShowRecord>), ExportError> {
    let options = tree_options(client, scope, LeafKind::None, Some(true));
    let accounts = TreeBuilder::new(client, options).build_all().await?;

    let mut summary = RunSummary::new(output);
    summary.count_tree(&accounts, &scope.range);
    let records = flatten_shows(&accounts, &scope.range);
    summary.rows = export_to_csv(&records, output, ExportMode::Overwrite)?;

    info!(shows = summary.shows, path = %output.display(), "Exported upcoming shows");
    Ok((summary, records))
}

/// Export units sold per item name across every show in scope.
///
/// # Errors
///
/// Returns `ExportError::NoData` when no transaction in scope names an item,
/// or the fetch/write error that stopped the run.
#[instrument(skip(client, scope), fields(range = %scope.range))]
pub async fn export_totals<T: Transport>(
    client: &ApiClient<T>,
    scope: &RunScope,
    output: &Path,
) -> Result<RunSummary, ExportError> {
    let options = tree_options(client, scope, LeafKind::Transactions, None);
    let accounts = TreeBuilder::new(client, options).build_all().await?;

    let totals = item_totals(&accounts, &scope.range);
    let mut summary = RunSummary::new(output);
    summary.count_tree(&accounts, &scope.range);
    summary.rows = export_to_csv(&totals.into_records(), output, ExportMode::Overwrite)?;

    info!(items = summary.rows, path = %output.display(), "Exported item totals");
    Ok(summary)
}

/// Per-show totals merged in tree order.
#[must_use]
pub fn item_totals(accounts: &[Account], range: &DateRange) -> ItemTotals {
    admitted_shows(accounts, range)
        .map(|(_, _, show)| ItemTotals::new().accumulate(&show.transactions))
        .fold(ItemTotals::new(), ItemTotals::merge)
}
