//! Export commands.
//!
//! [`connect`] loads [`ExportConfig`] from the environment and builds the
//! HTTPS client once; each command hands it to the matching pipeline run.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use atvenu_export::flatten::ShowRecord;
use atvenu_export::pipeline;
use atvenu_export::{
    ApiClient, ChangeReport, ExportConfig, ExportError, HttpTransport, RunScope, RunSummary,
    read_show_listing,
};
use atvenu_export_core::DateRange;
use chrono::NaiveDate;

use super::CommandError;

/// Build the API client from the environment.
pub fn connect() -> Result<ApiClient, CommandError> {
    let config = ExportConfig::from_env()?;
    tracing::debug!(?config, "Loaded configuration");
    let transport = HttpTransport::new(&config)?;
    Ok(ApiClient::new(transport, config.client))
}

fn report(summary: &RunSummary) {
    tracing::info!(
        path = %summary.output.display(),
        rows = summary.rows,
        "Export complete"
    );
}

/// Export the organization's accounts.
pub async fn accounts(client: &ApiClient, output: &Path) -> Result<(), CommandError> {
    report(&pipeline::export_accounts(client, output).await?);
    Ok(())
}

/// Export itemized transactions.
pub async fn transactions(
    client: &ApiClient,
    scope: &RunScope,
    output: &Path,
) -> Result<(), CommandError> {
    report(&pipeline::export_transactions(client, scope, output).await?);
    Ok(())
}

/// Export settlement counts, one account at a time.
pub async fn counts(client: &ApiClient, scope: &RunScope, output: &Path) -> Result<(), CommandError> {
    report(&pipeline::export_counts(client, scope, output).await?);
    Ok(())
}

/// Where `shows` looks for the earlier listing and writes new shows.
pub struct ChangeArgs {
    pub previous: PathBuf,
    pub changes: PathBuf,
    pub today: NaiveDate,
}

/// Export upcoming shows for `days` days from `start`, optionally reporting
/// shows the previous listing did not have.
pub async fn shows(
    client: &ApiClient,
    start: NaiveDate,
    days: u32,
    output: &Path,
    changes: Option<ChangeArgs>,
) -> Result<(), CommandError> {
    let scope = RunScope::new(DateRange::days_from(start, days));

    // Read before the new listing is written; the paths may be the same file.
    let report_to = match changes {
        Some(args) => previous_listing(&args.previous)?.map(|previous| ChangeReport {
            previous,
            first_seen: args.today,
            output: args.changes,
        }),
        None => None,
    };

    let summary = match &report_to {
        Some(change_report) => {
            pipeline::export_shows_with_changes(client, &scope, output, change_report).await?
        }
        None => pipeline::export_shows(client, &scope, output).await?,
    };
    report(&summary);
    Ok(())
}

fn previous_listing(path: &Path) -> Result<Option<Vec<ShowRecord>>, CommandError> {
    match read_show_listing(path) {
        Ok(shows) => Ok(Some(shows)),
        Err(ExportError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "No previous listing, skipping comparison");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Export units sold per item.
pub async fn totals(client: &ApiClient, scope: &RunScope, output: &Path) -> Result<(), CommandError> {
    report(&pipeline::export_totals(client, scope, output).await?);
    Ok(())
}
