//! Subcommand implementations.

pub mod export;

use atvenu_export::{ConfigError, ExportError, RunScope, TransportError};
use atvenu_export_core::{DateRange, DateRangeError};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Environment configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// `--start`/`--end` do not form a valid range.
    #[error(transparent)]
    Range(#[from] DateRangeError),

    /// The HTTP client could not be built.
    #[error("Could not create HTTP client: {0}")]
    Client(#[from] TransportError),

    /// The export run failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Ctrl-C arrived before the run finished.
    #[error("Interrupted")]
    Interrupted,
}

impl CommandError {
    /// Whether the run simply had nothing to write.
    #[must_use]
    pub const fn is_no_data(&self) -> bool {
        matches!(self, Self::Export(e) if e.is_no_data())
    }
}

/// Build a run scope from the shared range arguments.
pub fn scope(
    start: NaiveDate,
    end: Option<NaiveDate>,
    account: Option<String>,
) -> Result<RunScope, CommandError> {
    let scope = RunScope::new(DateRange::new(start, end)?);
    Ok(match account {
        Some(name) => scope.with_account(name),
        None => scope,
    })
}
