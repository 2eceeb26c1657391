//! atVenu Export CLI - CSV exports from the atVenu GraphQL API.
//!
//! # Usage
//!
//! ```bash
//! # List the organization's accounts
//! atvenu-export accounts
//!
//! # Itemized transactions for shows since 2022
//! atvenu-export transactions --start 2022-01-01
//!
//! # Settlement counts for one account in one quarter
//! atvenu-export counts --start 2024-01-01 --end 2024-04-01 --account "The Band"
//!
//! # Upcoming shows for the next year
//! atvenu-export shows
//!
//! # Upcoming shows, plus the ones yesterday's listing did not have
//! atvenu-export shows --previous 2024-05-31.csv --changes changes.csv
//!
//! # Units sold per item
//! atvenu-export totals --start 2024-01-01
//! ```
//!
//! # Environment Variables
//!
//! - `ATVENU_API_KEY` - API key sent as `x-api-key` (required)
//! - `ATVENU_ENDPOINT` - GraphQL endpoint
//! - `ATVENU_MAX_IN_FLIGHT` - Concurrent request limit
//! - `ATVENU_MAX_ATTEMPTS`, `ATVENU_INITIAL_BACKOFF_MS` - Retry policy
//! - `ATVENU_TIMEOUT_SECS` - Per-request timeout
//! - `ATVENU_PAGE_SIZE` - Nodes requested per page
//! - `RUST_LOG` - Log filter (default `atvenu_export=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use atvenu_export::ApiClient;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "atvenu-export")]
#[command(author, version, about = "Export atVenu data to CSV")]
struct Cli {
    /// Emit JSON log lines instead of text
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export every account's name and UUID
    Accounts {
        /// Output file
        #[arg(short, long, default_value = "accounts.csv")]
        output: PathBuf,
    },
    /// Export itemized transactions
    Transactions {
        #[command(flatten)]
        range: RangeArgs,

        /// Output file
        #[arg(short, long, default_value = "transactions.csv")]
        output: PathBuf,
    },
    /// Export settlement counts joined with the merch catalogue
    Counts {
        #[command(flatten)]
        range: RangeArgs,

        /// Output file
        #[arg(short, long, default_value = "counts.csv")]
        output: PathBuf,
    },
    /// Export upcoming shows on open tours
    Shows {
        /// First day of the window (defaults to today)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Window length in days
        #[arg(long, default_value_t = 365)]
        days: u32,

        /// Output file (defaults to `<today>.csv`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Earlier listing to compare against; shows it lacks are written
        /// to `--changes`
        #[arg(long)]
        previous: Option<PathBuf>,

        /// New-shows file
        #[arg(long, default_value = "changes.csv", requires = "previous")]
        changes: PathBuf,
    },
    /// Export units sold per item name
    Totals {
        #[command(flatten)]
        range: RangeArgs,

        /// Output file
        #[arg(short, long, default_value = "item_totals.csv")]
        output: PathBuf,
    },
}

/// Show date window and account filter shared by the tree exports.
#[derive(Args)]
struct RangeArgs {
    /// First show date to include (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,

    /// Show date to stop before (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Only export the account with this exact name
    #[arg(long)]
    account: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let result = match commands::export::connect() {
        Ok(client) => run_until_interrupted(cli.command, &client).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {}
        Err(e) if e.is_no_data() => tracing::info!("Nothing to export"),
        Err(e) => {
            tracing::error!("Command failed: {e}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(json: bool) {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "atvenu_export=info,atvenu_export_cli=info".into());

    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

/// Run `command`; on Ctrl-C, close the client so requests in flight finish
/// and the run unwinds on its next request. Batches already written stay.
async fn run_until_interrupted(command: Commands, client: &ApiClient) -> Result<(), CommandError> {
    let task = run(command, client);
    tokio::pin!(task);

    tokio::select! {
        result = &mut task => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, waiting for requests in flight");
            client.close();
            match task.await {
                Ok(()) => Ok(()),
                Err(e) if e.is_no_data() => Err(e),
                Err(_) => Err(CommandError::Interrupted),
            }
        }
    }
}

async fn run(command: Commands, client: &ApiClient) -> Result<(), CommandError> {
    match command {
        Commands::Accounts { output } => commands::export::accounts(client, &output).await?,
        Commands::Transactions { range, output } => {
            let scope = commands::scope(range.start, range.end, range.account)?;
            commands::export::transactions(client, &scope, &output).await?;
        }
        Commands::Counts { range, output } => {
            let scope = commands::scope(range.start, range.end, range.account)?;
            commands::export::counts(client, &scope, &output).await?;
        }
        Commands::Shows {
            start,
            days,
            output,
            previous,
            changes,
        } => {
            let today = chrono::Local::now().date_naive();
            let output = output.unwrap_or_else(|| PathBuf::from(format!("{today}.csv")));
            let changes = previous.map(|previous| commands::export::ChangeArgs {
                previous,
                changes,
                today,
            });
            commands::export::shows(client, start.unwrap_or(today), days, &output, changes).await?;
        }
        Commands::Totals { range, output } => {
            let scope = commands::scope(range.start, range.end, range.account)?;
            commands::export::totals(client, &scope, &output).await?;
        }
    }
    Ok(())
}
