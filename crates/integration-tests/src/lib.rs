//! Integration tests for atVenu Export.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p atvenu-export-integration-tests
//! ```
//!
//! No network is used: every test drives the export library through
//! [`ScriptedTransport`], which answers requests by operation name, parent
//! UUID and cursor.
//!
//! # Test Categories
//!
//! - `pagination` - Cursor walks, retries and response validation
//! - `pipeline` - Whole export runs from API responses to CSV files
//! - `concurrency` - In-flight bounds and order preservation under fan-out

use std::time::Duration;

use atvenu_export::testing::ScriptedTransport;
use atvenu_export::{ApiClient, ClientOptions, RetryPolicy};
use chrono::NaiveDate;
use serde_json::{Value, json};

/// Client options with a fast retry policy.
#[must_use]
pub fn options(max_in_flight: usize, max_attempts: u32) -> ClientOptions {
    ClientOptions {
        max_in_flight,
        retry: RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            multiplier: 2,
        },
        page_size: 2,
    }
}

/// A client over `transport` with up to four requests in flight and no retry.
#[must_use]
pub fn client(transport: ScriptedTransport) -> ApiClient<ScriptedTransport> {
    ApiClient::new(transport, options(4, 1))
}

/// One page of a connection at `root.field`.
#[must_use]
pub fn page(root: &str, field: &str, nodes: Value, next_cursor: Option<&str>) -> Value {
    json!({"data": {root: {field: {
        "pageInfo": {"hasNextPage": next_cursor.is_some(), "endCursor": next_cursor},
        "nodes": nodes
    }}}})
}

/// One page of the organization's accounts.
#[must_use]
pub fn accounts_page(nodes: Value, next_cursor: Option<&str>) -> Value {
    json!({"data": {"organization": {"accounts": {
        "pageInfo": {"hasNextPage": next_cursor.is_some(), "endCursor": next_cursor},
        "nodes": nodes
    }}}})
}

/// One page of a show's settlement main counts.
#[must_use]
pub fn counts_page(nodes: Value, next_cursor: Option<&str>) -> Value {
    json!({"data": {"show": {"settlements": [{"path": "main", "mainCounts": {
        "pageInfo": {"hasNextPage": next_cursor.is_some(), "endCursor": next_cursor},
        "nodes": nodes
    }}]}}})
}

/// A date that is known to be valid.
///
/// # Panics
///
/// Panics on an invalid calendar date.
#[must_use]
#[allow(clippy::expect_used)]
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

/// Read a CSV output file as lines.
///
/// # Panics
///
/// Panics if the file cannot be read.
#[must_use]
#[allow(clippy::expect_used)]
pub fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("Failed to read CSV output")
        .lines()
        .map(str::to_string)
        .collect()
}
