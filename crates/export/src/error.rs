//! Error types for the export pipeline.

use thiserror::Error;

/// A GraphQL error returned by the atVenu API.
pub use graphql_client::Error as GraphQLError;

/// A single failed request attempt. Retried unless [`Self::is_retryable`]
/// says otherwise.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, TLS or timeout failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// Rate limited by atVenu.
    #[error("Rate limited{}", .retry_after.map(|s| format!(", retry after {s} seconds")).unwrap_or_default())]
    RateLimited {
        /// `Retry-After` header value in seconds, if sent.
        retry_after: Option<u64>,
    },

    /// The response body was not JSON.
    #[error("Invalid JSON body: {0}")]
    Body(#[from] serde_json::Error),

    /// The client's request limiter was shut down. Never retried.
    #[error("Request limiter closed")]
    Closed,
}

impl TransportError {
    /// Whether another attempt could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

/// Errors that can occur while fetching and exporting atVenu data.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Transport failure that persisted through every retry.
    #[error("Request for {scope} failed after {attempts} attempt(s): {source}")]
    Transport {
        /// Connection instance being fetched.
        scope: String,
        /// Attempts made, including the first.
        attempts: u32,
        /// Last attempt's failure.
        #[source]
        source: TransportError,
    },

    /// GraphQL query returned errors.
    #[error("GraphQL errors for {scope}: {}", format_graphql_errors(.errors))]
    Query {
        /// Connection instance being fetched.
        scope: String,
        /// Errors from the response envelope.
        errors: Vec<GraphQLError>,
    },

    /// The response did not have the expected shape.
    #[error("Malformed response for {scope}: {detail}")]
    MalformedResponse {
        /// Connection instance being fetched.
        scope: String,
        /// What was wrong.
        detail: String,
    },

    /// Nothing to export.
    #[error("No data to export")]
    NoData,

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Output file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub(crate) fn malformed(scope: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            scope: scope.into(),
            detail: detail.into(),
        }
    }

    /// Whether this error means "nothing was exported" rather than a failure.
    #[must_use]
    pub const fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}
