//! atVenu GraphQL API client.
//!
//! # Architecture
//!
//! - [`Transport`] moves one request body to the API and back. [`HttpTransport`]
//!   is the real one; tests script their own.
//! - [`ApiClient`] adds what every request needs on top: a bound on requests in
//!   flight, retry with exponential backoff, and `{data, errors}` envelope
//!   decoding.
//! - Entity queries live in [`accounts`] and [`shows`] as methods on
//!   `ApiClient`, each returning a fully paginated collection.

pub mod accounts;
pub mod http;
pub mod shows;

use std::future::Future;
use std::sync::Arc;

use graphql_client::{QueryBody, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::instrument;

pub use http::HttpTransport;

use crate::config::ClientOptions;
use crate::error::{ExportError, TransportError};
use crate::merge::{Connection, Node};
use crate::pagination::{PaginatedQuery, Paginator};
use crate::retry::with_retry;

/// Request body sent to the GraphQL endpoint.
pub type GraphQLRequest = QueryBody<Value>;

/// Sends one GraphQL request and returns the decoded JSON body.
///
/// Implementations report every failure that is worth retrying (network,
/// non-2xx status, unparseable body) as a [`TransportError`]; GraphQL-level
/// errors are part of a successful body.
pub trait Transport: Send + Sync {
    /// Send `request` and return the response body.
    fn send(
        &self,
        request: &GraphQLRequest,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// atVenu GraphQL API client.
///
/// Cheap to clone; clones share the transport and the in-flight limit.
pub struct ApiClient<T = HttpTransport> {
    inner: Arc<ApiClientInner<T>>,
}

struct ApiClientInner<T> {
    transport: T,
    limiter: Semaphore,
    options: ClientOptions,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> ApiClient<T> {
    /// Create a client over `transport`.
    #[must_use]
    pub fn new(transport: T, options: ClientOptions) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                transport,
                limiter: Semaphore::new(options.max_in_flight.max(1)),
                options,
            }),
        }
    }

    /// Underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Client settings.
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    /// Default page size for paginated connections.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.inner.options.page_size
    }

    /// Execute a GraphQL request and return its `data` object.
    ///
    /// A permit from the in-flight limit is held for each attempt only, so a
    /// request sleeping between retries does not block its siblings.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Transport` once retries are exhausted,
    /// `ExportError::Query` if the response carries GraphQL errors (not
    /// retried), and `ExportError::MalformedResponse` if the body is not a
    /// GraphQL response or has no data.
    #[instrument(skip(self, request), fields(operation = request.operation_name))]
    pub async fn execute(
        &self,
        request: &GraphQLRequest,
        scope: &str,
    ) -> Result<Value, ExportError> {
        let inner = &*self.inner;
        let body = with_retry(&inner.options.retry, scope, || async move {
            let _permit = inner
                .limiter
                .acquire()
                .await
                .map_err(|_| TransportError::Closed)?;
            inner.transport.send(request).await
        })
        .await?;

        decode_envelope(body, scope)
    }

    /// Walk a connection page by page.
    #[must_use]
    pub const fn paginate<N>(&self, query: PaginatedQuery) -> Paginator<'_, T, N>
    where
        N: DeserializeOwned,
    {
        Paginator::new(self, query)
    }

    /// Fetch every page of a connection.
    ///
    /// # Errors
    ///
    /// Fails on the first page that fails; no partial connection is returned.
    pub async fn fetch_all<N>(&self, query: PaginatedQuery) -> Result<Connection<N>, ExportError>
    where
        N: DeserializeOwned + Node,
    {
        let mut paginator = self.paginate::<N>(query);
        let mut connection = Connection::new(paginator.scope());
        while let Some(page) = paginator.next_page().await? {
            connection.append(page);
        }
        Ok(connection)
    }

    /// Stop handing out request permits. In-flight requests finish; new ones
    /// fail with `TransportError::Closed`.
    pub fn close(&self) {
        self.inner.limiter.close();
    }
}

fn decode_envelope(body: Value, scope: &str) -> Result<Value, ExportError> {
    let response: Response<Value> = serde_json::from_value(body).map_err(|e| {
        ExportError::malformed(scope, format!("not a GraphQL response: {e}"))
    })?;

    if let Some(errors) = response.errors
        && !errors.is_empty()
    {
        return Err(ExportError::Query {
            scope: scope.to_string(),
            errors,
        });
    }

    response
        .data
        .filter(|data| !data.is_null())
        .ok_or_else(|| ExportError::malformed(scope, "response has no data"))
}
