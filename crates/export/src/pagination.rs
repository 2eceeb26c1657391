//! Cursor-based pagination over GraphQL connections.
//!
//! A [`Paginator`] owns the cursor for exactly one connection instance (one
//! account's tours, one show's counts, ...). Sibling paginators never share
//! state, so any number of them can run concurrently.

use std::fmt;
use std::marker::PhantomData;

use graphql_client::QueryBody;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::client::{ApiClient, GraphQLRequest, Transport};
use crate::error::ExportError;

/// Pages fetched from one connection before the server is assumed stuck.
pub const MAX_PAGES_PER_SCOPE: usize = 10_000;

// =============================================================================
// Page path
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(usize),
}

/// Location of a connection inside a response's `data` object.
///
/// Written as a dotted path; numeric segments index into lists, e.g.
/// `show.settlements.0.mainCounts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePath {
    segments: Vec<Segment>,
}

impl PagePath {
    /// Walk `data` along the path.
    ///
    /// Returns `Ok(None)` when an indexed list is empty (e.g. a show with no
    /// settlement yet): the connection does not exist, which reads as an
    /// empty connection rather than a broken response.
    ///
    /// # Errors
    ///
    /// Returns a description of the first segment that could not be followed.
    pub fn locate<'v>(&self, data: &'v Value) -> Result<Option<&'v Value>, String> {
        let mut current = data;
        for (depth, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) => {
                    current = current
                        .get(name.as_str())
                        .filter(|v| !v.is_null())
                        .ok_or_else(|| format!("missing '{}'", self.prefix(depth + 1)))?;
                }
                Segment::Index(index) => {
                    let items = current
                        .as_array()
                        .ok_or_else(|| format!("expected a list at '{}'", self.prefix(depth)))?;
                    if items.is_empty() {
                        return Ok(None);
                    }
                    current = items.get(*index).ok_or_else(|| {
                        format!(
                            "index {index} out of bounds at '{}' (len {})",
                            self.prefix(depth),
                            items.len()
                        )
                    })?;
                }
            }
        }
        Ok(Some(current))
    }

    fn prefix(&self, len: usize) -> String {
        self.segments
            .iter()
            .take(len)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl From<&str> for PagePath {
    fn from(path: &str) -> Self {
        let segments = path
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<usize>()
                    .map_or_else(|_| Segment::Field(s.to_string()), Segment::Index)
            })
            .collect();
        Self { segments }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl fmt::Display for PagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix(self.segments.len()))
    }
}

// =============================================================================
// Pages
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    #[serde(default)]
    end_cursor: Option<String>,
}

/// One page of a connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<N> {
    /// Nodes in API order.
    pub nodes: Vec<N>,
    /// Cursor of the last node, if the server sent one.
    pub end_cursor: Option<String>,
    /// Whether more pages follow.
    pub has_next_page: bool,
}

impl<N> Page<N> {
    /// A final page with no nodes.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            end_cursor: None,
            has_next_page: false,
        }
    }
}

/// Decode the connection at `path` inside `data` into a typed page.
///
/// # Errors
///
/// Returns `ExportError::MalformedResponse` if the connection, its `pageInfo`
/// or its `nodes` are missing, if the nodes do not decode, or if the server
/// reports more pages without a cursor to fetch them.
pub fn extract_page<N: DeserializeOwned>(
    data: &Value,
    path: &PagePath,
    scope: &str,
) -> Result<Page<N>, ExportError> {
    let Some(connection) = path
        .locate(data)
        .map_err(|detail| ExportError::malformed(scope, detail))?
    else {
        return Ok(Page::empty());
    };

    let page_info = connection
        .get("pageInfo")
        .filter(|v| !v.is_null())
        .ok_or_else(|| ExportError::malformed(scope, format!("missing pageInfo at '{path}'")))?;
    let info = PageInfo::deserialize(page_info)
        .map_err(|e| ExportError::malformed(scope, format!("invalid pageInfo at '{path}': {e}")))?;

    let nodes = connection
        .get("nodes")
        .filter(|v| !v.is_null())
        .ok_or_else(|| ExportError::malformed(scope, format!("missing nodes at '{path}'")))?;
    let nodes = Vec::<N>::deserialize(nodes)
        .map_err(|e| ExportError::malformed(scope, format!("undecodable nodes at '{path}': {e}")))?;

    if info.has_next_page && info.end_cursor.is_none() {
        return Err(ExportError::malformed(
            scope,
            "hasNextPage is true but endCursor is null",
        ));
    }

    Ok(Page {
        nodes,
        end_cursor: info.end_cursor,
        has_next_page: info.has_next_page,
    })
}

// =============================================================================
// Queries
// =============================================================================

/// A connection query bound to one parent: document, fixed variables, where
/// the connection sits in the response, and a scope label for logs.
#[derive(Debug, Clone)]
pub struct PaginatedQuery {
    /// GraphQL operation name.
    pub operation: &'static str,
    /// GraphQL document.
    pub document: &'static str,
    /// Variables other than `first` and `cursor`.
    pub variables: Map<String, Value>,
    /// Location of the connection in `data`.
    pub path: PagePath,
    /// Human-readable connection instance, e.g. `tour tour_abc shows`.
    pub scope: String,
    /// Overrides the client's page size.
    pub page_size: Option<u32>,
}

impl PaginatedQuery {
    /// Create a query with no extra variables.
    #[must_use]
    pub fn new(
        operation: &'static str,
        document: &'static str,
        path: &str,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            document,
            variables: Map::new(),
            path: PagePath::from(path),
            scope: scope.into(),
            page_size: None,
        }
    }

    /// Add a fixed variable.
    #[must_use]
    pub fn variable(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.variables.insert(name.to_string(), value.into());
        self
    }

    /// Request a specific page size for this connection.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Build the request for the page after `cursor` (`None` = first page).
    #[must_use]
    pub fn request(&self, cursor: Option<&str>, default_page_size: u32) -> GraphQLRequest {
        let mut variables = self.variables.clone();
        variables.insert(
            "first".to_string(),
            Value::from(self.page_size.unwrap_or(default_page_size)),
        );
        variables.insert(
            "cursor".to_string(),
            cursor.map_or(Value::Null, |c| Value::String(c.to_string())),
        );
        QueryBody {
            variables: Value::Object(variables),
            query: self.document,
            operation_name: self.operation,
        }
    }
}

// =============================================================================
// Paginator
// =============================================================================

/// Lazily walks one connection page by page.
///
/// Finite: stops after a page with `hasNextPage: false`, and fails instead of
/// looping if the cursor stops advancing or the page cap is reached.
/// Restartable: [`Paginator::cursor`] can be saved and handed to
/// [`Paginator::resume`] on a fresh paginator.
pub struct Paginator<'c, T, N> {
    client: &'c ApiClient<T>,
    query: PaginatedQuery,
    cursor: Option<String>,
    exhausted: bool,
    pages: usize,
    max_pages: usize,
    _node: PhantomData<fn() -> N>,
}

impl<'c, T, N> Paginator<'c, T, N>
where
    T: Transport,
    N: DeserializeOwned,
{
    /// Start at the first page.
    #[must_use]
    pub const fn new(client: &'c ApiClient<T>, query: PaginatedQuery) -> Self {
        Self {
            client,
            query,
            cursor: None,
            exhausted: false,
            pages: 0,
            max_pages: MAX_PAGES_PER_SCOPE,
            _node: PhantomData,
        }
    }

    /// Continue after a previously saved cursor.
    #[must_use]
    pub fn resume(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    /// Change the page cap.
    #[must_use]
    pub const fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Cursor the next request will send.
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Whether the last page has been fetched.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Connection instance this paginator walks.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.query.scope
    }

    /// Fetch the next page, or `None` once the connection is exhausted.
    ///
    /// On error the cursor is left where it was, so calling again retries
    /// the same page.
    ///
    /// # Errors
    ///
    /// Propagates client errors; returns `ExportError::MalformedResponse` for
    /// bad connection shapes, a cursor that does not advance, or too many pages.
    pub async fn next_page(&mut self) -> Result<Option<Page<N>>, ExportError> {
        if self.exhausted {
            return Ok(None);
        }
        if self.pages >= self.max_pages {
            return Err(ExportError::malformed(
                &self.query.scope,
                format!(
                    "more than {} pages; hasNextPage never cleared",
                    self.max_pages
                ),
            ));
        }

        let request = self
            .query
            .request(self.cursor.as_deref(), self.client.page_size());
        let data = self.client.execute(&request, &self.query.scope).await?;
        let page: Page<N> = extract_page(&data, &self.query.path, &self.query.scope)?;

        if page.has_next_page {
            let next = page.end_cursor.clone();
            if next.is_some() && next == self.cursor {
                return Err(ExportError::malformed(
                    &self.query.scope,
                    "endCursor did not advance",
                ));
            }
            self.cursor = next;
        } else {
            self.exhausted = true;
        }
        self.pages += 1;

        debug!(
            scope = %self.query.scope,
            page = self.pages,
            nodes = page.nodes.len(),
            has_next_page = page.has_next_page,
            "Fetched page"
        );

        Ok(Some(page))
    }
}
