//! atVenu Export library.
//!
//! Fetches an organization's accounts, tours, shows and per-show leaf
//! collections from the atVenu GraphQL API, assembles them into one tree,
//! flattens the tree into fixed-schema records and writes them to CSV.
//!
//! # Architecture
//!
//! - [`client`] - Transport seam, rate-bounded and retried request execution
//! - [`pagination`] - Cursor-driven page walks over one connection instance
//! - [`merge`] - Page accumulation and by-value attachment to parents
//! - [`tree`] - Concurrent, order-preserving tree assembly
//! - [`flatten`] - Pure tree-to-record conversion
//! - [`export`] - CSV writing with overwrite and append modes
//! - [`changes`] - New-show detection against an earlier listing
//! - [`pipeline`] - The runs the CLI exposes
//!
//! # Security
//!
//! The API key is held in a `SecretString` and only exposed when building the
//! `x-api-key` header.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod changes;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod flatten;
pub mod merge;
pub mod pagination;
pub mod pipeline;
pub mod queries;
pub mod retry;
pub mod tree;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use changes::{ShowChangeRecord, new_shows, read_show_listing};
pub use client::{ApiClient, GraphQLRequest, HttpTransport, Transport};
pub use config::{ClientOptions, ConfigError, ExportConfig};
pub use error::{ExportError, GraphQLError, TransportError};
pub use export::{AppendSession, CsvRecord, ExportMode, export_to_csv};
pub use merge::{Connection, Node, Parent, merge_connection};
pub use pagination::{Page, PagePath, PaginatedQuery, Paginator};
pub use pipeline::{ChangeReport, RunScope, RunSummary};
pub use retry::RetryPolicy;
pub use tree::{LeafKind, TreeBuilder, TreeOptions};
