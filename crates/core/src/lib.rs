//! atVenu Export Core - Shared domain types.
//!
//! This crate provides the entity snapshots used across the export tools:
//! - `export` - Fetches, merges, flattens and writes atVenu data
//! - `cli` - Command-line entry point for the export runs
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Entities are
//! deserialized straight from the API's camelCase JSON nodes; child
//! collections are never part of a node and are attached by value once their
//! own pagination completes.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, the account/tour/show tree, leaf entities and
//!   the show date filter

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
