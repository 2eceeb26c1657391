//! Core types for atVenu exports.
//!
//! This module provides type-safe wrappers for the entities returned by the
//! atVenu GraphQL API.

pub mod account;
pub mod date_range;
pub mod id;
pub mod settlement;
pub mod show;
pub mod transaction;

pub use account::{Account, Tour};
pub use date_range::{DateRange, DateRangeError};
pub use id::*;
pub use settlement::{Count, MerchAdd, MerchItem, MerchVariant, ProductType};
pub use show::{CurrencyFormat, Location, Show};
pub use transaction::{Modifier, Transaction};
