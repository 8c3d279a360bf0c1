//! Identifire storage layer
//!
//! The [`Store`] trait is the only way the rest of the workspace touches
//! persisted data. It exposes:
//!
//! - **Chain queries**: one join per request that walks workspace → view →
//!   visualisation and returns the owner email beside the target row
//! - **Writes**: create / update / delete for the three owned entities
//! - **Reference reads**: measurements, locations and measurement records
//!
//! # Implementations
//!
//! - [`PgStore`]: PostgreSQL through `sqlx`, with embedded migrations
//! - [`MemStore`]: in-memory tables with the same constraints, for tests and
//!   local development
//! - `MockStore` (feature `mock`): `mockall` double for call-count assertions
//!
//! Rows are decoded into `idf_model` records here and nowhere else.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod interface;
pub mod mem;
pub mod postgres;
mod rows;

pub use error::{Result, StoreError};
pub use interface::{ChainRow, Owned, Store};
#[cfg(any(test, feature = "mock"))]
pub use interface::MockStore;
pub use mem::MemStore;
pub use postgres::{PgConnectionOptions, PgStore};
pub use rows::quote_ident;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
