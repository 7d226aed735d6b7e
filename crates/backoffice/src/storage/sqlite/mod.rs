//! SQLite storage backend implementation.
//!
//! This module provides the relational backend using `rusqlite` for
//! synchronous operations and `tokio-rusqlite` for async wrapping. Conditions
//! become a [`Filter`] tree that is rendered to parameterized SQL.

mod conversions;
mod error;
mod filter;
mod repository;
mod schema;

pub use conversions::format_datetime;
pub use filter::{build_filter, Filter};
pub use repository::{SqliteBackend, SqliteDatabase};
pub use schema::{Column, ColumnKind, Model, TableDef};
