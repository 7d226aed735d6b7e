//! Storage backend implementations.
//!
//! Each backend implements the `Backend` strategy trait from
//! `backoffice_core::storage`. A domain repository is an
//! [`EntityRepository`] over one of them:
//!
//! - `sqlite`: relational tables through `rusqlite` and `tokio-rusqlite`
//! - `remote`: a REST API through `backoffice_client`
//! - `tabular`: an Airtable-style spreadsheet API
//! - `local`: a directory of JSON documents (mutations are not persisted)

pub mod local;
mod path;
pub mod remote;
pub mod sqlite;
pub mod tabular;

pub use backoffice_core::storage::{Backend, EntityRepository, Repository};
pub use local::LocalBackend;
pub use remote::RemoteBackend;
pub use sqlite::{Model, SqliteBackend, SqliteDatabase};
pub use tabular::{TabularBackend, TabularConfig};
