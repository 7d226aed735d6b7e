//! backoffice_client - HTTP client for the backoffice admin API.

pub mod client;
pub mod error;

pub use client::{ApiClient, NO_QUERY};
pub use error::{ClientError, Result};
