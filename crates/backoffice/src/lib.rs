//! Administrative data management over pluggable storage backends.
//!
//! Domain repositories bind an entity's schema to one of four backends
//! (SQLite, a remote REST API, an Airtable-style tabular API or a directory
//! of JSON documents) behind the `Repository` contract from
//! `backoffice_core`.

pub mod app;
pub mod cli;
pub mod config;
pub mod models;
pub mod output;
pub mod repositories;
pub mod services;
pub mod storage;
