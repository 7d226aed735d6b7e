//! backoffice_core - backend-neutral persistence contract.
//!
//! Everything in this crate is free of backend I/O: the schema contracts that
//! guard the persistence boundary, the search condition language, the
//! repository contract every backend implements, and the contracts of the
//! collaborators the application consumes.

pub mod collaborators;
pub mod schema;
pub mod search;
pub mod storage;
