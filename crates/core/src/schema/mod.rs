//! Schema contracts for values crossing the persistence boundary.

mod error;
mod types;

pub use error::{IssueKind, ValidationError, ValidationIssue};
pub use types::{Field, FieldType, Schema};
