//! Local document error mapping.
//!
//! Maps `std::io::Error` and `serde_json::Error` to `RepositoryError`.

use std::io::ErrorKind;
use std::path::Path;

use backoffice_core::storage::RepositoryError;

/// Maps an I/O error on `path` to a RepositoryError.
///
/// # Error Mapping
///
/// - Missing or unreadable directory/file → `RepositoryError::ConnectionFailed`
/// - Invalid UTF-8 or data → `RepositoryError::Serialization`
/// - All other errors → `RepositoryError::QueryFailed`
pub fn map_io_error(err: std::io::Error, path: &Path) -> RepositoryError {
    let path = path.display();
    match err.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => {
            RepositoryError::ConnectionFailed(format!("Cannot read {path}: {err}"))
        }
        ErrorKind::InvalidData => RepositoryError::Serialization(format!("{path}: {err}")),
        _ => RepositoryError::QueryFailed(format!("{path}: {err}")),
    }
}

/// Maps a document parse failure on `path` to a RepositoryError.
pub fn map_parse_error(err: serde_json::Error, path: &Path) -> RepositoryError {
    RepositoryError::Serialization(format!("{}: {err}", path.display()))
}
