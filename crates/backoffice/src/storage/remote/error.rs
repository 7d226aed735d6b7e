//! Remote API error mapping.
//!
//! Maps `ClientError` from `backoffice_client` to `RepositoryError`.

use backoffice_client::ClientError;
use backoffice_core::storage::RepositoryError;

/// Maps a client error to a RepositoryError.
///
/// # Error Mapping
///
/// - 401 / 403 → `RepositoryError::Auth`
/// - 404 → `RepositoryError::NotFound` (with `id` when known)
/// - Other non-2xx → `RepositoryError::Api` with the response status
/// - Undecodable bodies → `RepositoryError::Serialization`
/// - Transport failures → `RepositoryError::ConnectionFailed`
pub fn map_client_error(err: ClientError, id: Option<&str>) -> RepositoryError {
    match err {
        ClientError::Unauthorized { message, .. } => RepositoryError::Auth(message),
        ClientError::NotFound { resource } => {
            RepositoryError::not_found(id.map_or(resource, str::to_string))
        }
        ClientError::ServerError { status, message } => RepositoryError::Api { status, message },
        ClientError::InvalidResponse(message) => RepositoryError::Serialization(message),
        ClientError::Json(e) => RepositoryError::Serialization(e.to_string()),
        ClientError::Request(e) if e.is_decode() => RepositoryError::Serialization(e.to_string()),
        ClientError::Request(e) => RepositoryError::ConnectionFailed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_to_auth() {
        let err = ClientError::Unauthorized {
            status: 403,
            message: "Unauthorized".to_string(),
        };
        assert_eq!(
            map_client_error(err, None),
            RepositoryError::Auth("Unauthorized".to_string())
        );
    }

    #[test]
    fn test_not_found_prefers_known_id() {
        let err = ClientError::NotFound {
            resource: "/admin/users/u1".to_string(),
        };
        assert_eq!(
            map_client_error(err, Some("u1")),
            RepositoryError::not_found("u1")
        );
    }

    #[test]
    fn test_server_error_keeps_status() {
        let err = ClientError::ServerError {
            status: 418,
            message: "teapot".to_string(),
        };
        assert_eq!(
            map_client_error(err, None),
            RepositoryError::Api {
                status: 418,
                message: "teapot".to_string(),
            }
        );
    }
}
