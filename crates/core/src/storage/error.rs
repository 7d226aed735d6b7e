use thiserror::Error;

use crate::schema::ValidationError;

/// Entity name used by backends that do not know which entity they serve.
pub const UNKNOWN_ENTITY: &str = "Record";

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Unauthorized: {0}")]
    Auth(String),
    #[error("Remote API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("The {backend} backend does not support {capability}")]
    Unsupported {
        backend: &'static str,
        capability: &'static str,
    },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl RepositoryError {
    /// A not-found error for a backend that does not know its entity name.
    pub fn not_found(id: impl Into<String>) -> Self {
        RepositoryError::NotFound {
            entity_type: UNKNOWN_ENTITY,
            id: id.into(),
        }
    }

    /// Attributes identity errors to `entity_type`. Other variants pass
    /// through untouched.
    pub fn for_entity(self, entity_type: &'static str) -> Self {
        match self {
            RepositoryError::NotFound { id, .. } => RepositoryError::NotFound { entity_type, id },
            RepositoryError::AlreadyExists { id, .. } => {
                RepositoryError::AlreadyExists { entity_type, id }
            }
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
