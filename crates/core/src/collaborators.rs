//! Contracts for the boundaries the persistence layer consumes but does not
//! implement: authentication, password hashing, email delivery and blob
//! storage.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by collaborator implementations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Email delivery failed: {0}")]
    Email(String),
    #[error("Blob not found: {0}")]
    BlobNotFound(String),
    #[error("Blob storage failed: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, CollaboratorError>;

/// The authenticated caller, as supplied by the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    pub user_id: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl AuthContext {
    pub fn new(user_id: impl Into<String>, permissions: Vec<String>) -> Self {
        Self {
            user_id: user_id.into(),
            permissions,
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// One-way password hashing.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String>;

    fn verify(&self, plain: &str, hash: &str) -> Result<bool>;
}

/// Outbound transactional email.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_password_reset_email(&self, to: &str, url: &str) -> Result<()>;

    async fn send_verification_email(&self, to: &str, url: &str) -> Result<()>;
}

/// Key-addressed blob storage (S3-like).
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    async fn download(&self, key: &str) -> Result<Vec<u8>>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Keys starting with `prefix`, in lexicographic order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// A time-limited URL for direct download.
    async fn signed_url(&self, key: &str, expires_in: Duration) -> Result<String>;
}
