use backoffice_core::collaborators::CollaboratorError;
use backoffice_core::storage::RepositoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthServiceError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is disabled")]
    AccountDisabled,

    #[error("an account with this email already exists")]
    AlreadyRegistered,

    #[error("invalid or expired reset token")]
    InvalidResetToken,

    #[error("invalid or expired verification token")]
    InvalidVerificationToken,

    #[error("current password does not match")]
    InvalidCurrentPassword,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

pub type Result<T> = std::result::Result<T, AuthServiceError>;
