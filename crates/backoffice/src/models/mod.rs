//! Domain entities and their schema contracts.

mod access_token;
mod auth;
mod email_verification;
mod password_reset;
mod status;
mod user;

pub use access_token::{AccessToken, EmailVerificationRequired};
pub use auth::Auth;
pub use email_verification::EmailVerification;
pub use password_reset::PasswordReset;
pub use status::Status;
pub use user::User;
