//! Domain repositories: entity, backend, transform and search fields bound
//! together, plus the few convenience lookups callers need.

mod auth;
mod token;
mod user;

pub use auth::{AuthRepository, AUTH_SEARCH_FIELDS};
pub use token::{EmailVerificationRepository, PasswordResetRepository, TokenRecord, TokenRepository};
pub use user::{UserRepository, ME_PATH, USERS_ENDPOINT, USER_SEARCH_FIELDS};
