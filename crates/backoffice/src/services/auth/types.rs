use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::models::{AccessToken, EmailVerificationRequired};

#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub email: String,
    pub password: String,
}

/// Result of a sign-in with valid credentials.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SignInOutcome {
    Token(AccessToken),
    VerificationRequired(EmailVerificationRequired),
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Base URL links in emails point at.
    pub app_url: String,
    pub reset_ttl: Duration,
    pub verification_ttl: Duration,
    pub access_token_ttl: Duration,
    /// Refuse access tokens until the email address is verified.
    pub require_verified_email: bool,
}

impl AuthSettings {
    pub fn new(app_url: impl Into<String>) -> Self {
        Self {
            app_url: app_url.into(),
            reset_ttl: Duration::hours(1),
            verification_ttl: Duration::hours(24),
            access_token_ttl: Duration::hours(1),
            require_verified_email: false,
        }
    }

    pub fn require_verified_email(mut self, required: bool) -> Self {
        self.require_verified_email = required;
        self
    }
}
