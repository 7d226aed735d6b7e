//! Account flows on top of the auth and token repositories.
//!
//! Password hashing and email delivery are collaborator traits supplied by
//! the caller. `forgot_password` answers the same way whether or not the
//! account exists.

mod error;
mod tokens;
mod types;

use std::sync::Arc;

use backoffice_core::collaborators::{EmailSender, PasswordHasher};
use backoffice_core::search::{SearchCondition, SearchOperator};
use backoffice_core::storage::{to_record, ListParams, Repository};
use chrono::Utc;
use serde_json::json;

use crate::models::{AccessToken, Auth, EmailVerificationRequired, Status};
use crate::repositories::{AuthRepository, EmailVerificationRepository, PasswordResetRepository};
use crate::storage::sqlite::format_datetime;
use crate::storage::SqliteDatabase;

pub use error::{AuthServiceError, Result};
pub use tokens::{calculate_expiry, email_to_name, generate_token, token_url, TOKEN_LENGTH};
pub use types::{
    AuthSettings, ForgotPasswordRequest, ResetPasswordRequest, SignInOutcome, SignInRequest,
    SignUpRequest,
};

pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";
pub const RESET_PASSWORD_PATH: &str = "/auth/reset-password";
pub const VERIFY_EMAIL_PATH: &str = "/auth/verify-email";

/// Upper bound on expired tokens removed per cleanup run.
const CLEANUP_BATCH: u64 = 1000;

pub struct AuthService {
    auth: AuthRepository,
    resets: PasswordResetRepository,
    verifications: EmailVerificationRepository,
    hasher: Arc<dyn PasswordHasher>,
    email: Arc<dyn EmailSender>,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(
        db: SqliteDatabase,
        hasher: Arc<dyn PasswordHasher>,
        email: Arc<dyn EmailSender>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            auth: AuthRepository::new(db.clone()),
            resets: PasswordResetRepository::new(db.clone()),
            verifications: EmailVerificationRepository::new(db),
            hasher,
            email,
            settings,
        }
    }

    pub fn auth_repository(&self) -> &AuthRepository {
        &self.auth
    }

    fn access_token(&self, account: &Auth) -> AccessToken {
        AccessToken {
            access_token: generate_token(),
            token_type: "Bearer".to_string(),
            expires_in: self.settings.access_token_ttl.num_seconds().max(0) as u64,
            id: account.id.clone(),
            permissions: account.permissions.clone(),
        }
    }

    pub async fn sign_in(&self, request: &SignInRequest) -> Result<SignInOutcome> {
        let Some(account) = self.auth.find_by_email(&request.email).await? else {
            return Err(AuthServiceError::InvalidCredentials);
        };
        if account.password.is_empty()
            || !self.hasher.verify(&request.password, &account.password)?
        {
            return Err(AuthServiceError::InvalidCredentials);
        }
        if !account.is_active {
            return Err(AuthServiceError::AccountDisabled);
        }
        if self.settings.require_verified_email && !account.email_verified {
            return Ok(SignInOutcome::VerificationRequired(EmailVerificationRequired {
                email_verification_required: true,
                message: "Please verify your email address before signing in.".to_string(),
            }));
        }

        tracing::info!(user_id = %account.id, "Signed in");
        Ok(SignInOutcome::Token(self.access_token(&account)))
    }

    /// Creates the account and sends a verification email. A failed email is
    /// logged; the account is still created.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<AccessToken> {
        if self.auth.find_by_email(&request.email).await?.is_some() {
            return Err(AuthServiceError::AlreadyRegistered);
        }

        let name = request
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email_to_name(&request.email));
        let password = self.hasher.hash(&request.password)?;
        let account = self
            .auth
            .create(to_record(json!({
                "email": request.email,
                "password": password,
                "name": name,
                "permissions": [],
            }))?)
            .await?;

        if let Err(e) = self.send_verification(&account.id).await {
            tracing::warn!(user_id = %account.id, error = %e, "Verification email not sent");
        }

        tracing::info!(user_id = %account.id, "Signed up");
        Ok(self.access_token(&account))
    }

    /// Always the same success status, whether or not the account exists or
    /// the email could be sent.
    pub async fn forgot_password(&self, request: &ForgotPasswordRequest) -> Status {
        if let Err(e) = self.send_reset_link(&request.email).await {
            tracing::error!(error = %e, "Password reset request failed");
        }
        Status::ok(FORGOT_PASSWORD_MESSAGE)
    }

    async fn send_reset_link(&self, email: &str) -> Result<()> {
        let Some(account) = self.auth.find_by_email(email).await? else {
            return Ok(());
        };

        self.resets.delete_user_tokens(&account.id).await;
        let now = Utc::now();
        let reset = self
            .resets
            .create(to_record(json!({
                "userId": account.id,
                "token": generate_token(),
                "expiresAt": format_datetime(&calculate_expiry(now, self.settings.reset_ttl)),
                "usedAt": null,
            }))?)
            .await?;

        let url = token_url(&self.settings.app_url, RESET_PASSWORD_PATH, &reset.token);
        self.email.send_password_reset_email(&account.email, &url).await?;
        Ok(())
    }

    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<Status> {
        let reset = self
            .resets
            .find_by_token(&request.token)
            .await
            .filter(|r| r.is_usable(Utc::now()))
            .ok_or(AuthServiceError::InvalidResetToken)?;

        let account = match self.auth.find_by_id(&reset.user_id).await {
            Ok(account) => account,
            Err(e) if e.is_not_found() => return Err(AuthServiceError::InvalidResetToken),
            Err(e) => return Err(e.into()),
        };
        if account.email != request.email {
            return Err(AuthServiceError::InvalidResetToken);
        }

        let password = self.hasher.hash(&request.password)?;
        self.auth
            .update(&account.id, to_record(json!({ "password": password }))?)
            .await?;
        self.resets
            .update(&reset.id, to_record(json!({ "usedAt": format_datetime(&Utc::now()) }))?)
            .await?;
        self.resets.delete_user_tokens(&account.id).await;

        tracing::info!(user_id = %account.id, "Password reset");
        Ok(Status::ok("Password has been reset successfully."))
    }

    /// Issues a fresh verification token and emails the link.
    pub async fn send_verification(&self, user_id: &str) -> Result<Status> {
        let account = self.auth.find_by_id(user_id).await?;
        if account.email_verified {
            return Ok(Status::ok("Email is already verified."));
        }

        self.verifications.delete_user_tokens(&account.id).await;
        let expires_at = calculate_expiry(Utc::now(), self.settings.verification_ttl);
        let verification = self
            .verifications
            .create(to_record(json!({
                "userId": account.id,
                "token": generate_token(),
                "expiresAt": format_datetime(&expires_at),
            }))?)
            .await?;

        let url = token_url(&self.settings.app_url, VERIFY_EMAIL_PATH, &verification.token);
        self.email.send_verification_email(&account.email, &url).await?;
        Ok(Status::ok("Verification email has been sent."))
    }

    pub async fn verify_email(&self, token: &str) -> Result<Status> {
        let verification = self
            .verifications
            .find_by_token(token)
            .await
            .filter(|v| !v.is_expired(Utc::now()))
            .ok_or(AuthServiceError::InvalidVerificationToken)?;

        self.auth
            .update(&verification.user_id, to_record(json!({ "emailVerified": true }))?)
            .await?;
        self.verifications.delete_user_tokens(&verification.user_id).await;

        tracing::info!(user_id = %verification.user_id, "Email verified");
        Ok(Status::ok("Email has been verified."))
    }

    pub async fn change_password(&self, user_id: &str, current: &str, new: &str) -> Result<Auth> {
        let account = self.auth.find_by_id(user_id).await?;
        if !self.hasher.verify(current, &account.password)? {
            return Err(AuthServiceError::InvalidCurrentPassword);
        }
        let password = self.hasher.hash(new)?;
        Ok(self
            .auth
            .update(user_id, to_record(json!({ "password": password }))?)
            .await?)
    }

    /// Removes expired password reset tokens. Best-effort; returns how many
    /// were deleted.
    pub async fn cleanup_expired_tokens(&self) -> usize {
        let params = ListParams::new(0, CLEANUP_BATCH).condition(SearchCondition::new(
            "expiresAt",
            SearchOperator::Lt,
            format_datetime(&Utc::now()),
        ));
        let expired = match self.resets.get(params).await {
            Ok(page) => page.data,
            Err(e) => {
                tracing::error!(error = %e, "Listing expired reset tokens failed");
                return 0;
            }
        };

        let mut deleted = 0;
        for reset in &expired {
            match self.resets.delete(&reset.id).await {
                Ok(()) => deleted += 1,
                Err(e) => {
                    tracing::warn!(id = %reset.id, error = %e, "Deleting expired token failed")
                }
            }
        }
        tracing::info!(deleted, "Cleaned up expired reset tokens");
        deleted
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use backoffice_core::collaborators::{self, CollaboratorError};
    use chrono::Duration;

    use super::*;

    struct PrefixHasher;

    impl PasswordHasher for PrefixHasher {
        fn hash(&self, plain: &str) -> collaborators::Result<String> {
            Ok(format!("hashed:{plain}"))
        }

        fn verify(&self, plain: &str, hash: &str) -> collaborators::Result<bool> {
            Ok(hash == format!("hashed:{plain}"))
        }
    }

    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl Outbox {
        fn last_token(&self) -> String {
            let sent = self.sent.lock().unwrap();
            let (_, url) = sent.last().unwrap();
            url.split("token=").nth(1).unwrap().to_string()
        }

        fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }

        fn record(&self, to: &str, url: &str) -> collaborators::Result<()> {
            if self.fail {
                return Err(CollaboratorError::Email("smtp down".to_string()));
            }
            self.sent.lock().unwrap().push((to.to_string(), url.to_string()));
            Ok(())
        }
    }

    #[async_trait]
    impl EmailSender for Outbox {
        async fn send_password_reset_email(
            &self,
            to: &str,
            url: &str,
        ) -> collaborators::Result<()> {
            self.record(to, url)
        }

        async fn send_verification_email(&self, to: &str, url: &str) -> collaborators::Result<()> {
            self.record(to, url)
        }
    }

    async fn service_with(outbox: Arc<Outbox>, settings: AuthSettings) -> AuthService {
        let db = SqliteDatabase::open_in_memory().await.unwrap();
        AuthService::new(db, Arc::new(PrefixHasher), outbox, settings)
    }

    async fn service() -> (AuthService, Arc<Outbox>) {
        let outbox = Arc::new(Outbox::default());
        let service = service_with(outbox.clone(), AuthSettings::new("http://app.test")).await;
        (service, outbox)
    }

    fn sign_up(email: &str) -> SignUpRequest {
        SignUpRequest {
            email: email.to_string(),
            password: "secret".to_string(),
            name: None,
        }
    }

    fn sign_in(email: &str, password: &str) -> SignInRequest {
        SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let (service, outbox) = service().await;

        let token = service.sign_up(&sign_up("ann@example.com")).await.unwrap();
        let outcome = service.sign_in(&sign_in("ann@example.com", "secret")).await.unwrap();

        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 3600);
        assert_eq!(token.access_token.len(), TOKEN_LENGTH);
        let SignInOutcome::Token(signed_in) = outcome else {
            panic!("expected an access token");
        };
        assert_eq!(signed_in.id, token.id);
        assert_eq!(outbox.count(), 1);

        let account = service.auth_repository().find_by_id(&token.id).await.unwrap();
        assert_eq!(account.name, "ann");
        assert_eq!(account.password, "hashed:secret");
    }

    #[tokio::test]
    async fn test_sign_in_rejects_bad_credentials() {
        let (service, _) = service().await;
        service.sign_up(&sign_up("ann@example.com")).await.unwrap();

        assert!(matches!(
            service.sign_in(&sign_in("ann@example.com", "wrong")).await,
            Err(AuthServiceError::InvalidCredentials)
        ));
        assert!(matches!(
            service.sign_in(&sign_in("bob@example.com", "secret")).await,
            Err(AuthServiceError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_sign_up_twice_is_rejected() {
        let (service, _) = service().await;
        service.sign_up(&sign_up("ann@example.com")).await.unwrap();

        assert!(matches!(
            service.sign_up(&sign_up("ann@example.com")).await,
            Err(AuthServiceError::AlreadyRegistered)
        ));
    }

    #[tokio::test]
    async fn test_sign_up_survives_email_failure() {
        let outbox = Arc::new(Outbox {
            fail: true,
            ..Outbox::default()
        });
        let service = service_with(outbox, AuthSettings::new("http://app.test")).await;

        assert!(service.sign_up(&sign_up("ann@example.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_unverified_sign_in_requires_verification() {
        let outbox = Arc::new(Outbox::default());
        let settings = AuthSettings::new("http://app.test").require_verified_email(true);
        let service = service_with(outbox.clone(), settings).await;
        service.sign_up(&sign_up("ann@example.com")).await.unwrap();

        let outcome = service.sign_in(&sign_in("ann@example.com", "secret")).await.unwrap();
        assert!(matches!(outcome, SignInOutcome::VerificationRequired(_)));

        service.verify_email(&outbox.last_token()).await.unwrap();
        let outcome = service.sign_in(&sign_in("ann@example.com", "secret")).await.unwrap();
        assert!(matches!(outcome, SignInOutcome::Token(_)));
    }

    #[tokio::test]
    async fn test_forgot_password_is_generic() {
        let (service, outbox) = service().await;
        service.sign_up(&sign_up("ann@example.com")).await.unwrap();

        let known = service
            .forgot_password(&ForgotPasswordRequest { email: "ann@example.com".to_string() })
            .await;
        let unknown = service
            .forgot_password(&ForgotPasswordRequest { email: "who@example.com".to_string() })
            .await;

        assert_eq!(known, unknown);
        assert_eq!(known, Status::ok(FORGOT_PASSWORD_MESSAGE));
        assert_eq!(outbox.count(), 2);
        let sent = outbox.sent.lock().unwrap();
        assert!(sent[1].1.starts_with("http://app.test/auth/reset-password?token="));
    }

    #[tokio::test]
    async fn test_reset_password_flow() {
        let (service, outbox) = service().await;
        service.sign_up(&sign_up("ann@example.com")).await.unwrap();
        service
            .forgot_password(&ForgotPasswordRequest { email: "ann@example.com".to_string() })
            .await;
        let token = outbox.last_token();

        let wrong_email = ResetPasswordRequest {
            token: token.clone(),
            email: "bob@example.com".to_string(),
            password: "new".to_string(),
        };
        assert!(matches!(
            service.reset_password(&wrong_email).await,
            Err(AuthServiceError::InvalidResetToken)
        ));

        let request = ResetPasswordRequest {
            email: "ann@example.com".to_string(),
            ..wrong_email
        };
        let status = service.reset_password(&request).await.unwrap();
        assert!(status.success);
        assert!(service.sign_in(&sign_in("ann@example.com", "new")).await.is_ok());

        assert!(matches!(
            service.reset_password(&request).await,
            Err(AuthServiceError::InvalidResetToken)
        ));
    }

    #[tokio::test]
    async fn test_expired_reset_token_is_rejected() {
        let outbox = Arc::new(Outbox::default());
        let mut settings = AuthSettings::new("http://app.test");
        settings.reset_ttl = Duration::seconds(-1);
        let service = service_with(outbox.clone(), settings).await;
        service.sign_up(&sign_up("ann@example.com")).await.unwrap();
        service
            .forgot_password(&ForgotPasswordRequest { email: "ann@example.com".to_string() })
            .await;

        let request = ResetPasswordRequest {
            token: outbox.last_token(),
            email: "ann@example.com".to_string(),
            password: "new".to_string(),
        };

        assert!(matches!(
            service.reset_password(&request).await,
            Err(AuthServiceError::InvalidResetToken)
        ));
        assert_eq!(service.cleanup_expired_tokens().await, 1);
    }

    #[tokio::test]
    async fn test_verify_email_and_resend() {
        let (service, outbox) = service().await;
        let token = service.sign_up(&sign_up("ann@example.com")).await.unwrap();
        let first = outbox.last_token();

        service.send_verification(&token.id).await.unwrap();
        let second = outbox.last_token();
        assert_ne!(first, second);

        assert!(matches!(
            service.verify_email(&first).await,
            Err(AuthServiceError::InvalidVerificationToken)
        ));
        service.verify_email(&second).await.unwrap();

        let account = service.auth_repository().find_by_id(&token.id).await.unwrap();
        assert!(account.email_verified);
        assert_eq!(
            service.send_verification(&token.id).await.unwrap(),
            Status::ok("Email is already verified.")
        );
    }

    #[tokio::test]
    async fn test_change_password_checks_current() {
        let (service, _) = service().await;
        let token = service.sign_up(&sign_up("ann@example.com")).await.unwrap();

        assert!(matches!(
            service.change_password(&token.id, "wrong", "next").await,
            Err(AuthServiceError::InvalidCurrentPassword)
        ));
        let updated = service.change_password(&token.id, "secret", "next").await.unwrap();
        assert_eq!(updated.password, "hashed:next");
    }
}
