//! Repositories for single-use tokens tied to a user.

use async_trait::async_trait;
use backoffice_core::search::SearchCondition;
use backoffice_core::storage::{
    from_record, Entity, EntityRepository, ListParams, Page, Record, Repository, Result,
};

use crate::models::{EmailVerification, PasswordReset};
use crate::storage::{Model, SqliteBackend, SqliteDatabase};

/// Page size used when collecting a user's tokens for deletion.
const USER_TOKEN_BATCH: u64 = 100;

/// A token row: looked up by its value, owned by a user.
pub trait TokenRecord: Entity {
    const MODEL: Model;

    fn id(&self) -> &str;
}

impl TokenRecord for PasswordReset {
    const MODEL: Model = Model::PasswordReset;

    fn id(&self) -> &str {
        &self.id
    }
}

impl TokenRecord for EmailVerification {
    const MODEL: Model = Model::EmailVerification;

    fn id(&self) -> &str {
        &self.id
    }
}

pub struct TokenRepository<T: TokenRecord> {
    inner: EntityRepository<T, SqliteBackend>,
}

pub type PasswordResetRepository = TokenRepository<PasswordReset>;
pub type EmailVerificationRepository = TokenRepository<EmailVerification>;

impl<T: TokenRecord> TokenRepository<T> {
    pub fn new(db: SqliteDatabase) -> Self {
        Self {
            inner: EntityRepository::new(SqliteBackend::new(db, T::MODEL), from_record, &["token"]),
        }
    }

    /// The row holding `token`, or `None`. Lookup failures are logged and
    /// reported as absent.
    pub async fn find_by_token(&self, token: &str) -> Option<T> {
        let params = ListParams::new(0, 1).condition(SearchCondition::eq("token", token));
        match self.inner.get(params).await {
            Ok(page) => page.data.into_iter().next(),
            Err(e) => {
                tracing::error!(entity = T::NAME, error = %e, "Token lookup failed");
                None
            }
        }
    }

    /// Deletes the user's tokens one by one. Best-effort: a failed delete is
    /// logged and the rest still run. Returns how many rows were removed.
    pub async fn delete_user_tokens(&self, user_id: &str) -> usize {
        let params =
            ListParams::new(0, USER_TOKEN_BATCH).condition(SearchCondition::eq("userId", user_id));
        let tokens = match self.inner.get(params).await {
            Ok(page) => page.data,
            Err(e) => {
                tracing::error!(
                    entity = T::NAME,
                    user_id,
                    error = %e,
                    "Listing user tokens failed"
                );
                return 0;
            }
        };

        let mut deleted = 0;
        for token in &tokens {
            match self.inner.delete(token.id()).await {
                Ok(()) => deleted += 1,
                Err(e) => {
                    tracing::warn!(
                        entity = T::NAME,
                        id = token.id(),
                        error = %e,
                        "Deleting token failed"
                    )
                }
            }
        }
        deleted
    }
}

#[async_trait]
impl<T: TokenRecord> Repository<T> for TokenRepository<T> {
    async fn get(&self, params: ListParams) -> Result<Page<T>> {
        self.inner.get(params).await
    }

    async fn find_by_id(&self, id: &str) -> Result<T> {
        self.inner.find_by_id(id).await
    }

    async fn create(&self, data: Record) -> Result<T> {
        self.inner.create(data).await
    }

    async fn update(&self, id: &str, data: Record) -> Result<T> {
        self.inner.update(id, data).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.inner.delete(id).await
    }
}
