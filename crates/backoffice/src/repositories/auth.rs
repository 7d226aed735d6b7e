use async_trait::async_trait;
use backoffice_core::collaborators::AuthContext;
use backoffice_core::search::SearchCondition;
use backoffice_core::storage::{
    from_record, EntityRepository, ListParams, Page, Record, Repository, RepositoryError, Result,
};

use crate::models::Auth;
use crate::storage::{Model, SqliteBackend, SqliteDatabase};

pub const AUTH_SEARCH_FIELDS: &[&str] = &["name", "email"];

/// Credential rows, stored in the relational `users` table.
pub struct AuthRepository {
    inner: EntityRepository<Auth, SqliteBackend>,
}

impl AuthRepository {
    pub fn new(db: SqliteDatabase) -> Self {
        Self {
            inner: EntityRepository::new(
                SqliteBackend::new(db, Model::User),
                from_record,
                AUTH_SEARCH_FIELDS,
            ),
        }
    }

    /// The account of the authenticated caller.
    pub async fn get_me(&self, context: &AuthContext) -> Result<Auth> {
        if context.user_id.trim().is_empty() {
            return Err(RepositoryError::Auth("Unauthorized".to_string()));
        }
        self.inner.find_by_id(&context.user_id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Auth>> {
        let page = self
            .inner
            .get(ListParams::new(0, 1).condition(SearchCondition::eq("email", email)))
            .await?;
        Ok(page.data.into_iter().next())
    }
}

#[async_trait]
impl Repository<Auth> for AuthRepository {
    async fn get(&self, params: ListParams) -> Result<Page<Auth>> {
        self.inner.get(params).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Auth> {
        self.inner.find_by_id(id).await
    }

    async fn create(&self, data: Record) -> Result<Auth> {
        self.inner.create(data).await
    }

    async fn update(&self, id: &str, data: Record) -> Result<Auth> {
        self.inner.update(id, data).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.inner.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use backoffice_core::storage::to_record;
    use serde_json::json;

    use super::*;

    async fn repository() -> AuthRepository {
        AuthRepository::new(SqliteDatabase::open_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_create_applies_column_defaults() {
        let repo = repository().await;

        let auth = repo
            .create(to_record(json!({ "email": "ann@example.com", "password": "hash" })).unwrap())
            .await
            .unwrap();

        assert_eq!(auth.name, "");
        assert!(auth.permissions.is_empty());
        assert!(auth.is_active);
        assert!(!auth.email_verified);
    }

    #[tokio::test]
    async fn test_find_by_email_and_get_me() {
        let repo = repository().await;
        let created = repo
            .create(to_record(json!({ "email": "ann@example.com", "name": "Ann" })).unwrap())
            .await
            .unwrap();

        let found = repo.find_by_email("ann@example.com").await.unwrap();
        let missing = repo.find_by_email("bob@example.com").await.unwrap();
        let me = repo
            .get_me(&AuthContext::new(created.id.clone(), vec![]))
            .await
            .unwrap();

        assert_eq!(found.map(|a| a.id), Some(created.id.clone()));
        assert_eq!(missing, None);
        assert_eq!(me.name, "Ann");
    }

    #[tokio::test]
    async fn test_get_me_without_user_is_unauthorized() {
        let repo = repository().await;

        let err = repo.get_me(&AuthContext::new("", vec![])).await.unwrap_err();

        assert!(matches!(err, RepositoryError::Auth(_)));
    }

    #[tokio::test]
    async fn test_duplicate_email_already_exists() {
        let repo = repository().await;
        let data = to_record(json!({ "email": "ann@example.com" })).unwrap();
        repo.create(data.clone()).await.unwrap();

        let err = repo.create(data).await.unwrap_err();

        assert!(matches!(err, RepositoryError::AlreadyExists { entity_type: "Auth", .. }));
    }
}
