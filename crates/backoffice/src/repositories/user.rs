use std::path::PathBuf;

use async_trait::async_trait;
use backoffice_client::ApiClient;
use backoffice_core::storage::{
    from_record, identity, Entity, EntityRepository, ListParams, Page, Record, Repository,
    RepositoryError, Result,
};

use crate::models::User;
use crate::storage::tabular::flatten;
use crate::storage::{
    LocalBackend, Model, RemoteBackend, SqliteBackend, SqliteDatabase, TabularBackend,
    TabularConfig,
};

pub const USERS_ENDPOINT: &str = "/admin/users";
pub const ME_PATH: &str = "/me";
pub const USER_SEARCH_FIELDS: &[&str] = &["name", "email"];

/// Users behind whichever backend the deployment is configured with.
pub struct UserRepository {
    inner: Box<dyn Repository<User>>,
    remote: Option<RemoteBackend>,
}

impl UserRepository {
    pub fn remote(client: ApiClient) -> Self {
        let backend = RemoteBackend::new(client, USERS_ENDPOINT);
        Self {
            remote: Some(backend.clone()),
            inner: Box::new(EntityRepository::<User, _>::new(
                backend,
                identity,
                USER_SEARCH_FIELDS,
            )),
        }
    }

    pub fn sqlite(db: SqliteDatabase) -> Self {
        let backend = SqliteBackend::new(db, Model::User);
        Self::from_inner(EntityRepository::<User, _>::new(backend, from_record, USER_SEARCH_FIELDS))
    }

    pub fn tabular(config: TabularConfig) -> Self {
        let backend = TabularBackend::new(config);
        Self::from_inner(EntityRepository::<User, _>::new(backend, flatten, USER_SEARCH_FIELDS))
    }

    pub fn local(directory: impl Into<PathBuf>) -> Self {
        let backend = LocalBackend::new(directory);
        Self::from_inner(EntityRepository::<User, _>::new(backend, identity, USER_SEARCH_FIELDS))
    }

    fn from_inner(inner: impl Repository<User> + 'static) -> Self {
        Self {
            inner: Box::new(inner),
            remote: None,
        }
    }

    /// The user the access token belongs to. Remote backend only.
    pub async fn get_me(&self) -> Result<User> {
        let Some(remote) = &self.remote else {
            return Err(RepositoryError::Unsupported {
                backend: "non-remote",
                capability: "get_me",
            });
        };
        let value = remote.fetch(ME_PATH).await.map_err(|e| e.for_entity(User::NAME))?;
        let validated = User::schema().validate(&value)?;
        Ok(serde_json::from_value(validated)?)
    }
}

#[async_trait]
impl Repository<User> for UserRepository {
    async fn get(&self, params: ListParams) -> Result<Page<User>> {
        self.inner.get(params).await
    }

    async fn find_by_id(&self, id: &str) -> Result<User> {
        self.inner.find_by_id(id).await
    }

    async fn create(&self, data: Record) -> Result<User> {
        self.inner.create(data).await
    }

    async fn update(&self, id: &str, data: Record) -> Result<User> {
        self.inner.update(id, data).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.inner.delete(id).await
    }
}
