use async_trait::async_trait;

use super::{Entity, ListParams, ListRequest, Page, RawPage, Record, Result};

/// A storage strategy: one storage or transport technology, speaking in its
/// own native record type.
///
/// Backends receive already-normalized requests and never see entity types.
/// Identity errors use [`RepositoryError::not_found`](super::RepositoryError::not_found);
/// the repository attributes them to its entity.
#[async_trait]
pub trait Backend: Send + Sync {
    /// The record shape this backend returns.
    type Raw: Send + 'static;

    /// Short backend name for logs and capability errors.
    fn name(&self) -> &'static str;

    /// Returns one page of matching records and the total match count.
    async fn list(&self, request: &ListRequest) -> Result<RawPage<Self::Raw>>;

    /// Loads one record by id.
    async fn find(&self, id: &str) -> Result<Self::Raw>;

    /// Stores a new record and returns it with its assigned id.
    async fn insert(&self, data: Record) -> Result<Self::Raw>;

    /// Applies a partial update and returns the resulting record.
    async fn modify(&self, id: &str, patch: Record) -> Result<Self::Raw>;

    /// Deletes one record by id.
    async fn remove(&self, id: &str) -> Result<()>;
}

/// The CRUD-and-search contract every caller programs against.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Lists a page of entities. `count` is the total before pagination.
    async fn get(&self, params: ListParams) -> Result<Page<T>>;

    /// Gets an entity by id, failing with `NotFound` when absent.
    async fn find_by_id(&self, id: &str) -> Result<T>;

    /// Creates an entity. The backend assigns the id.
    async fn create(&self, data: Record) -> Result<T>;

    /// Updates the given fields of an entity, leaving the rest untouched.
    async fn update(&self, id: &str, data: Record) -> Result<T>;

    /// Deletes an entity by id.
    async fn delete(&self, id: &str) -> Result<()>;
}
