//! Remote API backend.
//!
//! Translates the repository contract into HTTP calls against a REST
//! endpoint. List responses use the `{ data, count }` envelope; normalized
//! conditions travel as a JSON array in the `conditions` query parameter.

mod error;

use async_trait::async_trait;
use backoffice_client::{ApiClient, NO_QUERY};
use backoffice_core::storage::{Backend, ListRequest, RawPage, Record, RepositoryError, Result};
use serde::Deserialize;
use serde_json::Value;

use super::path::encode_segment;

pub use error::map_client_error;

/// Status reported when a delete succeeds without a confirming payload.
const UNCONFIRMED_DELETE_STATUS: u16 = 502;

#[derive(Debug, Deserialize)]
struct ListEnvelope {
    data: Vec<Value>,
    count: u64,
}

/// Backend for one collection endpoint, e.g. `/admin/users`.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    client: ApiClient,
    endpoint: String,
}

impl RemoteBackend {
    pub fn new(client: ApiClient, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.endpoint, encode_segment(id))
    }

    /// Query-string parameters for a list call. Absent values are omitted.
    fn list_query(request: &ListRequest) -> Result<Vec<(&'static str, String)>> {
        let mut query = vec![
            ("offset", request.offset.to_string()),
            ("limit", request.limit.to_string()),
        ];
        if let Some(order) = &request.order {
            query.push(("order", order.clone()));
            query.push(("direction", request.direction.to_string()));
        }
        if let Some(q) = &request.query {
            query.push(("query", q.clone()));
        }
        if !request.predicates.is_empty() {
            query.push(("conditions", serde_json::to_string(&request.conditions())?));
        }
        Ok(query)
    }

    /// GET an arbitrary path below the API base, e.g. `/me`.
    pub async fn fetch(&self, path: &str) -> Result<Value> {
        self.client
            .get(path, NO_QUERY)
            .await
            .map_err(|e| map_client_error(e, None))
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    type Raw = Value;

    fn name(&self) -> &'static str {
        "remote"
    }

    async fn list(&self, request: &ListRequest) -> Result<RawPage<Value>> {
        let query = Self::list_query(request)?;
        let envelope: ListEnvelope = self
            .client
            .get(&self.endpoint, &query)
            .await
            .map_err(|e| map_client_error(e, None))?;

        Ok(RawPage {
            records: envelope.data,
            count: envelope.count,
        })
    }

    async fn find(&self, id: &str) -> Result<Value> {
        self.client
            .get(&self.item_path(id), NO_QUERY)
            .await
            .map_err(|e| map_client_error(e, Some(id)))
    }

    async fn insert(&self, data: Record) -> Result<Value> {
        self.client
            .post(&self.endpoint, &data)
            .await
            .map_err(|e| map_client_error(e, None))
    }

    async fn modify(&self, id: &str, patch: Record) -> Result<Value> {
        self.client
            .put(&self.item_path(id), &patch)
            .await
            .map_err(|e| map_client_error(e, Some(id)))
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let confirmation = self
            .client
            .delete(&self.item_path(id))
            .await
            .map_err(|e| map_client_error(e, Some(id)))?;

        match confirmation {
            Some(value) if !value.is_null() => Ok(()),
            _ => Err(RepositoryError::Api {
                status: UNCONFIRMED_DELETE_STATUS,
                message: "Failed to delete item".to_string(),
            }),
        }
    }
}
