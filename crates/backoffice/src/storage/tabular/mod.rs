//! Tabular service backend.
//!
//! Maps the repository contract onto an Airtable-style REST API. Pages are
//! addressed by an opaque cursor, search is a formula string, and the total
//! count is estimated from the cursor since the service reports none.

mod formula;
mod records;

use async_trait::async_trait;
use backoffice_client::{ApiClient, NO_QUERY};
use backoffice_core::storage::{Backend, ListRequest, RawPage, Record, RepositoryError, Result};
use serde_json::json;

use crate::storage::path::encode_segment;
use crate::storage::remote::map_client_error;

pub use formula::{escape_string, estimate_count, search_formula};
pub use records::{flatten, TabularPage, TabularRecord};

use records::CreateResponse;

pub const DEFAULT_BASE_URL: &str = "https://api.airtable.com";

/// Largest page the service hands out.
const MAX_PAGE_SIZE: u64 = 100;

/// Keys the service manages itself and rejects inside `fields`.
const RESERVED_KEYS: [&str; 2] = ["id", "createdTime"];

/// Connection settings for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularConfig {
    pub api_key: String,
    pub app_id: String,
    pub table: String,
    pub view: Option<String>,
    pub base_url: String,
}

impl TabularConfig {
    /// Fails with `ConnectionFailed` when the API key or app id is missing.
    pub fn new(
        api_key: Option<String>,
        app_id: Option<String>,
        table: impl Into<String>,
    ) -> Result<Self> {
        let api_key = required(api_key, "AIRTABLE_API_KEY")?;
        let app_id = required(app_id, "AIRTABLE_APP_ID")?;
        Ok(Self {
            api_key,
            app_id,
            table: table.into(),
            view: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_view(mut self, view: Option<String>) -> Self {
        self.view = view.filter(|v| !v.trim().is_empty());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RepositoryError::ConnectionFailed(format!("{name} is not set")))
}

fn strip_reserved(mut record: Record) -> Record {
    for key in RESERVED_KEYS {
        record.remove(key);
    }
    record
}

#[derive(Debug, Clone)]
pub struct TabularBackend {
    client: ApiClient,
    table_path: String,
    view: Option<String>,
}

impl TabularBackend {
    pub fn new(config: TabularConfig) -> Self {
        let base = format!(
            "{}/v0/{}",
            config.base_url.trim_end_matches('/'),
            encode_segment(&config.app_id)
        );
        Self {
            client: ApiClient::new(base).with_token(config.api_key),
            table_path: format!("/{}", encode_segment(&config.table)),
            view: config.view,
        }
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.table_path, encode_segment(id))
    }

    fn page_query(
        &self,
        cursor: Option<&str>,
        request: &ListRequest,
    ) -> Vec<(&'static str, String)> {
        let mut query = vec![("pageSize", request.limit.min(MAX_PAGE_SIZE).to_string())];
        if let Some(cursor) = cursor {
            query.push(("offset", cursor.to_string()));
        }
        if let Some(view) = &self.view {
            query.push(("view", view.clone()));
        }
        if let Some(order) = &request.order {
            query.push(("sort[0][field]", order.clone()));
            query.push(("sort[0][direction]", request.direction.to_string()));
        }
        if let Some(formula) = request
            .query
            .as_deref()
            .and_then(|q| search_formula(q, &request.search_fields))
        {
            query.push(("filterByFormula", formula));
        }
        query
    }

    /// Fetches one page starting at `cursor`, exposing the next cursor as-is.
    pub async fn list_page(
        &self,
        cursor: Option<&str>,
        request: &ListRequest,
    ) -> Result<TabularPage> {
        let query = self.page_query(cursor, request);
        tracing::debug!(table = %self.table_path, ?cursor, "Fetching tabular page");
        self.client
            .get(&self.table_path, &query)
            .await
            .map_err(|e| map_client_error(e, None))
    }
}

#[async_trait]
impl Backend for TabularBackend {
    type Raw = TabularRecord;

    fn name(&self) -> &'static str {
        "tabular"
    }

    async fn list(&self, request: &ListRequest) -> Result<RawPage<TabularRecord>> {
        if !request.predicates.is_empty() {
            return Err(RepositoryError::Unsupported {
                backend: self.name(),
                capability: "conditions",
            });
        }

        let cursor = (request.offset > 0).then(|| request.offset.to_string());
        let page = self.list_page(cursor.as_deref(), request).await?;
        let count = estimate_count(request.offset, page.records.len(), page.offset.as_deref());

        Ok(RawPage {
            records: page.records,
            count,
        })
    }

    async fn find(&self, id: &str) -> Result<TabularRecord> {
        self.client
            .get(&self.item_path(id), NO_QUERY)
            .await
            .map_err(|e| map_client_error(e, Some(id)))
    }

    async fn insert(&self, data: Record) -> Result<TabularRecord> {
        let body = json!({ "records": [{ "fields": strip_reserved(data) }] });
        let response: CreateResponse = self
            .client
            .post(&self.table_path, &body)
            .await
            .map_err(|e| map_client_error(e, None))?;

        response.records.into_iter().next().ok_or_else(|| {
            RepositoryError::Serialization("Create response contained no records".to_string())
        })
    }

    async fn modify(&self, id: &str, patch: Record) -> Result<TabularRecord> {
        let body = json!({ "fields": strip_reserved(patch) });
        self.client
            .patch(&self.item_path(id), &body)
            .await
            .map_err(|e| map_client_error(e, Some(id)))
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.client
            .delete(&self.item_path(id))
            .await
            .map_err(|e| map_client_error(e, Some(id)))?;
        Ok(())
    }
}
