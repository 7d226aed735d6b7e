//! Local document backend.
//!
//! One JSON document per id (`{id}.json`) under a directory, or a single
//! `index.json` holding `{ "data": [...] }`. Listing loads everything and
//! filters, sorts and slices in memory.
//!
//! Mutations are NOT persisted: `insert` returns the data with a generated
//! `mock-<millis>` id, `modify` returns the stored document merged with the
//! patch, and `remove` only checks that the document exists. Nothing is
//! written to disk.

mod error;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use backoffice_core::search::{matches_all, matches_query, sort_records};
use backoffice_core::storage::{
    to_record, Backend, ListRequest, RawPage, Record, RepositoryError, Result,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

pub use error::{map_io_error, map_parse_error};

const INDEX_FILE: &str = "index.json";

#[derive(Debug, Deserialize)]
struct IndexFile {
    data: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct LocalBackend {
    directory: PathBuf,
}

impl LocalBackend {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Reads a file, or `None` when it does not exist.
    async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_io_error(e, path)),
        }
    }

    async fn read_document(path: &Path) -> Result<Option<Record>> {
        let Some(bytes) = Self::read_optional(path).await? else {
            return Ok(None);
        };
        let value: Value = serde_json::from_slice(&bytes).map_err(|e| map_parse_error(e, path))?;
        to_record(value).map(Some)
    }

    async fn read_index(&self) -> Result<Option<Vec<Record>>> {
        let path = self.directory.join(INDEX_FILE);
        let Some(bytes) = Self::read_optional(&path).await? else {
            return Ok(None);
        };
        let index: IndexFile =
            serde_json::from_slice(&bytes).map_err(|e| map_parse_error(e, &path))?;
        index
            .data
            .into_iter()
            .map(to_record)
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// Document files in the directory, ordered by file name.
    async fn document_paths(&self) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.directory)
            .await
            .map_err(|e| map_io_error(e, &self.directory))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| map_io_error(e, &self.directory))?
        {
            let path = entry.path();
            let is_document = path.extension().is_some_and(|ext| ext == "json")
                && path.file_name().is_some_and(|name| name != INDEX_FILE);
            if is_document {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Every stored document: the index when present, otherwise a scan.
    async fn load_all(&self) -> Result<Vec<Record>> {
        if let Some(records) = self.read_index().await? {
            return Ok(records);
        }

        let mut records = Vec::new();
        for path in self.document_paths().await? {
            if let Some(record) = Self::read_document(&path).await? {
                records.push(record);
            }
        }
        tracing::debug!(
            directory = %self.directory.display(),
            count = records.len(),
            "Scanned documents"
        );
        Ok(records)
    }

    fn document_path(&self, id: &str) -> Result<PathBuf> {
        let unsafe_id = id.is_empty() || id.contains(['/', '\\']) || id.contains("..");
        if unsafe_id {
            return Err(RepositoryError::InvalidData(format!("Invalid document id: {id:?}")));
        }
        Ok(self.directory.join(format!("{id}.json")))
    }

    async fn load(&self, id: &str) -> Result<Record> {
        let path = self.document_path(id)?;
        if let Some(record) = Self::read_document(&path).await? {
            return Ok(record);
        }

        let from_index = self.read_index().await?.and_then(|records| {
            records
                .into_iter()
                .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
        });
        from_index.ok_or_else(|| RepositoryError::not_found(id))
    }
}

#[async_trait]
impl Backend for LocalBackend {
    type Raw = Value;

    fn name(&self) -> &'static str {
        "local"
    }

    async fn list(&self, request: &ListRequest) -> Result<RawPage<Value>> {
        let mut records: Vec<Record> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|record| match &request.query {
                Some(query) => matches_query(record, query, &request.search_fields),
                None => true,
            })
            .filter(|record| matches_all(record, &request.predicates))
            .collect();

        if let Some(order) = &request.order {
            sort_records(&mut records, order, request.direction);
        }

        let count = records.len() as u64;
        let offset = usize::try_from(request.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(request.limit).unwrap_or(usize::MAX);
        let page = records
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(Value::Object)
            .collect();

        Ok(RawPage {
            records: page,
            count,
        })
    }

    async fn find(&self, id: &str) -> Result<Value> {
        self.load(id).await.map(Value::Object)
    }

    async fn insert(&self, mut data: Record) -> Result<Value> {
        let id = format!("mock-{}", Utc::now().timestamp_millis());
        tracing::debug!(id = %id, "Local create is not persisted");
        data.insert("id".to_string(), Value::String(id));
        Ok(Value::Object(data))
    }

    async fn modify(&self, id: &str, patch: Record) -> Result<Value> {
        let mut record = self.load(id).await?;
        for (key, value) in patch {
            if key != "id" {
                record.insert(key, value);
            }
        }
        tracing::debug!(id = %id, "Local update is not persisted");
        Ok(Value::Object(record))
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.load(id).await?;
        tracing::debug!(id = %id, "Local delete is not persisted");
        Ok(())
    }
}
