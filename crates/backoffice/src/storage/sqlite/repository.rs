//! SQLite backend implementation.
//!
//! Implements the `Backend` strategy from `backoffice_core::storage` using SQLite.

use async_trait::async_trait;
use backoffice_core::storage::{
    Backend, Direction, ListRequest, RawPage, Record, RepositoryError, Result,
};
use chrono::Utc;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use tokio_rusqlite::Connection;
use uuid::Uuid;

use super::conversions::{format_datetime, json_to_sql, row_to_record};
use super::error::{map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_id};
use super::filter::build_filter;
use super::schema::{self, quote_ident, Model, TableDef, CREATED_AT, UPDATED_AT};

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// A shared SQLite connection with the schema applied.
///
/// Cloning is cheap; all clones talk to the same connection thread.
#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    /// Opens a file-based database.
    ///
    /// The database file will be created if it doesn't exist.
    /// Schema tables are created automatically.
    pub async fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;
        tracing::debug!(path, "Opened SQLite database");

        Ok(Self { conn })
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing - data is lost when the connection is dropped.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Initialize the database schema.
    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")
                .map_err(wrap_err)?;
            conn.execute_batch(schema::CREATE_TABLES)
                .map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }

    /// Runs a batch of SQL statements.
    pub async fn execute_batch(&self, sql: impl Into<String>) -> Result<()> {
        let sql = sql.into();
        self.conn
            .call(move |conn| conn.execute_batch(&sql).map_err(wrap_err))
            .await
            .map_err(map_tokio_rusqlite_error)
    }
}

/// Relational backend for one table.
pub struct SqliteBackend {
    db: SqliteDatabase,
    table: &'static TableDef,
}

impl SqliteBackend {
    pub fn new(db: SqliteDatabase, model: Model) -> Self {
        Self::for_table(db, model.table())
    }

    /// Backend for a table outside the model registry. The table must exist.
    pub fn for_table(db: SqliteDatabase, table: &'static TableDef) -> Self {
        Self { db, table }
    }

    pub fn table(&self) -> &'static TableDef {
        self.table
    }

    fn select_by_id_sql(&self) -> String {
        format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            self.table.select_list(),
            quote_ident(self.table.name),
            quote_ident(self.table.primary_key())
        )
    }

    /// Resolves the order column, ignoring names the table does not have.
    fn order_clause(&self, request: &ListRequest) -> String {
        let direction = match request.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        match request.order.as_deref() {
            Some(order) => match self.table.column(order) {
                Some(column) => format!("{} {direction}, rowid ASC", quote_ident(column.name)),
                None => {
                    tracing::warn!(table = self.table.name, order, "Unknown order column ignored");
                    "rowid ASC".to_string()
                }
            },
            None => "rowid ASC".to_string(),
        }
    }

    /// Converts a caller record into bind values, rejecting unknown columns.
    fn bind_record(&self, data: &Record) -> Result<Vec<(&'static str, SqlValue)>> {
        data.iter()
            .map(|(key, value)| {
                let column = self.table.column(key).ok_or_else(|| {
                    RepositoryError::InvalidData(format!(
                        "Unknown column '{key}' for table {}",
                        self.table.name
                    ))
                })?;
                Ok((column.name, json_to_sql(column, value)?))
            })
            .collect()
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    type Raw = Record;

    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn list(&self, request: &ListRequest) -> Result<RawPage<Record>> {
        let table = self.table;
        let mut params = Vec::new();
        let where_clause = match build_filter(table, request) {
            Some(filter) => {
                tracing::debug!(
                    table = table.name,
                    filter = %filter.to_json(),
                    "Relational filter"
                );
                format!(" WHERE {}", filter.to_sql(&mut params)?)
            }
            None => String::new(),
        };

        let count_sql = format!(
            "SELECT COUNT(*) FROM {}{where_clause}",
            quote_ident(table.name)
        );
        let rows_sql = format!(
            "SELECT {} FROM {}{where_clause} ORDER BY {} LIMIT ? OFFSET ?",
            table.select_list(),
            quote_ident(table.name),
            self.order_clause(request)
        );
        let limit = i64::try_from(request.limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(request.offset).unwrap_or(i64::MAX);

        // Count and rows are read inside one transaction so they agree.
        self.db
            .conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;

                let count: i64 = tx
                    .query_row(&count_sql, rusqlite::params_from_iter(params.iter()), |row| {
                        row.get(0)
                    })
                    .map_err(wrap_err)?;

                params.push(SqlValue::Integer(limit));
                params.push(SqlValue::Integer(offset));

                let records = {
                    let mut stmt = tx.prepare(&rows_sql).map_err(wrap_err)?;
                    let rows = stmt
                        .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                            row_to_record(row, table)
                        })
                        .map_err(wrap_err)?;

                    let mut records = Vec::new();
                    for row_result in rows {
                        records.push(row_result.map_err(wrap_err)?);
                    }
                    records
                };

                tx.commit().map_err(wrap_err)?;
                Ok(RawPage {
                    records,
                    count: u64::try_from(count).unwrap_or_default(),
                })
            })
            .await
            .map_err(map_tokio_rusqlite_error)
    }

    async fn find(&self, id: &str) -> Result<Record> {
        let table = self.table;
        let sql = self.select_by_id_sql();
        let id_str = id.to_string();

        self.db
            .conn
            .call(move |conn| {
                conn.query_row(&sql, [&id_str], |row| row_to_record(row, table))
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, id))
    }

    async fn insert(&self, mut data: Record) -> Result<Record> {
        let id = Uuid::new_v4().to_string();
        data.insert(self.table.primary_key().to_string(), Value::String(id.clone()));
        if self.table.timestamps {
            let now = Value::String(format_datetime(&Utc::now()));
            data.insert(CREATED_AT.to_string(), now.clone());
            data.insert(UPDATED_AT.to_string(), now);
        }

        let binds = self.bind_record(&data)?;
        let columns = binds
            .iter()
            .map(|(name, _)| quote_ident(name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; binds.len()].join(", ");
        let insert_sql = format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders})",
            quote_ident(self.table.name)
        );
        let values: Vec<SqlValue> = binds.into_iter().map(|(_, v)| v).collect();
        let select_sql = self.select_by_id_sql();
        let table = self.table;
        let id_str = id.clone();

        tracing::debug!(table = table.name, %id, "Inserting row");

        self.db
            .conn
            .call(move |conn| {
                conn.execute(&insert_sql, rusqlite::params_from_iter(values.iter()))
                    .map_err(wrap_err)?;
                conn.query_row(&select_sql, [&id_str], |row| row_to_record(row, table))
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, id))
    }

    async fn modify(&self, id: &str, mut patch: Record) -> Result<Record> {
        // The primary key is not writable.
        patch.remove(self.table.primary_key());
        if self.table.timestamps {
            patch.remove(CREATED_AT);
            patch.insert(
                UPDATED_AT.to_string(),
                Value::String(format_datetime(&Utc::now())),
            );
        }

        let binds = self.bind_record(&patch)?;
        let select_sql = self.select_by_id_sql();
        let table = self.table;
        let id_str = id.to_string();

        let update_sql = if binds.is_empty() {
            None
        } else {
            let assignments = binds
                .iter()
                .map(|(name, _)| format!("{} = ?", quote_ident(name)))
                .collect::<Vec<_>>()
                .join(", ");
            Some(format!(
                "UPDATE {} SET {assignments} WHERE {} = ?",
                quote_ident(table.name),
                quote_ident(table.primary_key())
            ))
        };
        let mut values: Vec<SqlValue> = binds.into_iter().map(|(_, v)| v).collect();
        values.push(SqlValue::Text(id_str.clone()));

        self.db
            .conn
            .call(move |conn| {
                if let Some(update_sql) = update_sql {
                    let rows = conn
                        .execute(&update_sql, rusqlite::params_from_iter(values.iter()))
                        .map_err(wrap_err)?;
                    if rows == 0 {
                        return Err(wrap_err(rusqlite::Error::QueryReturnedNoRows));
                    }
                }
                conn.query_row(&select_sql, [&id_str], |row| row_to_record(row, table))
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, id))
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_ident(self.table.name),
            quote_ident(self.table.primary_key())
        );
        let id_str = id.to_string();

        self.db
            .conn
            .call(move |conn| {
                let rows = conn.execute(&sql, [&id_str]).map_err(wrap_err)?;
                if rows == 0 {
                    Err(wrap_err(rusqlite::Error::QueryReturnedNoRows))
                } else {
                    Ok(())
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, id))
    }
}

#[cfg(test)]
mod tests {
    use backoffice_core::search::{SearchCondition, SearchOperator};
    use backoffice_core::storage::{to_record, ListParams};
    use serde_json::json;

    use super::*;
    use crate::storage::sqlite::schema::{Column, ColumnKind};

    static PEOPLE: TableDef = TableDef {
        name: "people",
        columns: &[
            Column { name: "id", kind: ColumnKind::Text },
            Column { name: "email", kind: ColumnKind::Text },
            Column { name: "age", kind: ColumnKind::Integer },
            Column { name: "active", kind: ColumnKind::Boolean },
        ],
        timestamps: false,
    };

    const CREATE_PEOPLE: &str = "CREATE TABLE people (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL,
        age INTEGER,
        active INTEGER NOT NULL DEFAULT 1
    );";

    async fn people_backend(rows: Vec<Value>) -> SqliteBackend {
        let db = SqliteDatabase::open_in_memory().await.unwrap();
        db.execute_batch(CREATE_PEOPLE).await.unwrap();
        let backend = SqliteBackend::for_table(db, &PEOPLE);
        for row in rows {
            backend.insert(to_record(row).unwrap()).await.unwrap();
        }
        backend
    }

    fn request(params: ListParams) -> ListRequest {
        ListRequest::from_params(&params, &["email".to_string()])
    }

    fn emails(page: &RawPage<Record>) -> Vec<&str> {
        page.records
            .iter()
            .map(|r| r["email"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_conditions_select_matching_rows() {
        let backend = people_backend(vec![
            json!({ "email": "minor@example.com", "age": 17, "active": true }),
            json!({ "email": "adult@example.com", "age": 20, "active": true }),
        ])
        .await;

        let params = ListParams::default()
            .condition(SearchCondition::new("age", SearchOperator::Gte, 18))
            .condition(SearchCondition::eq("active", true));
        let page = backend.list(&request(params)).await.unwrap();

        assert_eq!(page.count, 1);
        assert_eq!(emails(&page), vec!["adult@example.com"]);
        assert_eq!(page.records[0]["active"], json!(true));
    }

    #[tokio::test]
    async fn test_query_is_case_insensitive_substring() {
        let backend = people_backend(vec![
            json!({ "email": "test1@example.com" }),
            json!({ "email": "TEST2@example.com" }),
            json!({ "email": "another@example.com" }),
        ])
        .await;

        let page = backend
            .list(&request(ListParams::default().query("test")))
            .await
            .unwrap();

        assert_eq!(page.count, 2);
        assert_eq!(page.records.len(), 2);
    }

    #[tokio::test]
    async fn test_pagination_count_is_total() {
        let rows = (0..25)
            .map(|i| json!({ "email": format!("user{i}@example.com"), "age": i }))
            .collect();
        let backend = people_backend(rows).await;

        let page = backend.list(&request(ListParams::new(20, 10))).await.unwrap();

        assert_eq!(page.count, 25);
        assert_eq!(page.records.len(), 5);
        assert_eq!(page.records[0]["age"], json!(20));
    }

    #[tokio::test]
    async fn test_sort_directions() {
        let backend = people_backend(vec![
            json!({ "email": "b@example.com", "age": 30 }),
            json!({ "email": "a@example.com", "age": 10 }),
            json!({ "email": "c@example.com", "age": 20 }),
        ])
        .await;

        let asc = backend
            .list(&request(ListParams::default().order_by("age", Direction::Asc)))
            .await
            .unwrap();
        let desc = backend
            .list(&request(ListParams::default().order_by("email", Direction::Desc)))
            .await
            .unwrap();

        assert_eq!(emails(&asc), vec!["a@example.com", "c@example.com", "b@example.com"]);
        assert_eq!(emails(&desc), vec!["c@example.com", "b@example.com", "a@example.com"]);
    }

    #[tokio::test]
    async fn test_in_and_not_equal() {
        let backend = people_backend(vec![
            json!({ "email": "a@example.com", "age": 1 }),
            json!({ "email": "b@example.com", "age": 2 }),
            json!({ "email": "c@example.com" }),
        ])
        .await;

        let within = backend
            .list(&request(ListParams::default().condition(SearchCondition::new(
                "age",
                SearchOperator::In,
                json!([1, 3]),
            ))))
            .await
            .unwrap();
        let not_two = backend
            .list(&request(ListParams::default().condition(SearchCondition::new(
                "age",
                SearchOperator::Ne,
                2,
            ))))
            .await
            .unwrap();

        assert_eq!(emails(&within), vec!["a@example.com"]);
        assert_eq!(emails(&not_two), vec!["a@example.com", "c@example.com"]);
    }

    #[tokio::test]
    async fn test_find_update_delete_missing_row() {
        let backend = people_backend(Vec::new()).await;

        assert_eq!(
            backend.find("missing").await.unwrap_err(),
            RepositoryError::not_found("missing")
        );
        assert!(backend
            .modify("missing", to_record(json!({ "age": 3 })).unwrap())
            .await
            .unwrap_err()
            .is_not_found());
        assert!(backend.remove("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_update_merges() {
        let backend = people_backend(Vec::new()).await;

        let created = backend
            .insert(
                to_record(json!({ "id": "chosen", "email": "a@example.com", "age": 40 })).unwrap(),
            )
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap().to_string();
        assert_ne!(id, "chosen");
        assert!(Uuid::parse_str(&id).is_ok());

        let updated = backend
            .modify(&id, to_record(json!({ "active": false })).unwrap())
            .await
            .unwrap();
        assert_eq!(updated["age"], json!(40));
        assert_eq!(updated["active"], json!(false));

        backend.remove(&id).await.unwrap();
        assert!(backend.find(&id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_unknown_write_column_is_invalid_data() {
        let backend = people_backend(Vec::new()).await;

        let err = backend
            .insert(to_record(json!({ "email": "a@example.com", "nickname": "al" })).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_registry_tables_manage_timestamps() {
        let db = SqliteDatabase::open_in_memory().await.unwrap();
        let users = SqliteBackend::new(db, Model::User);

        let data = to_record(json!({
            "name": "Ann",
            "email": "ann@example.com",
            "permissions": ["admin"]
        }))
        .unwrap();
        let created = users.insert(data).await.unwrap();

        assert_eq!(created["permissions"], json!(["admin"]));
        assert_eq!(created["isActive"], json!(true));
        assert_eq!(created["createdAt"], created["updatedAt"]);

        let duplicate = users
            .insert(to_record(json!({ "name": "Ann", "email": "ann@example.com" })).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(duplicate, RepositoryError::AlreadyExists { .. }));
    }
}
