//! SQLite row conversion functions.
//!
//! Pure functions for converting between SQLite values and JSON records.
//! These are testable in isolation without database access.

use backoffice_core::storage::{Record, RepositoryError};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value as SqlValue, ValueRef};
use rusqlite::Row;
use serde_json::{Number, Value};

use super::schema::{Column, ColumnKind, TableDef};

/// Format a DateTime for SQLite storage.
///
/// Fixed millisecond precision keeps lexicographic and chronological order
/// in agreement.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 string into the stored timestamp format.
pub fn normalize_timestamp(text: &str) -> Result<String, RepositoryError> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| format_datetime(&dt.with_timezone(&Utc)))
        .map_err(|e| RepositoryError::InvalidData(format!("Invalid timestamp {text:?}: {e}")))
}

fn mismatch(column: &Column, value: &Value) -> RepositoryError {
    RepositoryError::InvalidData(format!(
        "Column '{}' ({:?}) cannot hold {value}",
        column.name, column.kind
    ))
}

/// Convert a JSON value into the SQLite value stored in `column`.
pub fn json_to_sql(column: &Column, value: &Value) -> Result<SqlValue, RepositoryError> {
    if value.is_null() {
        return Ok(SqlValue::Null);
    }
    match column.kind {
        ColumnKind::Text => match value {
            Value::String(s) => Ok(SqlValue::Text(s.clone())),
            Value::Number(_) | Value::Bool(_) => Ok(SqlValue::Text(value.to_string())),
            _ => Err(mismatch(column, value)),
        },
        ColumnKind::Integer => value
            .as_i64()
            .map(SqlValue::Integer)
            .ok_or_else(|| mismatch(column, value)),
        ColumnKind::Real => value
            .as_f64()
            .map(SqlValue::Real)
            .ok_or_else(|| mismatch(column, value)),
        ColumnKind::Boolean => match value {
            Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
            Value::Number(n) if n.as_i64() == Some(0) || n.as_i64() == Some(1) => {
                Ok(SqlValue::Integer(n.as_i64().unwrap_or_default()))
            }
            _ => Err(mismatch(column, value)),
        },
        ColumnKind::Json => Ok(SqlValue::Text(serde_json::to_string(value)?)),
        ColumnKind::Timestamp => match value {
            Value::String(s) => normalize_timestamp(s).map(SqlValue::Text),
            _ => Err(mismatch(column, value)),
        },
    }
}

/// Convert the SQLite value at `index` into JSON according to `column`.
fn sql_to_json(index: usize, column: &Column, value: ValueRef<'_>) -> rusqlite::Result<Value> {
    let converted = match (column.kind, value) {
        (_, ValueRef::Null) => Value::Null,
        (ColumnKind::Boolean, ValueRef::Integer(i)) => Value::Bool(i != 0),
        (ColumnKind::Json, ValueRef::Text(bytes)) => {
            serde_json::from_slice(bytes).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
            })?
        }
        (_, ValueRef::Integer(i)) => Value::from(i),
        (_, ValueRef::Real(f)) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        (_, ValueRef::Text(bytes)) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        (_, ValueRef::Blob(_)) => {
            return Err(rusqlite::Error::InvalidColumnType(
                index,
                column.name.to_string(),
                Type::Blob,
            ))
        }
    };
    Ok(converted)
}

/// Convert a SQLite row to a record.
///
/// Expected columns: `table.columns`, in declaration order.
pub fn row_to_record(row: &Row, table: &TableDef) -> rusqlite::Result<Record> {
    let mut record = Record::new();
    for (index, column) in table.columns.iter().enumerate() {
        let value = sql_to_json(index, column, row.get_ref(index)?)?;
        record.insert(column.name.to_string(), value);
    }
    Ok(record)
}
