//! Filter synthesis for the relational backend.
//!
//! A list request becomes a [`Filter`] tree: the query is an OR group of
//! per-field substring matches, the predicates are an AND group of per-column
//! comparisons, and the two are joined by an outer AND only when both exist.
//! A group with a single member is never wrapped.
//!
//! The tree renders to the JSON filter shape of the relational boundary and
//! compiles to a parameterized SQL `WHERE` clause.

use backoffice_core::search::{Comparison, Predicate};
use backoffice_core::storage::{ListRequest, RepositoryError};
use rusqlite::types::Value as SqlValue;
use serde_json::{json, Map, Value};

use super::conversions::json_to_sql;
use super::schema::{quote_ident, Column, TableDef};

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Field {
        column: &'static Column,
        comparison: Comparison,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

/// Collapses a group: nothing for no members, the member itself for one.
fn group(mut members: Vec<Filter>, wrap: fn(Vec<Filter>) -> Filter) -> Option<Filter> {
    match members.len() {
        0 => None,
        1 => members.pop(),
        _ => Some(wrap(members)),
    }
}

/// Values the column cannot hold make the comparison meaningless; such a
/// predicate is dropped like any other incompatible condition.
fn storable(column: &Column, comparison: &Comparison) -> bool {
    match comparison {
        Comparison::Contains(_) => true,
        Comparison::In(items) => items.iter().all(|v| json_to_sql(column, v).is_ok()),
        Comparison::Eq(v)
        | Comparison::Ne(v)
        | Comparison::Gt(v)
        | Comparison::Gte(v)
        | Comparison::Lt(v)
        | Comparison::Lte(v) => json_to_sql(column, v).is_ok(),
    }
}

fn predicate_filter(table: &TableDef, predicate: &Predicate) -> Option<Filter> {
    let Some(column) = table.column(&predicate.column) else {
        tracing::warn!(
            table = table.name,
            column = %predicate.column,
            "Unknown column, condition dropped"
        );
        return None;
    };
    if !storable(column, &predicate.comparison) {
        tracing::warn!(
            table = table.name,
            column = column.name,
            comparison = ?predicate.comparison,
            "Value does not fit column type, condition dropped"
        );
        return None;
    }
    Some(Filter::Field {
        column,
        comparison: predicate.comparison.clone(),
    })
}

/// Builds the filter for a list request, or `None` when nothing filters.
pub fn build_filter(table: &TableDef, request: &ListRequest) -> Option<Filter> {
    let query_group = request.query.as_ref().and_then(|query| {
        let members = request
            .search_fields
            .iter()
            .filter_map(|field| match table.column(field) {
                Some(column) => Some(Filter::Field {
                    column,
                    comparison: Comparison::Contains(query.clone()),
                }),
                None => {
                    tracing::warn!(
                        table = table.name,
                        field = %field,
                        "Unknown search field ignored"
                    );
                    None
                }
            })
            .collect();
        group(members, Filter::Or)
    });

    let condition_group = group(
        request
            .predicates
            .iter()
            .filter_map(|p| predicate_filter(table, p))
            .collect(),
        Filter::And,
    );

    match (query_group, condition_group) {
        (Some(query), Some(conditions)) => Some(Filter::And(vec![query, conditions])),
        (query, conditions) => query.or(conditions),
    }
}

impl Filter {
    /// Renders the JSON filter object, e.g.
    /// `{"AND": [{"age": {"gte": 18}}, {"active": {"equals": true}}]}`.
    pub fn to_json(&self) -> Value {
        match self {
            Filter::Field { column, comparison } => {
                let mut inner = Map::new();
                let (key, value) = match comparison {
                    Comparison::Eq(v) => ("equals", v.clone()),
                    Comparison::Ne(v) => ("not", v.clone()),
                    Comparison::Contains(s) => {
                        inner.insert("mode".to_string(), json!("insensitive"));
                        ("contains", Value::String(s.clone()))
                    }
                    Comparison::Gt(v) => ("gt", v.clone()),
                    Comparison::Gte(v) => ("gte", v.clone()),
                    Comparison::Lt(v) => ("lt", v.clone()),
                    Comparison::Lte(v) => ("lte", v.clone()),
                    Comparison::In(items) => ("in", Value::Array(items.clone())),
                };
                inner.insert(key.to_string(), value);
                let mut outer = Map::new();
                outer.insert(column.name.to_string(), Value::Object(inner));
                Value::Object(outer)
            }
            Filter::And(members) => {
                json!({ "AND": members.iter().map(Filter::to_json).collect::<Vec<_>>() })
            }
            Filter::Or(members) => {
                json!({ "OR": members.iter().map(Filter::to_json).collect::<Vec<_>>() })
            }
        }
    }

    /// Compiles to a SQL boolean expression, appending bind values to `params`.
    pub fn to_sql(&self, params: &mut Vec<SqlValue>) -> Result<String, RepositoryError> {
        match self {
            Filter::Field { column, comparison } => field_sql(column, comparison, params),
            Filter::And(members) => join_sql(members, " AND ", params),
            Filter::Or(members) => join_sql(members, " OR ", params),
        }
    }
}

fn join_sql(
    members: &[Filter],
    separator: &str,
    params: &mut Vec<SqlValue>,
) -> Result<String, RepositoryError> {
    let parts = members
        .iter()
        .map(|m| m.to_sql(params).map(|sql| format!("({sql})")))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(separator))
}

/// Escapes `LIKE` wildcards so the needle matches literally.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn bind(params: &mut Vec<SqlValue>, column: &Column, value: &Value) -> Result<(), RepositoryError> {
    params.push(json_to_sql(column, value)?);
    Ok(())
}

fn field_sql(
    column: &Column,
    comparison: &Comparison,
    params: &mut Vec<SqlValue>,
) -> Result<String, RepositoryError> {
    let ident = quote_ident(column.name);

    let sql = match comparison {
        // IS / IS NOT compare NULL like any other value.
        Comparison::Eq(v) => {
            bind(params, column, v)?;
            format!("{ident} IS ?")
        }
        Comparison::Ne(v) => {
            bind(params, column, v)?;
            format!("{ident} IS NOT ?")
        }
        Comparison::Contains(needle) => {
            params.push(SqlValue::Text(like_pattern(needle)));
            format!("lower({ident}) LIKE lower(?) ESCAPE '\\'")
        }
        Comparison::Gt(v) => {
            bind(params, column, v)?;
            format!("{ident} > ?")
        }
        Comparison::Gte(v) => {
            bind(params, column, v)?;
            format!("{ident} >= ?")
        }
        Comparison::Lt(v) => {
            bind(params, column, v)?;
            format!("{ident} < ?")
        }
        Comparison::Lte(v) => {
            bind(params, column, v)?;
            format!("{ident} <= ?")
        }
        Comparison::In(items) if items.is_empty() => "0".to_string(),
        Comparison::In(items) => {
            for item in items {
                bind(params, column, item)?;
            }
            let placeholders = vec!["?"; items.len()].join(", ");
            format!("{ident} IN ({placeholders})")
        }
    };
    Ok(sql)
}
