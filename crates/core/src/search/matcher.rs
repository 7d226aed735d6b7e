//! Pure in-memory evaluation of queries, predicates and sort order.
//!
//! Used by backends that hold whole documents in memory rather than pushing
//! filters down to a query engine.

use std::cmp::Ordering;

use serde_json::Value;

use crate::storage::{Direction, Record};

use super::{Comparison, Predicate};

/// Loose equality: numbers compare by value (`1 == 1.0`), everything else
/// structurally.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Orders two values of the same orderable kind. Mixed kinds, nulls and
/// missing values are unordered.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Option<Ordering> {
    match (a?, b?) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Renders a value for substring search.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

fn contains_insensitive(value: &Value, needle: &str) -> bool {
    value_to_text(value)
        .to_lowercase()
        .contains(&needle.to_lowercase())
}

/// Whether `record` satisfies a single predicate.
pub fn matches_predicate(record: &Record, predicate: &Predicate) -> bool {
    let value = record.get(&predicate.column).unwrap_or(&Value::Null);
    let ordering = |expected: &Value| compare_values(Some(value), Some(expected));

    match &predicate.comparison {
        Comparison::Eq(expected) => values_equal(value, expected),
        Comparison::Ne(expected) => !values_equal(value, expected),
        Comparison::Contains(needle) => !value.is_null() && contains_insensitive(value, needle),
        Comparison::Gt(expected) => ordering(expected) == Some(Ordering::Greater),
        Comparison::Gte(expected) => matches!(
            ordering(expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Comparison::Lt(expected) => ordering(expected) == Some(Ordering::Less),
        Comparison::Lte(expected) => {
            matches!(ordering(expected), Some(Ordering::Less | Ordering::Equal))
        }
        Comparison::In(items) => items.iter().any(|item| values_equal(value, item)),
    }
}

/// Whether `record` satisfies every predicate (AND).
pub fn matches_all(record: &Record, predicates: &[Predicate]) -> bool {
    predicates.iter().all(|p| matches_predicate(record, p))
}

/// Whether at least one search field contains `query`, case-insensitively
/// (OR). With no search fields the query matches everything.
pub fn matches_query<S: AsRef<str>>(record: &Record, query: &str, fields: &[S]) -> bool {
    if fields.is_empty() {
        return true;
    }
    fields.iter().any(|field| {
        record
            .get(field.as_ref())
            .is_some_and(|value| contains_insensitive(value, query))
    })
}

/// Sort rank of a value's kind: numbers, strings, booleans, then composites.
/// Null and missing values rank after everything.
fn kind_rank(value: Option<&Value>) -> u8 {
    match value {
        Some(Value::Number(_)) => 0,
        Some(Value::String(_)) => 1,
        Some(Value::Bool(_)) => 2,
        Some(Value::Array(_) | Value::Object(_)) => 3,
        Some(Value::Null) | None => 4,
    }
}

/// Total order over optional values: by kind rank, then within the kind.
fn total_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    kind_rank(a).cmp(&kind_rank(b)).then_with(|| match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .unwrap_or_default()
            .total_cmp(&y.as_f64().unwrap_or_default()),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x @ (Value::Array(_) | Value::Object(_))), Some(y)) => {
            x.to_string().cmp(&y.to_string())
        }
        _ => Ordering::Equal,
    })
}

/// Stable sort by one column. Null and missing values go last in either
/// direction; ties keep their relative order.
pub fn sort_records(records: &mut [Record], column: &str, direction: Direction) {
    records.sort_by(|a, b| {
        let (a, b) = (a.get(column), b.get(column));
        let a_null = kind_rank(a) == kind_rank(None);
        let b_null = kind_rank(b) == kind_rank(None);
        a_null.cmp(&b_null).then_with(|| {
            let ordering = total_order(a, b);
            match direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            }
        })
    });
}
