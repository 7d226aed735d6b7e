use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::search::{normalize, normalize_query, Predicate, SearchCondition};

use super::{RepositoryError, Result};

/// A backend-neutral document: a JSON object keyed by field name.
pub type Record = Map<String, Value>;

/// Default page size for list operations.
pub const DEFAULT_LIMIT: u64 = 20;

/// Sort direction. Anything other than `desc` reads as ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

impl From<&str> for Direction {
    fn from(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            Direction::Desc
        } else {
            Direction::Asc
        }
    }
}

impl From<String> for Direction {
    fn from(value: String) -> Self {
        Direction::from(value.as_str())
    }
}

impl From<Direction> for String {
    fn from(direction: Direction) -> Self {
        direction.as_str().to_string()
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-facing arguments of a paged list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub offset: u64,
    pub limit: u64,
    pub order: Option<String>,
    pub direction: Direction,
    pub query: Option<String>,
    pub conditions: Vec<SearchCondition>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            order: None,
            direction: Direction::Asc,
            query: None,
            conditions: Vec::new(),
        }
    }
}

impl ListParams {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit,
            ..Self::default()
        }
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(column.into());
        self.direction = direction;
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn condition(mut self, condition: SearchCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn conditions(mut self, conditions: impl IntoIterator<Item = SearchCondition>) -> Self {
        self.conditions.extend(conditions);
        self
    }
}

/// A list request after normalization, as handed to a backend.
///
/// Conditions have passed the fail-open filter, the query is trimmed and
/// non-empty, and the entity's search fields are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub offset: u64,
    pub limit: u64,
    pub order: Option<String>,
    pub direction: Direction,
    pub query: Option<String>,
    pub search_fields: Vec<String>,
    pub predicates: Vec<Predicate>,
}

impl ListRequest {
    pub fn from_params(params: &ListParams, search_fields: &[String]) -> Self {
        Self {
            offset: params.offset,
            limit: params.limit,
            order: params
                .order
                .as_deref()
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string),
            direction: params.direction,
            query: normalize_query(params.query.as_deref()),
            search_fields: search_fields.to_vec(),
            predicates: normalize(&params.conditions),
        }
    }

    /// The conditions that survived normalization, in wire form.
    pub fn conditions(&self) -> Vec<SearchCondition> {
        self.predicates.iter().map(Predicate::to_condition).collect()
    }
}

/// One page of results and the total number of matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub count: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            count: 0,
        }
    }
}

/// A page of backend-native records, before transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPage<R> {
    pub records: Vec<R>,
    pub count: u64,
}

/// Converts a JSON value into a [`Record`].
pub fn to_record(value: Value) -> Result<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(RepositoryError::InvalidData(format!(
            "Expected a JSON object, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::search::SearchOperator;

    #[test]
    fn test_direction_is_lenient() {
        assert_eq!(Direction::from("desc"), Direction::Desc);
        assert_eq!(Direction::from("DESC"), Direction::Desc);
        assert_eq!(Direction::from("asc"), Direction::Asc);
        assert_eq!(Direction::from("sideways"), Direction::Asc);
    }

    #[test]
    fn test_list_params_defaults() {
        let params: ListParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(params, ListParams::default());
        assert_eq!(params.limit, 20);
    }

    #[test]
    fn test_list_request_normalizes() {
        let params = ListParams::new(0, 10)
            .query("   ")
            .order_by(" ", Direction::Desc)
            .condition(SearchCondition::new("age", SearchOperator::Gt, true))
            .condition(SearchCondition::eq("active", true));

        let request = ListRequest::from_params(&params, &["email".to_string()]);

        assert_eq!(request.query, None);
        assert_eq!(request.order, None);
        assert_eq!(request.predicates.len(), 1);
        assert_eq!(
            request.conditions(),
            vec![SearchCondition::eq("active", true)]
        );
    }

    #[test]
    fn test_to_record_rejects_non_objects() {
        assert!(to_record(json!({ "a": 1 })).is_ok());
        assert!(matches!(
            to_record(json!([1, 2])),
            Err(RepositoryError::InvalidData(_))
        ));
    }
}
