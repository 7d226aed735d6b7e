//! Normalization of search conditions into typed predicates.
//!
//! This is where the fail-open policy lives: a condition whose value does not
//! fit its operator, or whose operator is not part of the language, is logged
//! and dropped. Every backend translates predicates, never raw conditions, so
//! the policy is identical across backends.

use serde_json::Value;

use super::{SearchCondition, SearchOperator};

/// A validated comparison against one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Eq(Value),
    Ne(Value),
    /// Case-insensitive substring match.
    Contains(String),
    /// Ordering comparisons carry a number or a string.
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
}

/// A condition that survived normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub comparison: Comparison,
}

impl Predicate {
    /// Converts a condition, or returns `None` (with a warning) when the
    /// condition has to be dropped.
    pub fn from_condition(condition: &SearchCondition) -> Option<Self> {
        let SearchCondition {
            column,
            operator,
            value,
        } = condition;

        let comparison = match operator {
            SearchOperator::Eq => Comparison::Eq(value.clone()),
            SearchOperator::Ne => Comparison::Ne(value.clone()),
            SearchOperator::Contains => match value {
                Value::String(needle) => Comparison::Contains(needle.clone()),
                other => return drop_condition(column, operator, "a string", other),
            },
            SearchOperator::Gt | SearchOperator::Gte | SearchOperator::Lt | SearchOperator::Lte => {
                if !is_orderable(value) {
                    return drop_condition(column, operator, "a number, string or date", value);
                }
                match operator {
                    SearchOperator::Gt => Comparison::Gt(value.clone()),
                    SearchOperator::Gte => Comparison::Gte(value.clone()),
                    SearchOperator::Lt => Comparison::Lt(value.clone()),
                    _ => Comparison::Lte(value.clone()),
                }
            }
            SearchOperator::In => match value {
                Value::Array(items) => Comparison::In(items.clone()),
                other => return drop_condition(column, operator, "an array", other),
            },
            SearchOperator::Unrecognized(symbol) => {
                tracing::warn!(
                    %column,
                    operator = %symbol,
                    "Unsupported operator, condition dropped"
                );
                return None;
            }
        };

        Some(Self {
            column: column.clone(),
            comparison,
        })
    }

    /// Converts back into the wire form of the condition.
    pub fn to_condition(&self) -> SearchCondition {
        let (operator, value) = match &self.comparison {
            Comparison::Eq(v) => (SearchOperator::Eq, v.clone()),
            Comparison::Ne(v) => (SearchOperator::Ne, v.clone()),
            Comparison::Contains(s) => (SearchOperator::Contains, Value::String(s.clone())),
            Comparison::Gt(v) => (SearchOperator::Gt, v.clone()),
            Comparison::Gte(v) => (SearchOperator::Gte, v.clone()),
            Comparison::Lt(v) => (SearchOperator::Lt, v.clone()),
            Comparison::Lte(v) => (SearchOperator::Lte, v.clone()),
            Comparison::In(items) => (SearchOperator::In, Value::Array(items.clone())),
        };
        SearchCondition::new(self.column.clone(), operator, value)
    }
}

/// Dates travel as RFC 3339 strings, so they are covered by `is_string`.
fn is_orderable(value: &Value) -> bool {
    value.is_number() || value.is_string()
}

fn drop_condition(
    column: &str,
    operator: &SearchOperator,
    expected: &str,
    value: &Value,
) -> Option<Predicate> {
    tracing::warn!(
        %column,
        %operator,
        %value,
        "Operator '{operator}' requires {expected}, condition dropped"
    );
    None
}

/// Normalizes a condition list, keeping only the conditions that can be
/// applied. The result is AND-ed by every backend.
pub fn normalize(conditions: &[SearchCondition]) -> Vec<Predicate> {
    conditions.iter().filter_map(Predicate::from_condition).collect()
}

/// Returns the trimmed query, or `None` for an empty or whitespace query.
pub fn normalize_query(query: Option<&str>) -> Option<String> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
}
