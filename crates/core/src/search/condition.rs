use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Comparison operators of the search condition language.
///
/// Operators travel as their symbols (`"="`, `"contains"`, ...). A symbol
/// that is not part of the language is kept as [`SearchOperator::Unrecognized`]
/// so the condition can be dropped later instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SearchOperator {
    #[default]
    Eq,
    Ne,
    Contains,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Unrecognized(String),
}

impl SearchOperator {
    pub fn as_str(&self) -> &str {
        match self {
            SearchOperator::Eq => "=",
            SearchOperator::Ne => "!=",
            SearchOperator::Contains => "contains",
            SearchOperator::Gt => ">",
            SearchOperator::Gte => ">=",
            SearchOperator::Lt => "<",
            SearchOperator::Lte => "<=",
            SearchOperator::In => "in",
            SearchOperator::Unrecognized(symbol) => symbol,
        }
    }
}

impl From<&str> for SearchOperator {
    fn from(symbol: &str) -> Self {
        match symbol {
            "=" => SearchOperator::Eq,
            "!=" => SearchOperator::Ne,
            "contains" => SearchOperator::Contains,
            ">" => SearchOperator::Gt,
            ">=" => SearchOperator::Gte,
            "<" => SearchOperator::Lt,
            "<=" => SearchOperator::Lte,
            "in" => SearchOperator::In,
            other => SearchOperator::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for SearchOperator {
    fn from(symbol: String) -> Self {
        SearchOperator::from(symbol.as_str())
    }
}

impl From<SearchOperator> for String {
    fn from(operator: SearchOperator) -> Self {
        operator.as_str().to_string()
    }
}

impl fmt::Display for SearchOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single-column comparison: `{ column, operator, value }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCondition {
    pub column: String,
    #[serde(default)]
    pub operator: SearchOperator,
    pub value: Value,
}

/// Errors produced while parsing a textual condition such as `age>=18`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConditionParseError {
    #[error("No operator found in condition: {0:?}")]
    MissingOperator(String),
    #[error("Missing column name in condition: {0:?}")]
    MissingColumn(String),
}

/// Word operators are matched with surrounding spaces, symbols without.
/// Two-character symbols come before their one-character prefixes.
const PARSE_ORDER: [(&str, SearchOperator); 8] = [
    (" contains ", SearchOperator::Contains),
    (" in ", SearchOperator::In),
    (">=", SearchOperator::Gte),
    ("<=", SearchOperator::Lte),
    ("!=", SearchOperator::Ne),
    (">", SearchOperator::Gt),
    ("<", SearchOperator::Lt),
    ("=", SearchOperator::Eq),
];

impl SearchCondition {
    pub fn new(
        column: impl Into<String>,
        operator: SearchOperator,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    /// Shorthand for an equality condition.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, SearchOperator::Eq, value)
    }

    /// Parses `column<op>value`, e.g. `age>=18`, `name contains ann`,
    /// `role in admin,editor`.
    ///
    /// Values are read as JSON scalars when possible (`18`, `true`, `null`)
    /// and fall back to strings. The `in` operator splits on commas.
    pub fn parse(expression: &str) -> Result<Self, ConditionParseError> {
        let (index, symbol, operator) = PARSE_ORDER
            .iter()
            .filter_map(|(symbol, operator)| {
                expression
                    .find(symbol)
                    .map(|index| (index, *symbol, operator.clone()))
            })
            .min_by_key(|(index, _, _)| *index)
            .ok_or_else(|| ConditionParseError::MissingOperator(expression.to_string()))?;

        let column = expression[..index].trim();
        if column.is_empty() {
            return Err(ConditionParseError::MissingColumn(expression.to_string()));
        }
        let raw_value = expression[index + symbol.len()..].trim();

        let value = match operator {
            SearchOperator::In => Value::Array(
                raw_value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(parse_scalar)
                    .collect(),
            ),
            SearchOperator::Contains => Value::String(unquote(raw_value).to_string()),
            _ => parse_scalar(raw_value),
        };

        Ok(Self::new(column, operator, value))
    }
}

fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .or_else(|| text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')))
        .unwrap_or(text)
}

fn parse_scalar(text: &str) -> Value {
    let unquoted = unquote(text);
    if unquoted.len() != text.len() {
        return Value::String(unquoted.to_string());
    }
    match serde_json::from_str::<Value>(text) {
        Ok(value @ (Value::Bool(_) | Value::Null | Value::Number(_))) => value,
        _ => Value::String(text.to_string()),
    }
}
