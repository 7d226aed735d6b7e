//! The search condition language shared by every backend.

mod condition;
mod matcher;
mod predicate;

pub use condition::{ConditionParseError, SearchCondition, SearchOperator};
pub use matcher::{
    compare_values, matches_all, matches_predicate, matches_query, sort_records, value_to_text,
    values_equal,
};
pub use predicate::{normalize, normalize_query, Comparison, Predicate};
