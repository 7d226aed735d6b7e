use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::schema::Schema;

use super::Record;

/// A type stored behind a repository.
///
/// Every entity carries its schema contract; values coming out of a backend
/// are validated against it before they are deserialized.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Name used in errors and logs, e.g. `"User"`.
    const NAME: &'static str;

    fn schema() -> &'static Schema;
}

/// Maps one backend-native record to the pre-validation entity shape.
///
/// Plain function pointers: a transform has no state and no side effects.
pub type Transform<R> = fn(R) -> Value;

/// Transform for backends whose records already have the entity shape.
pub fn identity(value: Value) -> Value {
    value
}

/// Transform for backends that hand out bare records.
pub fn from_record(record: Record) -> Value {
    Value::Object(record)
}
