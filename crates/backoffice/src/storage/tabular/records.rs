//! Wire shapes of the tabular service.

use backoffice_core::storage::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row as the service returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularRecord {
    pub id: String,
    #[serde(default)]
    pub fields: Record,
    #[serde(rename = "createdTime", default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
}

/// One page of a list call. `offset` is the opaque cursor of the next page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TabularPage {
    #[serde(default)]
    pub records: Vec<TabularRecord>,
    #[serde(default)]
    pub offset: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateResponse {
    #[serde(default)]
    pub records: Vec<TabularRecord>,
}

/// Default transform: the row's fields with its id alongside.
pub fn flatten(record: TabularRecord) -> Value {
    let mut fields = record.fields;
    fields.insert("id".to_string(), Value::String(record.id));
    Value::Object(fields)
}
