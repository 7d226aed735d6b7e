use std::sync::LazyLock;

use backoffice_core::schema::{Field, FieldType, Schema};
use backoffice_core::storage::Entity;
use serde::{Deserialize, Serialize};

static AUTH_SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(vec![
        Field::string("id"),
        Field::string("email"),
        Field::string("password"),
        Field::string("name"),
        Field::array("permissions", FieldType::String),
        Field::boolean("isActive"),
        Field::boolean("emailVerified"),
    ])
});

/// The credential-bearing view of a user row. `password` is the stored hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auth {
    pub id: String,
    pub email: String,
    pub password: String,
    pub name: String,
    pub permissions: Vec<String>,
    pub is_active: bool,
    pub email_verified: bool,
}

impl Entity for Auth {
    const NAME: &'static str = "Auth";

    fn schema() -> &'static Schema {
        &AUTH_SCHEMA
    }
}
