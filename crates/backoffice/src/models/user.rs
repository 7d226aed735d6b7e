use std::sync::LazyLock;

use backoffice_core::schema::{Field, FieldType, Schema};
use backoffice_core::storage::Entity;
use serde::{Deserialize, Serialize};

static USER_SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(vec![
        Field::string("id"),
        Field::string("name"),
        Field::string("email"),
        Field::array("permissions", FieldType::String),
    ])
});

/// A user as the admin screens see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub permissions: Vec<String>,
}

impl Entity for User {
    const NAME: &'static str = "User";

    fn schema() -> &'static Schema {
        &USER_SCHEMA
    }
}

impl User {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}
