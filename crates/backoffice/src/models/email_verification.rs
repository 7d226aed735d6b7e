use std::sync::LazyLock;

use backoffice_core::schema::{Field, Schema};
use backoffice_core::storage::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

static EMAIL_VERIFICATION_SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(vec![
        Field::string("id"),
        Field::string("userId"),
        Field::string("token"),
        Field::datetime("expiresAt"),
        Field::datetime("createdAt"),
        Field::datetime("updatedAt"),
    ])
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailVerification {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmailVerification {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl Entity for EmailVerification {
    const NAME: &'static str = "EmailVerification";

    fn schema() -> &'static Schema {
        &EMAIL_VERIFICATION_SCHEMA
    }
}
