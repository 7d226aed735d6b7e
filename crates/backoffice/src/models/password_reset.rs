use std::sync::LazyLock;

use backoffice_core::schema::{Field, Schema};
use backoffice_core::storage::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

static PASSWORD_RESET_SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(vec![
        Field::string("id"),
        Field::string("userId"),
        Field::string("token"),
        Field::datetime("expiresAt"),
        Field::datetime("usedAt").nullable(),
        Field::datetime("createdAt"),
        Field::datetime("updatedAt"),
    ])
});

/// A single-use password reset token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordReset {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PasswordReset {
    /// Unused and not yet expired at `now`.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && self.expires_at > now
    }
}

impl Entity for PasswordReset {
    const NAME: &'static str = "PasswordReset";

    fn schema() -> &'static Schema {
        &PASSWORD_RESET_SCHEMA
    }
}
