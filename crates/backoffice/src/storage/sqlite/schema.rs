//! SQLite schema definitions and the table registry.
//!
//! Pure data, no I/O. Every table the relational backend can reach is listed
//! here; column names coming from callers are checked against it before they
//! are spliced into SQL.

/// SQL statement to create all tables.
pub const CREATE_TABLES: &str = r#"
-- Users table
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL DEFAULT '',
    permissions TEXT NOT NULL DEFAULT '[]',
    isActive INTEGER NOT NULL DEFAULT 1,
    emailVerified INTEGER NOT NULL DEFAULT 0,
    createdAt TEXT NOT NULL,
    updatedAt TEXT NOT NULL
);

-- Password reset tokens
CREATE TABLE IF NOT EXISTS password_resets (
    id TEXT PRIMARY KEY,
    userId TEXT NOT NULL,
    token TEXT NOT NULL UNIQUE,
    expiresAt TEXT NOT NULL,
    usedAt TEXT,
    createdAt TEXT NOT NULL,
    updatedAt TEXT NOT NULL,
    FOREIGN KEY (userId) REFERENCES users(id) ON DELETE CASCADE
);

-- Email verification tokens
CREATE TABLE IF NOT EXISTS email_verifications (
    id TEXT PRIMARY KEY,
    userId TEXT NOT NULL,
    token TEXT NOT NULL UNIQUE,
    expiresAt TEXT NOT NULL,
    createdAt TEXT NOT NULL,
    updatedAt TEXT NOT NULL,
    FOREIGN KEY (userId) REFERENCES users(id) ON DELETE CASCADE
);

-- Indexes for token lookups
CREATE INDEX IF NOT EXISTS idx_password_resets_user_id ON password_resets(userId);
CREATE INDEX IF NOT EXISTS idx_email_verifications_user_id ON email_verifications(userId);
"#;

/// How a column's values are stored and decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
    /// Stored as 0/1.
    Boolean,
    /// Arbitrary JSON, stored as TEXT.
    Json,
    /// RFC 3339 UTC with millisecond precision, stored as TEXT.
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

/// A table reachable through the relational backend.
#[derive(Debug, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    /// The first column is the primary key.
    pub columns: &'static [Column],
    /// Whether `createdAt`/`updatedAt` are managed by the backend.
    pub timestamps: bool,
}

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key(&self) -> &'static str {
        self.columns.first().map_or("id", |c| c.name)
    }

    /// Comma-separated, quoted column list in declaration order.
    pub fn select_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| quote_ident(c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Double-quotes an identifier. Only call with names taken from a [`TableDef`].
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub static USERS: TableDef = TableDef {
    name: "users",
    columns: &[
        col("id", ColumnKind::Text),
        col("name", ColumnKind::Text),
        col("email", ColumnKind::Text),
        col("password", ColumnKind::Text),
        col("permissions", ColumnKind::Json),
        col("isActive", ColumnKind::Boolean),
        col("emailVerified", ColumnKind::Boolean),
        col(CREATED_AT, ColumnKind::Timestamp),
        col(UPDATED_AT, ColumnKind::Timestamp),
    ],
    timestamps: true,
};

pub static PASSWORD_RESETS: TableDef = TableDef {
    name: "password_resets",
    columns: &[
        col("id", ColumnKind::Text),
        col("userId", ColumnKind::Text),
        col("token", ColumnKind::Text),
        col("expiresAt", ColumnKind::Timestamp),
        col("usedAt", ColumnKind::Timestamp),
        col(CREATED_AT, ColumnKind::Timestamp),
        col(UPDATED_AT, ColumnKind::Timestamp),
    ],
    timestamps: true,
};

pub static EMAIL_VERIFICATIONS: TableDef = TableDef {
    name: "email_verifications",
    columns: &[
        col("id", ColumnKind::Text),
        col("userId", ColumnKind::Text),
        col("token", ColumnKind::Text),
        col("expiresAt", ColumnKind::Timestamp),
        col(CREATED_AT, ColumnKind::Timestamp),
        col(UPDATED_AT, ColumnKind::Timestamp),
    ],
    timestamps: true,
};

/// The models stored in the relational database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Model {
    User,
    PasswordReset,
    EmailVerification,
}

impl Model {
    pub const ALL: [Model; 3] = [Model::User, Model::PasswordReset, Model::EmailVerification];

    pub fn table(self) -> &'static TableDef {
        match self {
            Model::User => &USERS,
            Model::PasswordReset => &PASSWORD_RESETS,
            Model::EmailVerification => &EMAIL_VERIFICATIONS,
        }
    }
}
