use std::{env, fmt, str::FromStr};

use backoffice_client::ApiClient;
use backoffice_core::storage::RepositoryError;

use crate::services::AuthSettings;
use crate::storage::tabular::{TabularConfig, DEFAULT_BASE_URL};

/// Storage backend the repositories are built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BackendKind {
    #[default]
    Sqlite,
    Remote,
    Tabular,
    Local,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::Remote => "remote",
            BackendKind::Tabular => "tabular",
            BackendKind::Local => "local",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(BackendKind::Sqlite),
            "remote" => Ok(BackendKind::Remote),
            "tabular" => Ok(BackendKind::Tabular),
            "local" => Ok(BackendKind::Local),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Storage backend (default: sqlite)
    pub backend: BackendKind,
    /// Path to SQLite database file (default: "backoffice.db")
    pub sqlite_path: String,
    /// Base URL of the admin API (default: "http://localhost:8080")
    pub api_base_url: String,
    /// Bearer token for the admin API
    pub api_access_token: Option<String>,
    pub airtable_api_key: Option<String>,
    pub airtable_app_id: Option<String>,
    /// Table holding users (default: "users")
    pub airtable_table: String,
    pub airtable_view: Option<String>,
    /// Airtable API host (default: "https://api.airtable.com")
    pub airtable_base_url: String,
    /// Directory of JSON documents (default: "data")
    pub local_data_dir: String,
    /// Base URL for links in emails (default: "http://localhost:3000")
    pub app_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `BACKOFFICE_BACKEND` - sqlite, remote, tabular or local (default: sqlite)
    /// - `SQLITE_PATH` - SQLite database path (default: "backoffice.db")
    /// - `API_BASE_URL` - Admin API base URL (default: "http://localhost:8080")
    /// - `API_ACCESS_TOKEN` - Admin API bearer token (optional)
    /// - `AIRTABLE_API_KEY`, `AIRTABLE_APP_ID` - required by the tabular backend
    /// - `AIRTABLE_TABLE` - Table name (default: "users")
    /// - `AIRTABLE_VIEW` - View name (optional)
    /// - `AIRTABLE_BASE_URL` - API host (default: "https://api.airtable.com")
    /// - `LOCAL_DATA_DIR` - Document directory (default: "data")
    /// - `APP_URL` - Base URL for email links (default: "http://localhost:3000")
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or_default =
            |key: &str, default: &str| optional(key).unwrap_or_else(|| default.to_string());

        let backend = match optional("BACKOFFICE_BACKEND").map(|v| v.parse::<BackendKind>()) {
            Some(Ok(kind)) => kind,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Invalid BACKOFFICE_BACKEND, using sqlite");
                BackendKind::default()
            }
            None => BackendKind::default(),
        };

        Self {
            backend,
            sqlite_path: or_default("SQLITE_PATH", "backoffice.db"),
            api_base_url: or_default("API_BASE_URL", "http://localhost:8080"),
            api_access_token: optional("API_ACCESS_TOKEN"),
            airtable_api_key: optional("AIRTABLE_API_KEY"),
            airtable_app_id: optional("AIRTABLE_APP_ID"),
            airtable_table: or_default("AIRTABLE_TABLE", "users"),
            airtable_view: optional("AIRTABLE_VIEW"),
            airtable_base_url: or_default("AIRTABLE_BASE_URL", DEFAULT_BASE_URL),
            local_data_dir: or_default("LOCAL_DATA_DIR", "data"),
            app_url: or_default("APP_URL", "http://localhost:3000"),
        }
    }

    /// Fails with `ConnectionFailed` when the API key or app id is missing.
    pub fn tabular(&self) -> Result<TabularConfig, RepositoryError> {
        Ok(TabularConfig::new(
            self.airtable_api_key.clone(),
            self.airtable_app_id.clone(),
            self.airtable_table.clone(),
        )?
        .with_view(self.airtable_view.clone())
        .with_base_url(self.airtable_base_url.clone()))
    }

    pub fn api_client(&self) -> Result<ApiClient, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("backoffice/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let client = ApiClient::with_client(http, self.api_base_url.clone());
        Ok(match &self.api_access_token {
            Some(token) => client.with_token(token.clone()),
            None => client,
        })
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings::new(self.app_url.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
