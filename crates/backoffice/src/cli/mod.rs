//! CLI command definitions.

pub mod users;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{BackendKind, Config};

/// Manage backoffice data on any configured storage backend.
#[derive(Debug, Parser)]
#[command(name = "backoffice")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Storage backend (overrides BACKOFFICE_BACKEND).
    #[arg(long)]
    pub backend: Option<BackendKind>,

    /// SQLite database path (overrides SQLITE_PATH).
    #[arg(long)]
    pub sqlite_path: Option<String>,

    /// Admin API base URL (overrides API_BASE_URL).
    #[arg(long)]
    pub api_url: Option<String>,

    /// Directory of JSON documents (overrides LOCAL_DATA_DIR).
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Output format.
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,

    /// Emit logs as JSON lines on stderr.
    #[arg(long)]
    pub log_json: bool,

    /// Suppress non-essential output.
    #[arg(long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Applies command-line overrides on top of the environment.
    pub fn apply(&self, config: &mut Config) {
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(path) = &self.sqlite_path {
            config.sqlite_path = path.clone();
        }
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.local_data_dir = dir.clone();
        }
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// Human-readable summary.
    Text,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// User management.
    Users(users::UsersCommand),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_flags_override_environment() {
        let cli = Cli::parse_from([
            "backoffice",
            "--backend",
            "local",
            "--data-dir",
            "fixtures",
            "users",
            "get",
            "u1",
        ]);
        let env: HashMap<&str, &str> = HashMap::from([("BACKOFFICE_BACKEND", "remote")]);
        let mut config = Config::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        cli.apply(&mut config);

        assert_eq!(config.backend, BackendKind::Local);
        assert_eq!(config.local_data_dir, "fixtures");
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
