//! Wiring between configuration, repositories and CLI commands.

use anyhow::Context;
use backoffice_core::storage::{Page, Repository};
use serde_json::json;

use crate::cli::users::UsersAction;
use crate::cli::OutputFormat;
use crate::config::{BackendKind, Config};
use crate::models::User;
use crate::output::{format_json, pretty};
use crate::repositories::UserRepository;
use crate::storage::SqliteDatabase;

/// Builds the user repository for the configured backend.
pub async fn user_repository(config: &Config) -> anyhow::Result<UserRepository> {
    tracing::debug!(backend = %config.backend, "Building user repository");
    let repository = match config.backend {
        BackendKind::Sqlite => {
            let db = SqliteDatabase::open(&config.sqlite_path)
                .await
                .with_context(|| format!("opening SQLite database {}", config.sqlite_path))?;
            UserRepository::sqlite(db)
        }
        BackendKind::Remote => {
            UserRepository::remote(config.api_client().context("building HTTP client")?)
        }
        BackendKind::Tabular => UserRepository::tabular(config.tabular()?),
        BackendKind::Local => UserRepository::local(&config.local_data_dir),
    };
    Ok(repository)
}

/// Result of one users command.
#[derive(Debug, Clone, PartialEq)]
pub enum UsersOutput {
    User(User),
    Users(Page<User>),
    Deleted(String),
}

impl UsersOutput {
    pub fn render(&self, format: OutputFormat) -> String {
        match (self, format) {
            (UsersOutput::User(user), OutputFormat::Json) => format_json(user),
            (UsersOutput::User(user), OutputFormat::Text) => pretty::format_user(user),
            (UsersOutput::Users(page), OutputFormat::Json) => format_json(page),
            (UsersOutput::Users(page), OutputFormat::Text) => pretty::format_users(page),
            (UsersOutput::Deleted(id), OutputFormat::Json) => {
                format_json(&json!({ "deleted": id }))
            }
            (UsersOutput::Deleted(id), OutputFormat::Text) => format!("Deleted user {id}"),
        }
    }
}

pub async fn run_users(
    repository: &UserRepository,
    action: UsersAction,
) -> anyhow::Result<UsersOutput> {
    let output = match action {
        list @ UsersAction::List { .. } => {
            let params = list.list_params().unwrap_or_default();
            UsersOutput::Users(repository.get(params).await?)
        }
        UsersAction::Get { id } => UsersOutput::User(repository.find_by_id(&id).await?),
        UsersAction::Create { data } => UsersOutput::User(repository.create(data).await?),
        UsersAction::Update { id, data } => UsersOutput::User(repository.update(&id, data).await?),
        UsersAction::Delete { id } => {
            repository.delete(&id).await?;
            UsersOutput::Deleted(id)
        }
        UsersAction::Me => UsersOutput::User(repository.get_me().await?),
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use backoffice_core::search::SearchCondition;
    use backoffice_core::storage::{to_record, ListParams, RepositoryError};
    use serde_json::json;

    use super::*;
    use crate::cli::users::SortDirection;

    async fn repository() -> UserRepository {
        UserRepository::sqlite(SqliteDatabase::open_in_memory().await.unwrap())
    }

    fn list(conditions: Vec<SearchCondition>) -> UsersAction {
        UsersAction::List {
            offset: 0,
            limit: 20,
            order: Some("email".to_string()),
            direction: SortDirection::Asc,
            query: None,
            conditions,
        }
    }

    #[tokio::test]
    async fn test_users_commands_round_trip() {
        let repo = repository().await;

        let created = run_users(
            &repo,
            UsersAction::Create {
                data: to_record(json!({ "name": "Ann", "email": "ann@example.com" })).unwrap(),
            },
        )
        .await
        .unwrap();
        let UsersOutput::User(ann) = created else {
            panic!("expected a user");
        };

        let listed = run_users(&repo, list(vec![SearchCondition::eq("name", "Ann")]))
            .await
            .unwrap();
        assert_eq!(
            listed,
            UsersOutput::Users(Page {
                data: vec![ann.clone()],
                count: 1,
            })
        );

        let deleted = run_users(&repo, UsersAction::Delete { id: ann.id.clone() })
            .await
            .unwrap();
        assert_eq!(deleted.render(OutputFormat::Text), format!("Deleted user {}", ann.id));

        let err = run_users(&repo, UsersAction::Get { id: ann.id.clone() })
            .await
            .unwrap_err();
        assert!(err
            .downcast_ref::<RepositoryError>()
            .is_some_and(RepositoryError::is_not_found));
    }

    #[tokio::test]
    async fn test_render_json_page() {
        let page = repository().await.get(ListParams::default()).await.unwrap();
        let output = UsersOutput::Users(page);

        let rendered: serde_json::Value =
            serde_json::from_str(&output.render(OutputFormat::Json)).unwrap();

        assert_eq!(rendered, json!({ "data": [], "count": 0 }));
    }

    #[tokio::test]
    async fn test_local_backend_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::from_lookup(|_| None);
        config.backend = BackendKind::Local;
        config.local_data_dir = dir.path().display().to_string();

        let repo = user_repository(&config).await.unwrap();

        assert_eq!(repo.get(ListParams::default()).await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn test_tabular_backend_without_credentials_fails() {
        let mut config = Config::from_lookup(|_| None);
        config.backend = BackendKind::Tabular;

        assert!(user_repository(&config).await.is_err());
    }
}
