//! User CLI commands.

use backoffice_core::search::SearchCondition;
use backoffice_core::storage::{to_record, Direction, ListParams, Record, DEFAULT_LIMIT};
use clap::{Parser, Subcommand, ValueEnum};

/// User management commands.
#[derive(Debug, Parser)]
pub struct UsersCommand {
    #[command(subcommand)]
    pub action: UsersAction,
}

/// Sort direction flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl From<SortDirection> for Direction {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => Direction::Asc,
            SortDirection::Desc => Direction::Desc,
        }
    }
}

/// Available user actions.
#[derive(Debug, Subcommand)]
pub enum UsersAction {
    /// List users.
    List {
        /// Rows to skip.
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Rows to return.
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: u64,
        /// Column to sort by.
        #[arg(long)]
        order: Option<String>,
        /// Sort direction.
        #[arg(long, default_value = "asc")]
        direction: SortDirection,
        /// Case-insensitive search across name and email.
        #[arg(long, short)]
        query: Option<String>,
        /// Filter such as `name=Ann`, `age>=18`, `name contains ann` or
        /// `role in admin,editor`. Repeatable; filters are AND-ed.
        #[arg(long = "where", value_name = "EXPR", value_parser = parse_condition)]
        conditions: Vec<SearchCondition>,
    },
    /// Get a user by ID.
    Get {
        /// User ID.
        id: String,
    },
    /// Create a user from a JSON object.
    Create {
        /// e.g. '{"name":"Ann","email":"ann@example.com","permissions":[]}'
        #[arg(value_parser = parse_record)]
        data: Record,
    },
    /// Update fields of a user from a JSON object.
    Update {
        /// User ID.
        id: String,
        #[arg(value_parser = parse_record)]
        data: Record,
    },
    /// Delete a user by ID.
    Delete {
        /// User ID.
        id: String,
    },
    /// Show the user the access token belongs to (remote backend).
    Me,
}

impl UsersAction {
    /// List parameters for a `list` action.
    pub fn list_params(&self) -> Option<ListParams> {
        match self {
            UsersAction::List {
                offset,
                limit,
                order,
                direction,
                query,
                conditions,
            } => {
                let mut params = ListParams::new(*offset, *limit).conditions(conditions.clone());
                if let Some(order) = order {
                    params = params.order_by(order.clone(), (*direction).into());
                }
                if let Some(query) = query {
                    params = params.query(query.clone());
                }
                Some(params)
            }
            _ => None,
        }
    }
}

fn parse_condition(expression: &str) -> Result<SearchCondition, String> {
    SearchCondition::parse(expression).map_err(|e| e.to_string())
}

fn parse_record(json: &str) -> Result<Record, String> {
    let value: serde_json::Value = serde_json::from_str(json).map_err(|e| e.to_string())?;
    to_record(value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use backoffice_core::search::SearchOperator;
    use serde_json::json;

    use super::*;
    use crate::cli::{Cli, Commands};

    fn action(args: &[&str]) -> UsersAction {
        let cli = Cli::parse_from(["backoffice", "users"].iter().chain(args));
        let Commands::Users(users) = cli.command;
        users.action
    }

    #[test]
    fn test_list_flags_become_params() {
        let action = action(&[
            "list", "--offset", "20", "--limit", "10", "--order", "name", "--direction", "desc",
            "--query", "ann", "--where", "age>=18", "--where", "role in admin,editor",
        ]);

        let params = action.list_params().unwrap();

        assert_eq!(params.offset, 20);
        assert_eq!(params.limit, 10);
        assert_eq!(params.order.as_deref(), Some("name"));
        assert_eq!(params.direction, Direction::Desc);
        assert_eq!(params.query.as_deref(), Some("ann"));
        assert_eq!(
            params.conditions,
            vec![
                SearchCondition::new("age", SearchOperator::Gte, 18),
                SearchCondition::new("role", SearchOperator::In, json!(["admin", "editor"])),
            ]
        );
    }

    #[test]
    fn test_list_defaults() {
        let params = action(&["list"]).list_params().unwrap();

        assert_eq!(params, ListParams::new(0, DEFAULT_LIMIT));
    }

    #[test]
    fn test_create_parses_json_object() {
        let UsersAction::Create { data } = action(&["create", r#"{"name":"Ann"}"#]) else {
            panic!("expected create");
        };
        assert_eq!(data["name"], "Ann");
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(Cli::try_parse_from(["backoffice", "users", "create", "[1]"]).is_err());
        assert!(Cli::try_parse_from(["backoffice", "users", "list", "--where", "age"]).is_err());
    }
}
