use thiserror::Error;

/// What went wrong with a single value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IssueKind {
    #[error("required field is missing")]
    Missing,
    #[error("expected {expected}, got {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
    #[error("expected one of [{}], got {found:?}", .allowed.join(", "))]
    InvalidEnum { allowed: Vec<String>, found: String },
    #[error("invalid RFC 3339 datetime: {0:?}")]
    InvalidDateTime(String),
}

/// A single failed check, located by its path inside the validated value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{path}: {kind}")]
pub struct ValidationIssue {
    pub path: String,
    pub kind: IssueKind,
}

/// A value crossing the persistence boundary does not satisfy its schema.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Validation failed: {}", format_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// Shorthand for a failure with a single issue at `path`.
    pub fn single(path: impl Into<String>, kind: IssueKind) -> Self {
        Self {
            issues: vec![ValidationIssue {
                path: path.into(),
                kind,
            }],
        }
    }
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
