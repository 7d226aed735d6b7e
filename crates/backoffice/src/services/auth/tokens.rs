use chrono::{DateTime, Duration, Utc};
use rand::{distr::Alphanumeric, Rng};

pub const TOKEN_LENGTH: usize = 32;

/// Generate a random alphanumeric token for resets, verifications and
/// access tokens.
pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

pub fn calculate_expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now + ttl
}

/// Fallback display name: the local part of the email.
pub fn email_to_name(email: &str) -> String {
    match email.split('@').next() {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => "User".to_string(),
    }
}

/// `{app_url}{path}?token={token}` with exactly one slash at the join.
pub fn token_url(app_url: &str, path: &str, token: &str) -> String {
    format!("{}{path}?token={token}", app_url.trim_end_matches('/'))
}
