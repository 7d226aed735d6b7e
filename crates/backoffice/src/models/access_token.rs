use serde::{Deserialize, Serialize};

/// Issued on a successful sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub id: String,
    pub permissions: Vec<String>,
}

/// Returned instead of a token while the account's email is unverified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailVerificationRequired {
    pub email_verification_required: bool,
    pub message: String,
}
