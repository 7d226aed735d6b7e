use serde::{Deserialize, Serialize};

/// Outcome of a command that returns no entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_params: Option<Vec<String>>,
    pub code: u16,
}

impl Status {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            invalid_params: None,
            code: 200,
        }
    }

    pub fn failed(code: u16, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            invalid_params: None,
            code,
        }
    }

    pub fn with_invalid_params(mut self, params: Vec<String>) -> Self {
        self.invalid_params = Some(params);
        self
    }
}
