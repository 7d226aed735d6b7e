//! Output formatting functions.

pub mod pretty;

/// Format a value as pretty-printed JSON.
pub fn format_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
