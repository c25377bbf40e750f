//! Shape normalization for language-model output.

use serde_json::Value;

/// Reduce a generation payload to plain text.
///
/// A JSON string is returned as-is, an object carrying a string `content`
/// field yields that field, and anything else falls back to its JSON
/// rendering.
#[must_use]
pub fn normalize_generation(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Object(map) => match map.get("content") {
            Some(Value::String(text)) => text.clone(),
            _ => value.to_string(),
        },
        other => other.to_string(),
    }
}
