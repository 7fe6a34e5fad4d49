//! Extraction of a single JSON object from model output.
//!
//! Models asked for "only JSON" still sometimes wrap it in a Markdown fence or
//! add a sentence around it, so parsing falls back to the first embedded
//! object that parses before giving up.

use super::ProviderError;
use serde_json::{Deserializer, Map, Value};

/// Parse `text` as one JSON object.
pub fn parse_json_object(text: &str) -> Result<Map<String, Value>, ProviderError> {
    let trimmed = strip_code_fence(text.trim());

    if trimmed.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }

    let value = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => value,
        Err(first_err) => embedded_object(trimmed)
            .map(Value::Object)
            .ok_or_else(|| ProviderError::MalformedReply(first_err.to_string()))?,
    };

    match value {
        Value::Object(object) => Ok(object),
        other => Err(ProviderError::MalformedReply(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

/// Remove a surrounding ```` ``` ```` / ```` ```json ```` fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. "json") on the opening fence line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// First `{` from which a complete JSON object parses; text after it is ignored.
fn embedded_object(text: &str) -> Option<Map<String, Value>> {
    text.match_indices('{').find_map(|(start, _)| {
        match Deserializer::from_str(&text[start..]).into_iter::<Value>().next() {
            Some(Ok(Value::Object(object))) => Some(object),
            _ => None,
        }
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
