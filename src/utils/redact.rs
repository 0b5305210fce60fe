use serde_json::Value as JsonValue;

/// Longest inline blob kept verbatim in logs.
const MAX_INLINE_DATA_CHARS: usize = 64;

/// Copy of a Gemini payload that is safe to log.
///
/// Free-text fields that carry traveller input (prompts, destinations,
/// descriptions) are masked; base64 `data` blobs are replaced by their size.
pub fn redact_payload(data: &JsonValue) -> JsonValue {
    match data {
        JsonValue::Object(map) => {
            let mut redacted = serde_json::Map::new();
            for (key, value) in map {
                let next = if is_inline_data_field(key) {
                    summarize_blob(value)
                } else if is_sensitive_field(key) {
                    mask_string(value)
                } else {
                    redact_payload(value)
                };
                redacted.insert(key.clone(), next);
            }
            JsonValue::Object(redacted)
        }
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(redact_payload).collect()),
        _ => data.clone(),
    }
}

fn is_sensitive_field(field_name: &str) -> bool {
    matches!(
        field_name.to_lowercase().as_str(),
        "text" | "description" | "title" | "destination" | "location" | "source" | "details"
    )
}

fn is_inline_data_field(field_name: &str) -> bool {
    field_name == "data"
}

fn mask_string(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::String(s) if !s.is_empty() => {
            JsonValue::String(format!("[REDACTED {} chars]", s.chars().count()))
        }
        _ => value.clone(),
    }
}

fn summarize_blob(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::String(s) if s.len() > MAX_INLINE_DATA_CHARS => {
            JsonValue::String(format!("[inline data {} bytes]", s.len()))
        }
        _ => value.clone(),
    }
}
