//! Extraction of JSON payloads from model output.
//!
//! Hosted models are asked for "exclusively a valid JSON object", but in
//! practice the reply frequently arrives wrapped in Markdown code fences
//! (```` ```json ... ``` ````).  This module owns the defensive contract for
//! turning such output into parsed JSON: strip known wrapper markers, then
//! parse; on failure return a tagged error, never panic.

use serde::de::DeserializeOwned;
use std::error::Error;
use std::fmt;

/// A model reply could not be interpreted as the expected JSON payload.
#[derive(Debug, Clone)]
pub struct PayloadError {
    message: String,
}

impl PayloadError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unusable model payload: {}", self.message)
    }
}

impl Error for PayloadError {}

/// Remove a leading ```` ```json ```` / ```` ``` ```` fence and a trailing
/// ```` ``` ```` fence, if present, and trim surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut payload = raw.trim();
    if let Some(rest) = payload.strip_prefix("```json") {
        payload = rest;
    } else if let Some(rest) = payload.strip_prefix("```") {
        payload = rest;
    }
    if let Some(rest) = payload.strip_suffix("```") {
        payload = rest;
    }
    payload.trim()
}

/// Parse model output as a JSON value after fence stripping.
pub fn extract_json(raw: &str) -> Result<serde_json::Value, PayloadError> {
    let payload = strip_code_fences(raw);
    if payload.is_empty() {
        return Err(PayloadError::new("empty response"));
    }
    serde_json::from_str(payload).map_err(|e| PayloadError::new(e.to_string()))
}

/// Parse model output directly into a deserializable type.
pub fn extract_typed<T: DeserializeOwned>(raw: &str) -> Result<T, PayloadError> {
    let value = extract_json(raw)?;
    serde_json::from_value(value).map_err(|e| PayloadError::new(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_json_parses() {
        let value = extract_json(r#"{"name": "Chez Paul"}"#).unwrap();
        assert_eq!(value, json!({"name": "Chez Paul"}));
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let raw = "```json\n{\"name\": \"Chez Paul\"}\n```";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["name"], "Chez Paul");
    }

    #[test]
    fn fence_without_language_tag_is_unwrapped() {
        let raw = "```\n{\"ok\": true}\n```";
        assert_eq!(extract_json(raw).unwrap(), json!({"ok": true}));
    }

    #[test]
    fn prose_is_a_tagged_error_not_a_panic() {
        assert!(extract_json("I could not find anything, sorry!").is_err());
        assert!(extract_json("").is_err());
        assert!(extract_json("``````").is_err());
    }

    #[test]
    fn typed_extraction_deserializes() {
        #[derive(serde::Deserialize)]
        struct Venue {
            name: String,
        }
        let venue: Venue = extract_typed("```json\n{\"name\": \"Padel Club\"}\n```").unwrap();
        assert_eq!(venue.name, "Padel Club");
    }
}
