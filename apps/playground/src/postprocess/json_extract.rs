//! Tolerant JSON extraction. Strips markdown fencing from model output and
//! attempts a structured parse. Never returns an error: failure is a value.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::Value;
use tracing::debug;

/// Fence language tags treated as JSON.
const JSON_FENCE_TAGS: &[&str] = &["json", "json5", "jsonc"];

/// Outcome of [`extract_json`].
///
/// Serialized flat with an `ok` flag:
/// `{"ok": true, "value", "cleaned_text"}` or
/// `{"ok": false, "error", "original_text"}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed {
        value: Value,
        cleaned_text: String,
    },
    Failed {
        error: String,
        original_text: String,
    },
}

impl ParseOutcome {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ParseOutcome::Parsed { .. })
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            ParseOutcome::Parsed { value, .. } => Some(value),
            ParseOutcome::Failed { .. } => None,
        }
    }

    /// A named top-level field of a parsed object, e.g. `game_config`.
    pub fn section(&self, key: &str) -> Option<&Value> {
        self.value()?.as_object()?.get(key)
    }
}

impl Serialize for ParseOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ParseOutcome", 3)?;
        match self {
            ParseOutcome::Parsed {
                value,
                cleaned_text,
            } => {
                state.serialize_field("ok", &true)?;
                state.serialize_field("value", value)?;
                state.serialize_field("cleaned_text", cleaned_text)?;
            }
            ParseOutcome::Failed {
                error,
                original_text,
            } => {
                state.serialize_field("ok", &false)?;
                state.serialize_field("error", error)?;
                state.serialize_field("original_text", original_text)?;
            }
        }
        state.end()
    }
}

/// Strips an opening ```` ```json ```` / ```` ``` ```` fence line and a
/// trailing ```` ``` ````. Fences tagged with another language are left alone.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    let tag_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let tag = &rest[..tag_len];
    if !tag.is_empty() && !JSON_FENCE_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
        return text;
    }

    let body = rest[tag_len..].trim_start();
    body.strip_suffix("```").unwrap_or(body).trim()
}

pub fn extract_json(text: &str) -> ParseOutcome {
    let cleaned = strip_json_fences(text);
    match serde_json::from_str::<Value>(cleaned) {
        Ok(value) => ParseOutcome::Parsed {
            value,
            cleaned_text: cleaned.to_string(),
        },
        Err(e) => {
            debug!("Model output is not JSON: {e}");
            ParseOutcome::Failed {
                error: e.to_string(),
                original_text: text.to_string(),
            }
        }
    }
}
