//! Post-processing: deterministic cleanup of model text output.
//!
//! ## Why is post-processing necessary?
//!
//! Even when the prompt demands "JSON only, no code fences", text models
//! occasionally return payloads that are *semantically correct* but
//! *structurally invalid* — for example:
//!
//! - Wrapping the JSON in ```` ```json … ``` ```` fences despite the
//!   instruction not to
//! - Prefixing the object with a sentence of commentary
//! - Returning a single-element array instead of the object itself
//!
//! This module applies cheap, deterministic rules that recover the object
//! without touching content. Keeping them here rather than in the prompt
//! means the prompt stays focused on *what to write*, not on formatting
//! edge-cases. Each rule is independently testable.
//!
//! ## Rule Order
//!
//! Fences are stripped before the brace window is computed, so fence
//! backticks never end up inside the candidate JSON; list merging runs
//! last, on already-parsed values.

use crate::error::WedcardError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Recover a JSON object from raw model output.
///
/// Applies, in order: fence stripping, a direct parse, a brace-window
/// re-parse, and list-to-object merging. Anything that still is not a
/// JSON object surfaces as [`WedcardError::MalformedModelOutput`].
pub fn extract_json_object(raw: &str) -> Result<Value, WedcardError> {
    let cleaned = strip_code_fences(raw);
    let cleaned = cleaned.trim();

    let value = match serde_json::from_str::<Value>(cleaned) {
        Ok(v) => v,
        Err(_) => {
            let windowed = window_to_braces(cleaned);
            serde_json::from_str::<Value>(windowed).map_err(|e| {
                WedcardError::MalformedModelOutput {
                    detail: format!("{e} (payload head: {:?})", head(cleaned, 120)),
                }
            })?
        }
    };

    match value {
        Value::Object(_) => Ok(value),
        Value::Array(items) => merge_array(items),
        other => Err(WedcardError::MalformedModelOutput {
            detail: format!("expected a JSON object, got {}", kind_of(&other)),
        }),
    }
}

static FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    // Opening fence with optional language tag, and the closing fence.
    Regex::new(r"(?m)^```[a-zA-Z]*\s*$|^```\s*$").expect("fence regex")
});

/// Remove Markdown code fences, keeping their contents.
fn strip_code_fences(raw: &str) -> String {
    if !raw.contains("```") {
        return raw.to_string();
    }
    FENCE_RE.replace_all(raw, "").into_owned()
}

/// Narrow to the outermost `{ … }` window, when one exists.
fn window_to_braces(raw: &str) -> &str {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end > start => &raw[start..=end],
        _ => raw,
    }
}

/// Merge an array of objects into one object (later keys win); anything
/// that is not an object is keyed by its index.
fn merge_array(items: Vec<Value>) -> Result<Value, WedcardError> {
    if items.is_empty() {
        return Err(WedcardError::MalformedModelOutput {
            detail: "model returned an empty JSON array".into(),
        });
    }
    let mut merged = serde_json::Map::new();
    for (idx, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => merged.extend(map),
            other => {
                merged.insert(idx.to_string(), other);
            }
        }
    }
    Ok(Value::Object(merged))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn head(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
