//! JSON extraction from LLM responses
//!
//! Collection agents ask for "JSON only" but models still wrap answers in
//! markdown fences or prose. These helpers pull the first JSON object/array
//! out of a free-form reply; callers fall back to defaults when nothing
//! parses.

use regex::Regex;
use std::sync::OnceLock;

fn object_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"))
}

fn array_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("static regex"))
}

/// Extract and parse the first JSON object in `text`.
pub fn extract_json_object(text: &str) -> Option<serde_json::Value> {
    if text.is_empty() {
        return None;
    }

    if let Some(m) = object_re().find(text) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(m.as_str()) {
            if value.is_object() {
                return Some(value);
            }
        }
    }

    // Fences stripped as a second chance: ```json ... ```
    let cleaned = text.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();
    serde_json::from_str::<serde_json::Value>(cleaned)
        .ok()
        .filter(|v| v.is_object())
}

/// Extract and parse the first JSON array in `text`.
pub fn extract_json_array(text: &str) -> Option<serde_json::Value> {
    if text.is_empty() {
        return None;
    }
    let m = array_re().find(text)?;
    serde_json::from_str::<serde_json::Value>(m.as_str())
        .ok()
        .filter(|v| v.is_array())
}
