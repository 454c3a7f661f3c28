//! Defensive JSON Extraction
//!
//! LLM responses wrap their payload in prose or markdown fences often
//! enough that every parse goes through these helpers. A response with no
//! recognizable JSON region is a soft failure, not a crash.

use serde::de::DeserializeOwned;
use tracing::warn;

/// Slice out the JSON object or array embedded in a response: first `{` to
/// last `}` (or first `[` to last `]`, whichever opens earlier).
pub fn extract_json_region(raw: &str) -> Option<&str> {
    let obj = region(raw, '{', '}');
    let arr = region(raw, '[', ']');
    match (obj, arr) {
        (Some((os, oe)), Some((as_, ae))) => {
            if os < as_ {
                Some(&raw[os..=oe])
            } else {
                Some(&raw[as_..=ae])
            }
        }
        (Some((s, e)), None) | (None, Some((s, e))) => Some(&raw[s..=e]),
        (None, None) => None,
    }
}

fn region(raw: &str, open: char, close: char) -> Option<(usize, usize)> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    (end > start).then_some((start, end))
}

/// Remove markdown code fences and trim
pub fn strip_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse a typed value out of a raw response, trying the sliced region
/// first and the fence-stripped text second. Logs and returns `None` on
/// failure.
pub fn parse_lenient<T: DeserializeOwned>(raw: &str) -> Option<T> {
    if let Some(region) = extract_json_region(raw) {
        if let Ok(value) = serde_json::from_str(region) {
            return Some(value);
        }
    }
    let stripped = strip_fences(raw);
    match serde_json::from_str(&stripped) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, "response carried no parseable JSON");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_object_from_prose() {
        let raw = "Sure, here you go: {\"a\": 1} hope that helps";
        assert_eq!(extract_json_region(raw), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extracts_array() {
        let raw = "[1, 2, 3] trailing";
        assert_eq!(extract_json_region(raw), Some("[1, 2, 3]"));
    }

    #[test]
    fn test_object_wins_when_it_opens_first() {
        let raw = "{\"items\": [1, 2]}";
        assert_eq!(extract_json_region(raw), Some("{\"items\": [1, 2]}"));
    }

    #[test]
    fn test_no_region() {
        assert_eq!(extract_json_region("no json here"), None);
    }

    #[test]
    fn test_parse_lenient_fenced() {
        let raw = "```json\n{\"similarity_score\": 0.95}\n```";
        let value: serde_json::Value = parse_lenient(raw).unwrap();
        assert_eq!(value["similarity_score"], 0.95);
    }

    #[test]
    fn test_parse_lenient_garbage_is_none() {
        assert!(parse_lenient::<serde_json::Value>("not json at all").is_none());
    }
}
