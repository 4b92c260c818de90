//! Parse model output into raw records
//!
//! Models are asked for a bare JSON array but drift: they wrap it in
//! markdown fences, add prose around it, leave trailing commas, or return
//! an object holding the array. Strategies are tried in order until one
//! yields a valid payload; each candidate is retried once with trailing
//! commas removed.

use crate::fields::{looks_like_record, RawRecord};
use nexus_domain::text::fold_key;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?:```|~~~)[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)(?:```|~~~)")
        .expect("valid fence pattern")
});

static RECORD_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[\s*\{.*\}\s*\]").expect("valid array pattern"));

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[\}\]])").expect("valid trailing comma pattern"));

/// Folded names of fields that wrap the record array
const WRAPPER_KEYS: &[&str] = &[
    "matrix",
    "matriz",
    "test cases",
    "testcases",
    "casos de prueba",
    "casos",
    "records",
    "data",
    "items",
    "resultados",
];

/// Extract the records from a response.
///
/// Returns `None` when no strategy finds a structured payload. An empty
/// array is a valid payload and yields `Some(vec![])`.
pub fn extract_records(response: &str) -> Option<Vec<RawRecord>> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(records) = parse_payload(trimmed) {
        return Some(records);
    }

    for captures in FENCED_BLOCK.captures_iter(trimmed) {
        if let Some(records) = captures.get(1).and_then(|m| parse_payload(m.as_str())) {
            debug!("records found in fenced block");
            return Some(records);
        }
    }

    if let Some(records) = RECORD_ARRAY
        .find(trimmed)
        .and_then(|m| parse_payload(m.as_str()))
    {
        debug!("records found by array pattern");
        return Some(records);
    }

    for (open, close) in [('[', ']'), ('{', '}')] {
        if let Some(records) = between(trimmed, open, close).and_then(parse_payload) {
            debug!("records found between outermost '{}' and '{}'", open, close);
            return Some(records);
        }
    }

    None
}

/// Text from the first `open` to the last `close`, inclusive
fn between(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..end + close.len_utf8()])
}

fn parse_payload(candidate: &str) -> Option<Vec<RawRecord>> {
    let candidate = candidate.trim();
    let value = serde_json::from_str::<Value>(candidate).ok().or_else(|| {
        let relaxed = TRAILING_COMMA.replace_all(candidate, "$1");
        serde_json::from_str::<Value>(&relaxed).ok()
    })?;
    records_from_value(value)
}

fn records_from_value(value: Value) -> Option<Vec<RawRecord>> {
    match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(record) => Some(record),
                    _ => None,
                })
                .collect(),
        ),
        Value::Object(mut object) => {
            let wrapper = object
                .keys()
                .find(|k| WRAPPER_KEYS.contains(&fold_key(k).as_str()) && object[k.as_str()].is_array())
                .cloned();
            if let Some(key) = wrapper {
                return object.remove(&key).and_then(records_from_value);
            }

            let arrays_of_objects: Vec<String> = object
                .iter()
                .filter(|(_, v)| {
                    v.as_array()
                        .is_some_and(|items| items.iter().any(Value::is_object))
                })
                .map(|(k, _)| k.clone())
                .collect();
            if let [key] = arrays_of_objects.as_slice() {
                return object.remove(key).and_then(records_from_value);
            }

            looks_like_record(&object).then(|| vec![object])
        }
        _ => None,
    }
}
