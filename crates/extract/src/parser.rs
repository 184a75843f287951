//! Turn free-form model replies into extraction records

use crate::schema::Extraction;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Class used when an item carries span text but no category.
pub const DEFAULT_CLASS: &str = "entity";

const LIST_KEYS: &[&str] = &["extractions", "entities", "items", "results"];
const CLASS_KEYS: &[&str] = &["extraction_class", "class", "type", "label", "category"];
const TEXT_KEYS: &[&str] = &["extraction_text", "text", "span", "value", "name"];
const ATTRIBUTE_KEYS: &[&str] = &["attributes", "attrs", "properties"];
/// Keys that mark an object as a status report rather than a class map
const STATUS_KEYS: &[&str] = &["error", "errors", "message", "detail", "status"];

/// Remove surrounding markdown code fences (```json ... ```) from a reply
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the language tag on the opening fence line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };

    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a model reply into extraction records.
///
/// Never fails. An empty reply or an empty list gives no records; a reply
/// that is not usable JSON gives a single record spanning `source_text`.
pub fn parse_extractions(reply: &str, source_text: &str) -> Vec<Extraction> {
    let cleaned = strip_code_fence(reply);
    if cleaned.is_empty() {
        debug!("Empty model reply, no extractions");
        return Vec::new();
    }

    let records = parse_json_payload(cleaned).and_then(|value| records_from_value(&value));

    match records {
        Some(records) => records,
        None => {
            warn!(
                reply_chars = cleaned.chars().count(),
                "Model reply is not usable JSON, falling back to whole-text record"
            );
            fallback(source_text)
        }
    }
}

/// Clean up an optimize reply: fences and surrounding whitespace go away
pub fn parse_optimized_text(reply: &str) -> String {
    strip_code_fence(reply).to_string()
}

fn fallback(source_text: &str) -> Vec<Extraction> {
    if source_text.trim().is_empty() {
        Vec::new()
    } else {
        vec![Extraction::fallback(source_text)]
    }
}

/// Parse the reply as JSON, then retry on the outermost bracketed span
/// for replies that wrap JSON in prose.
fn parse_json_payload(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }

    let start = text.find(['[', '{'])?;
    let close = if text[start..].starts_with('[') { ']' } else { '}' };
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }

    serde_json::from_str::<Value>(&text[start..=end]).ok()
}

fn records_from_value(value: &Value) -> Option<Vec<Extraction>> {
    match value {
        Value::Array(items) => Some(items.iter().filter_map(record_from_item).collect()),
        Value::Object(obj) => {
            if let Some(items) = LIST_KEYS
                .iter()
                .find_map(|key| obj.get(*key).and_then(Value::as_array))
            {
                return Some(items.iter().filter_map(record_from_item).collect());
            }

            if first_string(obj, TEXT_KEYS).is_some() {
                return Some(record_from_item(value).into_iter().collect());
            }

            records_from_class_map(obj)
        }
        _ => None,
    }
}

/// `{"person": ["Ada", "Charles"], "location": ["London"]}` style replies.
///
/// Every value must be a list of strings. Flat string values are rejected so
/// that `{"error": "no entities found"}` is not mistaken for an entity.
fn records_from_class_map(obj: &Map<String, Value>) -> Option<Vec<Extraction>> {
    if obj.keys().any(|key| STATUS_KEYS.contains(&key.to_ascii_lowercase().as_str())) {
        return None;
    }

    let mut records = Vec::new();
    for (class, value) in obj {
        let items = value.as_array()?;
        for item in items {
            let text = item.as_str()?.trim();
            if !text.is_empty() {
                records.push(Extraction::new(class.as_str(), text));
            }
        }
    }
    Some(records)
}

/// Only objects with span text become records; bare strings carry no class
/// and are skipped.
fn record_from_item(item: &Value) -> Option<Extraction> {
    match item {
        Value::Object(obj) => {
            let text = first_string(obj, TEXT_KEYS)?;
            let class = first_string(obj, CLASS_KEYS).unwrap_or(DEFAULT_CLASS);

            let mut record = Extraction::new(class, text);
            if let Some(attributes) = ATTRIBUTE_KEYS
                .iter()
                .find_map(|key| obj.get(*key).and_then(Value::as_object))
                .filter(|attributes| !attributes.is_empty())
            {
                record = record.with_attributes(attributes.clone());
            }
            Some(record)
        }
        _ => None,
    }
}

fn first_string<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}
