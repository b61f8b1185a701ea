use std::collections::BTreeSet;

use serde_json::{Map, Value};

pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Walks `a.b.c` through nested objects. Empty segments never match.
pub fn lookup_path<'a>(payload: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next().filter(|s| !s.is_empty())?;
    let mut current = payload.get(first)?;
    for segment in segments {
        if segment.is_empty() {
            return None;
        }
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn non_empty_str<'a>(payload: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Best human label for a record: `name`, `full_name`, `first_name last_name`,
/// then `email`.
pub fn display_name(payload: &Map<String, Value>) -> Option<String> {
    if let Some(name) =
        non_empty_str(payload, "name").or_else(|| non_empty_str(payload, "full_name"))
    {
        return Some(name.to_string());
    }
    let parts: Vec<&str> = ["first_name", "last_name"]
        .iter()
        .filter_map(|k| non_empty_str(payload, k))
        .collect();
    if !parts.is_empty() {
        return Some(parts.join(" "));
    }
    non_empty_str(payload, "email").map(str::to_string)
}

pub fn format_scalar(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.trim().is_empty() => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.is_empty() => "-".to_string(),
        Value::Array(items) => items.iter().map(format_scalar).collect::<Vec<_>>().join(", "),
        Value::Object(map) => format!("{{{} fields}}", map.len()),
    }
}

/// Flattens nested objects into dotted keys for detail views, sorted by key.
pub fn flatten_payload(payload: &Map<String, Value>) -> Vec<(String, String)> {
    let mut out = Vec::new();
    flatten_into("", payload, &mut out);
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

fn flatten_into(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, value) in map {
        let full = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(&full, inner, out),
            other => out.push((full, format_scalar(other))),
        }
    }
}

pub fn parse_capabilities_csv(value: &str) -> Result<BTreeSet<String>, String> {
    let raw = value.trim();
    if raw.is_empty() {
        return Ok(BTreeSet::new());
    }
    let mut out = BTreeSet::new();
    for part in raw.split(',') {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        if item.chars().any(char::is_whitespace) {
            return Err(format!("invalid capability '{item}'"));
        }
        out.insert(item.to_string());
    }
    Ok(out)
}

/// Splits `LEFT<sep>RIGHT`, both sides required.
pub fn split_pair(value: &str, sep: char) -> Result<(String, String), String> {
    let (left, right) = value
        .split_once(sep)
        .ok_or_else(|| format!("expected format NAME{sep}VALUE"))?;
    let left = left.trim();
    let right = right.trim();
    if left.is_empty() || right.is_empty() {
        return Err(format!("expected format NAME{sep}VALUE"));
    }
    Ok((left.to_string(), right.to_string()))
}
