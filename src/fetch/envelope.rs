use serde_json::Value;

use super::FetchError;
use crate::utils::value_kind;

pub const DEFAULT_LIST_KEY: &str = "data";

/// Pulls the raw entity list out of a response body.
///
/// Accepted shapes: a bare array, `{ "<key>": [...] }`,
/// `{ "data": { "<key>": [...] } }` and `{ "data": { "items": [...] } }`.
/// `{ "success": false, ... }` is a rejection; a null list is an empty one.
pub fn parse_envelope(body: Value, list_key: &str) -> Result<Vec<Value>, FetchError> {
    let map = match body {
        Value::Array(items) => return Ok(items),
        Value::Object(map) => map,
        other => {
            return Err(FetchError::MalformedEnvelope {
                reason: format!("expected an object or array, got {}", value_kind(&other)),
            })
        }
    };

    if let Some(Value::Bool(false)) = map.get("success") {
        let message = ["message", "error", "msg"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .unwrap_or("request was rejected")
            .to_string();
        return Err(FetchError::Rejected { message });
    }

    let data = map.get(DEFAULT_LIST_KEY);
    let candidates = [
        map.get(list_key),
        data.and_then(|d| d.get(list_key)),
        data.and_then(|d| d.get("items")),
    ];
    for candidate in candidates.into_iter().flatten() {
        match candidate {
            Value::Array(items) => return Ok(items.clone()),
            Value::Null => return Ok(Vec::new()),
            _ => continue,
        }
    }

    Err(FetchError::MalformedEnvelope {
        reason: format!("no list found under '{list_key}'"),
    })
}
