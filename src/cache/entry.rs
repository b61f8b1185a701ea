use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// One entity from a bulk list, keyed by the id the upstream assigned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub id: String,
    pub payload: Map<String, Value>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryError {
    #[error("expected a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },

    #[error("missing id field '{field}'")]
    MissingId { field: String },

    #[error("id field '{field}' must be a non-empty string or an integer")]
    InvalidId { field: String },
}

impl CacheEntry {
    pub fn new(id: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }

    /// Maps one raw list element into an entry. The whole object is kept as
    /// the payload, id field included.
    pub fn from_raw(raw: Value, id_field: &str) -> Result<Self, EntryError> {
        let payload = match raw {
            Value::Object(map) => map,
            other => {
                return Err(EntryError::NotAnObject {
                    kind: crate::utils::value_kind(&other),
                })
            }
        };
        let id = match payload.get(id_field) {
            None | Some(Value::Null) => {
                return Err(EntryError::MissingId {
                    field: id_field.to_string(),
                })
            }
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => n.to_string(),
            Some(_) => {
                return Err(EntryError::InvalidId {
                    field: id_field.to_string(),
                })
            }
        };
        Ok(Self { id, payload })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Dotted-path access into nested objects, e.g. `settings.autopay.enabled`.
    pub fn field(&self, path: &str) -> Option<&Value> {
        crate::utils::lookup_path(&self.payload, path)
    }

    pub fn display_name(&self) -> String {
        crate::utils::display_name(&self.payload).unwrap_or_else(|| self.id.clone())
    }
}
