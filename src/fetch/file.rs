use async_trait::async_trait;
use serde_json::Value;

use super::{parse_envelope, FetchError, ListSource, DEFAULT_LIST_KEY};

/// Reads a saved list response from disk.
#[derive(Clone, Debug)]
pub struct FileListSource {
    path: String,
    list_key: String,
}

impl FileListSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            list_key: DEFAULT_LIST_KEY.to_string(),
        }
    }

    pub fn list_key(mut self, list_key: impl Into<String>) -> Self {
        self.list_key = list_key.into();
        self
    }
}

#[async_trait]
impl ListSource for FileListSource {
    fn describe(&self) -> String {
        format!("file {}", self.path)
    }

    async fn list(&self) -> Result<Vec<Value>, FetchError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FetchError::Read {
                path: self.path.clone(),
                source: e,
            })?;
        let body: Value = serde_json::from_str(&contents).map_err(|e| FetchError::Decode {
            origin: self.path.clone(),
            source: e,
        })?;
        parse_envelope(body, &self.list_key)
    }
}
