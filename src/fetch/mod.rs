//! Bulk-list collaborators and the all-or-nothing path into an [`EntityCache`].

mod envelope;
mod file;
mod http;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::{CacheEntry, EntityCache, EntryError};

pub use envelope::{parse_envelope, DEFAULT_LIST_KEY};
pub use file::FileListSource;
pub use http::{HttpListSource, HttpSourceConfig};
pub(crate) use http::build_client;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid header '{header}', expected 'Key: Value'")]
    InvalidHeader { header: String },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON from {origin}: {source}")]
    Decode {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("server rejected the request: {message}")]
    Rejected { message: String },

    #[error("unexpected response shape: {reason}")]
    MalformedEnvelope { reason: String },

    #[error("record #{index} is unusable: {source}")]
    InvalidEntry {
        index: usize,
        #[source]
        source: EntryError,
    },
}

/// Upstream that returns the full current list for one resource.
#[async_trait]
pub trait ListSource: Send + Sync {
    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;

    async fn list(&self) -> Result<Vec<Value>, FetchError>;
}

/// Maps every raw element, failing the whole batch on the first bad one.
pub fn map_entries(raw: Vec<Value>, id_field: &str) -> Result<Vec<CacheEntry>, FetchError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, value)| {
            CacheEntry::from_raw(value, id_field)
                .map_err(|source| FetchError::InvalidEntry { index, source })
        })
        .collect()
}

pub async fn fetch_entries(
    source: &dyn ListSource,
    id_field: &str,
) -> Result<Vec<CacheEntry>, FetchError> {
    let raw = source.list().await?;
    map_entries(raw, id_field)
}

/// Fetches and maps the list, then swaps it into `cache`. On any failure the
/// cache keeps its previous snapshot.
pub async fn load_into(
    source: &dyn ListSource,
    cache: &mut EntityCache,
    id_field: &str,
) -> Result<usize, FetchError> {
    match fetch_entries(source, id_field).await {
        Ok(entries) => {
            let count = entries.len();
            cache.replace_all(entries);
            info!(source = %source.describe(), count, "loaded list");
            Ok(count)
        }
        Err(e) => {
            warn!(
                source = %source.describe(),
                error = %e,
                "list load failed, keeping previous snapshot"
            );
            Err(e)
        }
    }
}
