//! Page-scoped snapshot of one bulk list, keyed by entity id.
//!
//! The cache is only ever written by [`EntityCache::replace_all`]; detail views
//! read it through [`EntityCache::lookup`] or [`EntityCache::try_lookup`] and
//! never trigger a fetch of their own. A miss is an ordinary result the caller
//! has to surface.

mod entry;

use std::collections::HashMap;
use std::time::Instant;

use thiserror::Error;
use tracing::debug;

pub use entry::{CacheEntry, EntryError};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CacheMiss {
    #[error("no records loaded yet, cannot show '{id}'")]
    NotLoaded { id: String },

    #[error("record '{id}' not found, reload the list and try again")]
    NotFound { id: String },
}

impl CacheMiss {
    pub fn id(&self) -> &str {
        match self {
            CacheMiss::NotLoaded { id } | CacheMiss::NotFound { id } => id,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct EntityCache {
    entries: HashMap<String, CacheEntry>,
    loaded_at: Option<Instant>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards the current snapshot and rebuilds it from `entities`.
    ///
    /// Later entries overwrite earlier ones with the same id. An empty input
    /// leaves a loaded, empty cache.
    pub fn replace_all<I>(&mut self, entities: I)
    where
        I: IntoIterator<Item = CacheEntry>,
    {
        let mut next = HashMap::new();
        for entry in entities {
            next.insert(entry.id.clone(), entry);
        }
        debug!(
            previous = self.entries.len(),
            current = next.len(),
            "rebuilt entity cache"
        );
        self.entries = next;
        self.loaded_at = Some(Instant::now());
    }

    pub fn lookup(&self, id: &str) -> Option<&CacheEntry> {
        self.entries.get(id)
    }

    /// Like [`lookup`](Self::lookup), but tells a cache that was never
    /// populated apart from an id missing from the current snapshot.
    pub fn try_lookup(&self, id: &str) -> Result<&CacheEntry, CacheMiss> {
        if self.loaded_at.is_none() {
            return Err(CacheMiss::NotLoaded { id: id.to_string() });
        }
        self.entries
            .get(id)
            .ok_or_else(|| CacheMiss::NotFound { id: id.to_string() })
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded_at.is_some()
    }

    pub fn loaded_at(&self) -> Option<Instant> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Snapshot entries ordered by id.
    pub fn entries(&self) -> Vec<&CacheEntry> {
        let mut out: Vec<&CacheEntry> = self.entries.values().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}
