use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use thiserror::Error;
use tokio::time::Instant;
use tracing::warn;

use crate::cache::{CacheEntry, CacheMiss, EntityCache};
use crate::config;
use crate::fetch::{self, FetchError, FileListSource, HttpListSource, ListSource, DEFAULT_LIST_KEY};
use crate::nav::{NavEntry, NavError, NavRules, Navigator};
use crate::session::{self, Session, SessionError};

pub const DEFAULT_ID_FIELD: &str = "id";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceSource {
    /// Relative to `Options::base_url`, or an absolute URL.
    Endpoint(String),
    File(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceSpec {
    pub name: String,
    pub source: ResourceSource,
    pub id_field: String,
    pub list_key: String,
}

impl ResourceSpec {
    pub fn endpoint(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: ResourceSource::Endpoint(endpoint.into()),
            id_field: DEFAULT_ID_FIELD.to_string(),
            list_key: DEFAULT_LIST_KEY.to_string(),
        }
    }

    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: ResourceSource::File(path.into()),
            id_field: DEFAULT_ID_FIELD.to_string(),
            list_key: DEFAULT_LIST_KEY.to_string(),
        }
    }

    pub fn id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    pub fn list_key(mut self, list_key: impl Into<String>) -> Self {
        self.list_key = list_key.into();
        self
    }
}

#[derive(Clone, Debug)]
pub struct Options {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub header: Option<String>,
    pub timeout_seconds: u64,
    pub resources: Vec<ResourceSpec>,
    pub nav: Vec<NavEntry>,
    pub dedicated_landing_roles: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            header: None,
            timeout_seconds: 10,
            resources: Vec::new(),
            nav: Vec::new(),
            dedicated_landing_roles: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("resource '{name}' is defined more than once")]
    DuplicateResource { name: String },

    #[error("unknown resource '{name}'")]
    UnknownResource { name: String },

    #[error("resource '{name}' is invalid: {reason}")]
    InvalidResource { name: String, reason: String },

    #[error("resource '{resource}' uses a relative endpoint but no base_url is set")]
    MissingBaseUrl { resource: String },

    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error(transparent)]
    Nav(#[from] NavError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Miss(#[from] CacheMiss),

    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug)]
pub struct ResourceFailure {
    pub resource: String,
    pub error: FetchError,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: BTreeMap<String, usize>,
    pub failures: Vec<ResourceFailure>,
    pub elapsed: Duration,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

struct Resource {
    name: String,
    id_field: String,
    source: Box<dyn ListSource>,
    cache: EntityCache,
}

/// One admin "page": a cache per resource plus the navigation table.
pub struct Runner {
    navigator: Navigator,
    resources: Vec<Resource>,
}

impl Runner {
    pub fn new(options: Options) -> Result<Self, RunnerError> {
        let navigator = Navigator::new(
            options.nav,
            NavRules::new(options.dedicated_landing_roles),
        )?;

        let needs_client = options
            .resources
            .iter()
            .any(|r| matches!(r.source, ResourceSource::Endpoint(_)));
        let client = if needs_client {
            Some(fetch::build_client(
                options.header.as_deref(),
                options.timeout_seconds,
            )?)
        } else {
            None
        };

        let mut runner = Self {
            navigator,
            resources: Vec::new(),
        };
        let mut seen = HashSet::new();
        for spec in options.resources {
            if !seen.insert(spec.name.clone()) {
                return Err(RunnerError::DuplicateResource { name: spec.name });
            }
            if spec.name.trim().is_empty() || spec.id_field.trim().is_empty() {
                return Err(RunnerError::InvalidResource {
                    name: spec.name,
                    reason: "name and id_field must be non-empty".to_string(),
                });
            }
            let source: Box<dyn ListSource> = match (&spec.source, client.as_ref()) {
                (ResourceSource::Endpoint(endpoint), Some(client)) => {
                    let url = resolve_endpoint(options.base_url.as_deref(), endpoint, &spec.name)?;
                    Box::new(
                        HttpListSource::with_client(client.clone(), url, spec.list_key.clone())
                            .bearer(options.token.clone()),
                    )
                }
                (ResourceSource::File(path), _) => Box::new(
                    FileListSource::new(config::expand_tilde_string(path))
                        .list_key(spec.list_key.clone()),
                ),
                (ResourceSource::Endpoint(_), None) => {
                    return Err(RunnerError::InvalidResource {
                        name: spec.name,
                        reason: "no HTTP client available".to_string(),
                    })
                }
            };
            runner.resources.push(Resource {
                name: spec.name,
                id_field: spec.id_field,
                source,
                cache: EntityCache::new(),
            });
        }
        Ok(runner)
    }

    /// Registers a resource backed by a caller-supplied list source.
    pub fn add_source(
        &mut self,
        name: impl Into<String>,
        id_field: impl Into<String>,
        source: Box<dyn ListSource>,
    ) -> Result<(), RunnerError> {
        let name = name.into();
        if self.resources.iter().any(|r| r.name == name) {
            return Err(RunnerError::DuplicateResource { name });
        }
        self.resources.push(Resource {
            name,
            id_field: id_field.into(),
            source,
            cache: EntityCache::new(),
        });
        Ok(())
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn resource_names(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.name.as_str()).collect()
    }

    /// Loads every resource. A failed resource keeps its previous snapshot and
    /// never affects the others.
    pub async fn load<S: Session + ?Sized>(
        &mut self,
        session: &S,
    ) -> Result<LoadReport, RunnerError> {
        session::require_authenticated(session)?;
        let started_at = Instant::now();

        // Each future owns a disjoint `&mut Resource`.
        let mut pending: FuturesUnordered<_> = self
            .resources
            .iter_mut()
            .map(|resource| async move {
                let result = fetch::load_into(
                    resource.source.as_ref(),
                    &mut resource.cache,
                    &resource.id_field,
                )
                .await;
                (resource.name.clone(), result)
            })
            .collect();

        let mut report = LoadReport::default();
        while let Some((name, result)) = pending.next().await {
            match result {
                Ok(count) => {
                    report.loaded.insert(name, count);
                }
                Err(error) => report.failures.push(ResourceFailure {
                    resource: name,
                    error,
                }),
            }
        }
        drop(pending);
        report.failures.sort_by(|a, b| a.resource.cmp(&b.resource));
        report.elapsed = started_at.elapsed();
        Ok(report)
    }

    pub async fn reload<S: Session + ?Sized>(
        &mut self,
        name: &str,
        session: &S,
    ) -> Result<usize, RunnerError> {
        session::require_authenticated(session)?;
        let resource = self
            .resources
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| RunnerError::UnknownResource {
                name: name.to_string(),
            })?;
        let count = fetch::load_into(
            resource.source.as_ref(),
            &mut resource.cache,
            &resource.id_field,
        )
        .await?;
        Ok(count)
    }

    pub fn cache(&self, name: &str) -> Option<&EntityCache> {
        self.resources
            .iter()
            .find(|r| r.name == name)
            .map(|r| &r.cache)
    }

    /// Detail lookup served from the loaded snapshot only.
    pub fn show(&self, resource: &str, id: &str) -> Result<&CacheEntry, RunnerError> {
        let cache = self
            .cache(resource)
            .ok_or_else(|| RunnerError::UnknownResource {
                name: resource.to_string(),
            })?;
        cache.try_lookup(id).map_err(|miss| {
            warn!(resource, id, "cache miss: {miss}");
            RunnerError::Miss(miss)
        })
    }

    pub fn visible_nav<S: Session + ?Sized>(&self, session: &S) -> Vec<&NavEntry> {
        self.navigator.visible_entries(session)
    }

    pub fn resolve(&self, nav_id: &str) -> Result<&str, RunnerError> {
        Ok(self.navigator.resolve_id(nav_id)?)
    }
}

fn resolve_endpoint(
    base_url: Option<&str>,
    endpoint: &str,
    resource: &str,
) -> Result<String, RunnerError> {
    if let Ok(url) = reqwest::Url::parse(endpoint.trim()) {
        return match url.scheme() {
            "http" | "https" => Ok(url.to_string()),
            _ => Err(RunnerError::InvalidUrl {
                url: endpoint.to_string(),
            }),
        };
    }
    let base = base_url
        .filter(|b| !b.trim().is_empty())
        .ok_or_else(|| RunnerError::MissingBaseUrl {
            resource: resource.to_string(),
        })?;
    let mut base = base.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let base =
        reqwest::Url::parse(&base).map_err(|_| RunnerError::InvalidUrl { url: base.clone() })?;
    base.join(endpoint.trim().trim_start_matches('/'))
        .map(|u| u.to_string())
        .map_err(|_| RunnerError::InvalidUrl {
            url: format!("{base}{endpoint}"),
        })
}
