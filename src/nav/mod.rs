//! Declarative navigation table filtered by the session's capabilities.

mod rules;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::Session;

pub use rules::{NavRules, VisibilityFlag};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavEntry {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(
        default,
        alias = "requiredCapability",
        alias = "capability",
        skip_serializing_if = "Option::is_none"
    )]
    pub required_capability: Option<String>,
    #[serde(
        default,
        alias = "visibilityFlags",
        alias = "flags",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub visibility_flags: Vec<VisibilityFlag>,
    #[serde(default)]
    pub target: Option<String>,
}

impl NavEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            required_capability: None,
            visibility_flags: Vec::new(),
            target: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.required_capability = Some(capability.into());
        self
    }

    pub fn with_flag(mut self, flag: VisibilityFlag) -> Self {
        self.visibility_flags.push(flag);
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavError {
    #[error("navigation entry '{id}' has no target")]
    MissingTarget { id: String },

    #[error("navigation entry id '{id}' is defined more than once")]
    DuplicateId { id: String },

    #[error("navigation entry #{index} has an empty id")]
    EmptyId { index: usize },

    #[error("unknown navigation entry '{id}'")]
    UnknownEntry { id: String },
}

/// Filters `all` down to the entries `session` may see, keeping input order.
///
/// Flags are checked first, then entries without a capability are dropped,
/// then the capability grant decides. Assumes the page guard already turned
/// unauthenticated sessions away.
pub fn compute_visible_entries<'a, S>(
    all: &'a [NavEntry],
    session: &S,
    rules: &NavRules,
) -> Vec<&'a NavEntry>
where
    S: Session + ?Sized,
{
    let user = session.current_user();
    all.iter()
        .filter(|entry| {
            !entry
                .visibility_flags
                .iter()
                .any(|flag| rules.excludes(*flag, user))
        })
        .filter(|entry| match entry.required_capability.as_deref() {
            Some(capability) => session.has_capability(capability),
            None => false,
        })
        .collect()
}

pub fn resolve(entry: &NavEntry) -> Result<&str, NavError> {
    entry
        .target
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| NavError::MissingTarget {
            id: entry.id.clone(),
        })
}

/// Validated navigation table plus the rules it is evaluated under.
#[derive(Clone, Debug, Default)]
pub struct Navigator {
    entries: Vec<NavEntry>,
    rules: NavRules,
}

impl Navigator {
    pub fn new(entries: Vec<NavEntry>, rules: NavRules) -> Result<Self, NavError> {
        let mut seen = HashSet::new();
        for (index, entry) in entries.iter().enumerate() {
            if entry.id.trim().is_empty() {
                return Err(NavError::EmptyId { index });
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(NavError::DuplicateId {
                    id: entry.id.clone(),
                });
            }
        }
        Ok(Self { entries, rules })
    }

    pub fn entries(&self) -> &[NavEntry] {
        &self.entries
    }

    pub fn visible_entries<S: Session + ?Sized>(&self, session: &S) -> Vec<&NavEntry> {
        compute_visible_entries(&self.entries, session, &self.rules)
    }

    pub fn find(&self, id: &str) -> Option<&NavEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn resolve_id(&self, id: &str) -> Result<&str, NavError> {
        let entry = self
            .find(id)
            .ok_or_else(|| NavError::UnknownEntry { id: id.to_string() })?;
        resolve(entry)
    }

    /// Target of the first entry the session can see.
    pub fn landing_target<S: Session + ?Sized>(&self, session: &S) -> Option<&str> {
        self.visible_entries(session)
            .into_iter()
            .find_map(|entry| resolve(entry).ok())
    }
}
