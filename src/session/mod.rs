use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Identity collaborator consulted by the page guard and the navigator.
pub trait Session {
    fn is_authenticated(&self) -> bool;

    fn current_user(&self) -> Option<&CurrentUser>;

    fn has_capability(&self, token: &str) -> bool;

    /// Where an unauthenticated visitor gets sent.
    fn unauthorized_redirect(&self) -> &str;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub is_super_admin: bool,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("not signed in, redirecting to {redirect}")]
    Unauthenticated { redirect: String },
}

/// Session backed by a fixed user record.
#[derive(Clone, Debug)]
pub struct StaticSession {
    user: Option<CurrentUser>,
    login_path: String,
}

impl StaticSession {
    pub fn anonymous(login_path: impl Into<String>) -> Self {
        Self {
            user: None,
            login_path: login_path.into(),
        }
    }

    pub fn authenticated(user: CurrentUser, login_path: impl Into<String>) -> Self {
        Self {
            user: Some(user),
            login_path: login_path.into(),
        }
    }
}

impl Session for StaticSession {
    fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    fn current_user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    // Super admins hold every capability token.
    fn has_capability(&self, token: &str) -> bool {
        match self.user.as_ref() {
            Some(user) => user.is_super_admin || user.capabilities.contains(token),
            None => false,
        }
    }

    fn unauthorized_redirect(&self) -> &str {
        &self.login_path
    }
}

/// Page guard: yields the signed-in user or the redirect to take instead.
pub fn require_authenticated<S: Session + ?Sized>(
    session: &S,
) -> Result<&CurrentUser, SessionError> {
    match session.current_user() {
        Some(user) if session.is_authenticated() => Ok(user),
        _ => Err(SessionError::Unauthenticated {
            redirect: session.unauthorized_redirect().to_string(),
        }),
    }
}
