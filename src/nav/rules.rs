use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::session::CurrentUser;

/// Exclusion predicates attached to a navigation entry. They are checked
/// before, and independently of, the capability grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityFlag {
    #[serde(alias = "superAdminOnly")]
    SuperAdminOnly,
    #[serde(alias = "isDashboardEntry", alias = "dashboard")]
    DashboardEntry,
    Hidden,
}

#[derive(Clone, Debug, Default)]
pub struct NavRules {
    /// Roles that land on their own page and therefore never see the
    /// generic dashboard entries.
    pub dedicated_landing_roles: HashSet<String>,
}

impl NavRules {
    pub fn new<I, S>(dedicated_landing_roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dedicated_landing_roles: dedicated_landing_roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn excludes(&self, flag: VisibilityFlag, user: Option<&CurrentUser>) -> bool {
        match flag {
            VisibilityFlag::Hidden => true,
            VisibilityFlag::SuperAdminOnly => !user.map(|u| u.is_super_admin).unwrap_or(false),
            VisibilityFlag::DashboardEntry => user
                .map(|u| self.dedicated_landing_roles.contains(&u.role))
                .unwrap_or(false),
        }
    }
}
