use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::nav::NavEntry;

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub timeout: Option<u64>,
    pub header: Option<String>,
    pub resources: Option<BTreeMap<String, ResourceConfig>>,
    pub session: Option<SessionConfig>,
    pub nav: Option<Vec<NavEntry>>,
    #[serde(alias = "landing_roles")]
    pub dedicated_landing_roles: Option<Vec<String>>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ResourceConfig {
    /// Path relative to `base_url`, or an absolute URL.
    pub endpoint: Option<String>,
    /// Saved response to read instead of calling the endpoint.
    pub file: Option<String>,
    pub id_field: Option<String>,
    pub list_key: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub authenticated: Option<bool>,
    pub name: Option<String>,
    pub role: Option<String>,
    #[serde(alias = "is_super_admin")]
    pub super_admin: Option<bool>,
    pub capabilities: Option<Vec<String>>,
    pub login_path: Option<String>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".adminview").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).to_string_lossy().to_string()
}

pub fn parse_config(contents: &str) -> Result<ConfigFile, String> {
    serde_yaml::from_str::<ConfigFile>(contents).map_err(|e| e.to_string())
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

fn default_config_yaml() -> String {
    r#"# adminview config
#
# Location (default):
#   ~/.adminview/config.yml

# Backend
base_url: http://localhost:3000/api/
# token: ""
timeout: 10
# header: "X-Branch: north"

# Resources loaded in bulk. Each gets its own page-scoped cache.
resources:
  users:
    endpoint: admin/users
    id_field: id
    list_key: data
  autopay:
    endpoint: admin/autopay
    id_field: user_id
    list_key: users
    # file: ./saved/autopay.json

# Signed-in identity (normally supplied by the login flow)
session:
  authenticated: true
  name: Operator
  role: manager
  super_admin: false
  capabilities:
    - users.view
    - autopay.view
  login_path: /login.html

# Roles that have their own landing page and never see dashboard entries
dedicated_landing_roles:
  - collector

# Navigation table. Entries without a capability are never listed.
nav:
  - id: dashboard
    label: Dashboard
    flags: [dashboard_entry]
    target: /dashboard.html
  - id: users
    label: Users
    capability: users.view
    target: /users.html
  - id: autopay
    label: Autopay
    capability: autopay.view
    target: /autopay.html
  - id: admins
    label: Administrators
    capability: admins.manage
    flags: [super_admin_only]
    target: /admins.html

# Output
# output: ./report.json
# output_format: text
no_color: false
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &PathBuf) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    let contents = default_config_yaml();
    std::fs::write(path, contents)
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(())
}
