use colored::Colorize;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::cache::{CacheEntry, EntityCache};
use crate::nav::NavEntry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct NavRecord {
    pub id: String,
    pub label: String,
    pub target: Option<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct RowRecord {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ListRecord {
    pub resource: String,
    pub loaded: bool,
    pub rows: Vec<RowRecord>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DetailRecord {
    pub resource: String,
    pub id: String,
    pub name: String,
    pub payload: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Report {
    pub user: Option<String>,
    pub landing: Option<String>,
    pub open: Option<String>,
    pub load_ms: Option<u128>,
    pub nav: Option<Vec<NavRecord>>,
    pub lists: Vec<ListRecord>,
    pub details: Vec<DetailRecord>,
    pub notices: Vec<String>,
}

pub fn nav_records(entries: &[&NavEntry]) -> Vec<NavRecord> {
    entries
        .iter()
        .map(|e| NavRecord {
            id: e.id.clone(),
            label: e.display_label().to_string(),
            target: e.target.clone(),
        })
        .collect()
}

pub fn list_record(resource: &str, cache: &EntityCache) -> ListRecord {
    ListRecord {
        resource: resource.to_string(),
        loaded: cache.is_loaded(),
        rows: cache
            .entries()
            .into_iter()
            .map(|e| RowRecord {
                id: e.id.clone(),
                name: e.display_name(),
            })
            .collect(),
    }
}

pub fn detail_record(resource: &str, entry: &CacheEntry) -> DetailRecord {
    DetailRecord {
        resource: resource.to_string(),
        id: entry.id.clone(),
        name: entry.display_name(),
        payload: entry.payload.clone(),
    }
}

fn format_kv_line(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!(":: {:<10}: {}\n", label, value));
}

pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    if let Some(user) = report.user.as_deref() {
        format_kv_line(&mut out, "User", user);
    }
    if let Some(landing) = report.landing.as_deref() {
        format_kv_line(&mut out, "Landing", landing);
    }
    if let Some(open) = report.open.as_deref() {
        format_kv_line(&mut out, "Open", open);
    }
    if let Some(ms) = report.load_ms {
        format_kv_line(&mut out, "Load time", &format!("{ms}ms"));
    }

    if let Some(nav) = report.nav.as_ref() {
        out.push('\n');
        out.push_str(&format!("{}\n", "Navigation".bold()));
        if nav.is_empty() {
            out.push_str("  no modules assigned\n");
        }
        for n in nav {
            out.push_str(&format!(
                "  {:<16} {:<24} {}\n",
                n.id.cyan(),
                n.label,
                n.target.as_deref().unwrap_or("-").dimmed()
            ));
        }
    }

    for list in report.lists.iter() {
        out.push('\n');
        out.push_str(&format!(
            "{} ({} records)\n",
            list.resource.bold(),
            list.rows.len()
        ));
        if !list.loaded {
            out.push_str("  not loaded\n");
        } else if list.rows.is_empty() {
            out.push_str("  no records\n");
        }
        for row in list.rows.iter() {
            out.push_str(&format!("  {:<16} {}\n", row.id.cyan(), row.name));
        }
    }

    for detail in report.details.iter() {
        out.push('\n');
        out.push_str(&format!(
            "{}/{} ({})\n",
            detail.resource.bold(),
            detail.id.cyan(),
            detail.name
        ));
        for (key, value) in crate::utils::flatten_payload(&detail.payload) {
            out.push_str(&format!("  {:<28} {}\n", format!("{key}:"), value));
        }
    }

    if !report.notices.is_empty() {
        out.push('\n');
    }
    for notice in report.notices.iter() {
        out.push_str(&format!("{} {}\n", "[!]".yellow().bold(), notice));
    }
    out
}

pub fn render_json(report: &Report) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = serde_json::to_vec_pretty(report)?;
    out.push(b'\n');
    Ok(out)
}

pub fn render(report: &Report, format: OutputFormat) -> Result<Vec<u8>, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(render_text(report).into_bytes()),
        OutputFormat::Json => render_json(report),
    }
}
