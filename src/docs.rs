/// Document and version-history content for the popup tabs
///
/// Markdown is turned into HTML at build time; `docs/bundle.json` holds the
/// result as `{ metadata, content }` items.
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;

const BUNDLE_JSON: &str = include_str!("../docs/bundle.json");

static DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("valid date prefix pattern"));

/// Classes added to the opening tags of document bodies
pub const DOCUMENT_CLASS_MAP: [(&str, &str); 10] = [
    ("h1", "md-h1 fs-5"),
    ("h2", "md-h2 fs-6"),
    ("h3", "md-h3 fs-6"),
    ("h4", "md-h4 fs-6"),
    ("h5", "md-h5 fs-6"),
    ("h6", "md-h6 fs-6"),
    ("p", "md-p"),
    ("ul", "md-ul"),
    ("ol", "md-ol"),
    ("li", "md-li"),
];

/// Release notes are rendered smaller than documents
pub const VERSION_CLASS_MAP: [(&str, &str); 10] = [
    ("h1", "fs-6 mb-2"),
    ("h2", "fs-6 mb-2"),
    ("h3", "fs-6 mb-2"),
    ("h4", "fs-6 mb-2"),
    ("h5", "fs-6 mb-2"),
    ("h6", "fs-6 mb-2"),
    ("p", "small mb-2"),
    ("ul", "small mb-2 ps-3"),
    ("ol", "small mb-2 ps-3"),
    ("li", "mb-1"),
];

/// Front matter of one Markdown file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DocMetadata {
    pub id: String,
    pub title: String,
    pub order: i64,
    pub visible: bool,
    pub expanded: bool,
    pub date: String,
    pub lang: String,
}

impl Default for DocMetadata {
    fn default() -> Self {
        DocMetadata {
            id: String::new(),
            title: "Untitled".to_string(),
            order: 0,
            visible: true,
            expanded: true,
            date: String::new(),
            lang: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DocItem {
    #[serde(default)]
    pub metadata: DocMetadata,
    /// Sanitized HTML
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DocBundle {
    #[serde(default)]
    pub documents: Vec<DocItem>,
    #[serde(default)]
    pub versions: Vec<DocItem>,
}

impl DocBundle {
    pub fn parse(json: &str) -> Result<DocBundle, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The bundle compiled into the extension; empty if it can't be read.
    pub fn embedded() -> DocBundle {
        DocBundle::parse(BUNDLE_JSON).unwrap_or_else(|e| {
            log::error!("Failed to parse document bundle: {}", e);
            DocBundle::default()
        })
    }
}

/// Visible documents, lowest `order` first
pub fn visible_documents(items: &[DocItem]) -> Vec<DocItem> {
    let mut docs: Vec<DocItem> = items.iter().filter(|d| d.metadata.visible).cloned().collect();
    docs.sort_by_key(|d| d.metadata.order);
    docs
}

/// Visible release notes, newest (highest `order`) first
pub fn visible_versions(items: &[DocItem]) -> Vec<DocItem> {
    let mut versions: Vec<DocItem> = items.iter().filter(|d| d.metadata.visible).cloned().collect();
    versions.sort_by(|a, b| b.metadata.order.cmp(&a.metadata.order));
    versions
}

/// Add a class attribute to every bare opening tag named in `class_map`.
pub fn apply_class_map(html: &str, class_map: &[(&str, &str)]) -> String {
    class_map
        .iter()
        .fold(html.to_string(), |result, (tag, class_name)| {
            result.replace(&format!("<{}>", tag), &format!("<{} class=\"{}\">", tag, class_name))
        })
}

/// Normalize a front-matter date to `YYYY-MM-DD`.
///
/// A leading date is taken as-is; otherwise an RFC 2822 date is converted to
/// its UTC day. Anything else is shown raw.
pub fn format_release_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    if let Some(prefix) = DATE_PREFIX.find(raw) {
        return prefix.as_str().to_string();
    }

    match DateTime::parse_from_rfc2822(raw) {
        Ok(date) => date.with_timezone(&Utc).format("%Y-%m-%d").to_string(),
        Err(_) => raw.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBadge {
    /// The version this browser is running
    Current,
    Latest,
}

impl VersionBadge {
    pub fn label(&self) -> &'static str {
        match self {
            VersionBadge::Current => "In use",
            VersionBadge::Latest => "Latest",
        }
    }

    pub fn class(&self) -> &'static str {
        match self {
            VersionBadge::Current => "badge bg-success",
            VersionBadge::Latest => "badge bg-primary",
        }
    }
}

pub fn version_badge(version: &str, current_version: &str, is_first: bool) -> Option<VersionBadge> {
    if version == current_version {
        Some(VersionBadge::Current)
    } else if is_first {
        Some(VersionBadge::Latest)
    } else {
        None
    }
}

/// Version string of a release note: its id, falling back to the title
pub fn version_of(metadata: &DocMetadata) -> &str {
    if metadata.id.is_empty() {
        &metadata.title
    } else {
        &metadata.id
    }
}
