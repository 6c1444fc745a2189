/// Extension details shown on the Info tab
use serde::Deserialize;
use url::Url;

const METADATA_JSON: &str = include_str!("../manifest.meta.json");

/// Publisher details that aren't part of the browser manifest
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ExtensionMetadata {
    #[serde(default)]
    pub issues_url: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub developer: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
}

impl ExtensionMetadata {
    pub fn parse(json: &str) -> Result<ExtensionMetadata, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn embedded() -> ExtensionMetadata {
        ExtensionMetadata::parse(METADATA_JSON).unwrap_or_else(|e| {
            log::error!("Failed to parse manifest metadata: {}", e);
            ExtensionMetadata::default()
        })
    }

    /// Issue tracker link, if it's a usable web URL
    pub fn issues_link(&self) -> Option<String> {
        web_link(self.issues_url.as_deref())
    }

    pub fn github_link(&self) -> Option<String> {
        web_link(self.github_url.as_deref())
    }

    pub fn publisher_name(&self) -> &str {
        non_empty(self.publisher.as_deref()).unwrap_or(UNKNOWN)
    }

    pub fn developer_name(&self) -> &str {
        non_empty(self.developer.as_deref()).unwrap_or(UNKNOWN)
    }

    pub fn language_names(&self) -> String {
        self.languages
            .iter()
            .map(|code| language_name(code))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

const UNKNOWN: &str = "Unknown";

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Only http(s) links are rendered as anchors.
pub fn web_link(raw: Option<&str>) -> Option<String> {
    let url = Url::parse(non_empty(raw)?).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url.to_string()),
        _ => None,
    }
}

pub fn language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "ja" => "Japanese",
        other => other,
    }
}

/// Which sites the extension may run on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteAccess {
    AllSites,
    Origins(Vec<String>),
    OnClick,
}

impl SiteAccess {
    pub fn from_origins(origins: Option<&[String]>) -> SiteAccess {
        match origins {
            Some(origins) if origins.iter().any(|o| o == "<all_urls>") => SiteAccess::AllSites,
            Some(origins) if !origins.is_empty() => SiteAccess::Origins(origins.to_vec()),
            _ => SiteAccess::OnClick,
        }
    }

    /// One line per origin
    pub fn lines(&self) -> Vec<String> {
        match self {
            SiteAccess::AllSites => vec!["All sites".to_string()],
            SiteAccess::Origins(origins) => origins.clone(),
            SiteAccess::OnClick => vec!["Only when clicked".to_string()],
        }
    }
}

pub fn store_url(extension_id: &str) -> String {
    format!("https://chrome.google.com/webstore/detail/{}", extension_id)
}

pub fn extensions_page_url(extension_id: &str) -> String {
    format!("chrome://extensions/?id={}", extension_id)
}
